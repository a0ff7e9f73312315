use std::path::{Path, PathBuf};

use tokio::runtime::Runtime;
use tracing::debug;

use docqa_core::error::{Error, IndexKind, Result};
use docqa_core::traits::DenseIndex;
use docqa_core::types::{Chunk, DenseDistance, Ranked};

use crate::schema::TABLE_NAME;
use crate::table::{has_table, open_db, store_dir};
use crate::{search, writer};

/// Synchronous [`DenseIndex`] over a LanceDB store, one directory per
/// embedding model under `root`.
pub struct LanceDenseIndex {
    dir: PathBuf,
    dim: usize,
    rt: Runtime,
}

impl LanceDenseIndex {
    pub fn new(root: &Path, model_id: &str, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be positive".into()));
        }
        let rt = Runtime::new()?;
        Ok(Self { dir: store_dir(root, model_id), dim, rt })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn search_dir(&self, query_vec: &[f32], k: usize) -> Result<Vec<Ranked<DenseDistance>>> {
        if !self.dir.exists() {
            return Err(Error::not_initialized(IndexKind::Dense, &self.dir));
        }
        let db = open_db(&self.dir).await?;
        if !has_table(&db, TABLE_NAME).await? {
            return Err(Error::not_initialized(IndexKind::Dense, &self.dir));
        }
        Ok(search::search_table(&db, query_vec, k).await?)
    }
}

impl DenseIndex for LanceDenseIndex {
    fn rebuild(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::InvalidInput(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
        }
        self.rt.block_on(writer::rebuild_table(&self.dir, chunks, embeddings, self.dim))?;
        Ok(())
    }

    fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<Ranked<DenseDistance>>> {
        if query_vec.len() != self.dim {
            return Err(Error::InvalidInput(format!("query vector has dimension {}, index expects {}", query_vec.len(), self.dim)));
        }
        let hits = self.rt.block_on(self.search_dir(query_vec, k))?;
        debug!(k, returned = hits.len(), "dense search");
        Ok(hits)
    }
}
