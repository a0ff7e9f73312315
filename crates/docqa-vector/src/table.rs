//! LanceDB connection and store-location helpers.
//!
//! Each embedding model gets its own database directory under the dense root,
//! so switching models never reads vectors of the wrong space.

use anyhow::Result;
use lancedb::{connect, Connection};
use std::path::{Path, PathBuf};

/// `<root>/<model id with path-hostile characters replaced>`.
pub fn store_dir(root: &Path, model_id: &str) -> PathBuf {
	let key: String = model_id
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
		.collect();
	root.join(key)
}

pub async fn open_db(dir: &Path) -> Result<Connection> {
	Ok(connect(dir.to_string_lossy().as_ref()).execute().await?)
}

pub async fn has_table(conn: &Connection, name: &str) -> Result<bool> {
	let names = conn.table_names().execute().await?;
	Ok(names.iter().any(|n| n == name))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn model_ids_map_to_distinct_safe_dirs() {
		let root = Path::new("/data/lancedb");
		assert_eq!(
			store_dir(root, "sentence-transformers/all-MiniLM-L6-v2"),
			Path::new("/data/lancedb/sentence-transformers_all-MiniLM-L6-v2")
		);
		assert_ne!(store_dir(root, "a/b"), store_dir(root, "a/c"));
	}
}
