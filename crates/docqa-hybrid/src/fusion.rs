//! Reciprocal rank fusion.

use std::collections::HashMap;

use docqa_core::types::{Chunk, FusedScore, Ranked};

pub const DEFAULT_RRF_K: u32 = 60;

/// Merges ranked lists by summing `1 / (k + rank)` per list a chunk appears in.
///
/// Chunks are merged on structural equality of text and metadata. Output is
/// ordered by fused score, then by the best rank the chunk reached in any
/// list, then by first appearance.
#[derive(Debug, Clone, Copy)]
pub struct RankFuser {
    k: u32,
}

struct Entry<'a> {
    chunk: &'a Chunk,
    score: f64,
    best_rank: usize,
    last_list: usize,
}

impl Default for RankFuser {
    fn default() -> Self {
        Self::new(DEFAULT_RRF_K)
    }
}

impl RankFuser {
    pub fn new(k: u32) -> Self {
        Self { k }
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn fuse(&self, lists: &[&[Chunk]]) -> Vec<Ranked<FusedScore>> {
        let k = f64::from(self.k);
        let mut slots: HashMap<&Chunk, usize> = HashMap::new();
        let mut entries: Vec<Entry<'_>> = Vec::new();
        for (list_no, list) in lists.iter().enumerate() {
            for (pos, chunk) in list.iter().enumerate() {
                let rank = pos + 1;
                let contribution = 1.0 / (k + rank as f64);
                match slots.get(chunk) {
                    Some(&slot) => {
                        let entry = &mut entries[slot];
                        // a repeat inside the same list only counts once
                        if entry.last_list == list_no {
                            continue;
                        }
                        entry.score += contribution;
                        entry.best_rank = entry.best_rank.min(rank);
                        entry.last_list = list_no;
                    }
                    None => {
                        slots.insert(chunk, entries.len());
                        entries.push(Entry { chunk, score: contribution, best_rank: rank, last_list: list_no });
                    }
                }
            }
        }
        // Stable sort: equal score and best rank keep first-encounter order.
        entries.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.best_rank.cmp(&b.best_rank)));
        entries.into_iter().map(|e| Ranked::new(e.chunk.clone(), FusedScore(e.score))).collect()
    }
}
