use std::sync::{Mutex, PoisonError};

use navigator_core::traits::SeedSink;

/// A seed as held by the graph model: vertex type plus JSON-serialized vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSeed {
    pub vertex_type: String,
    pub vertex: String,
}

/// Minimal graph model holding the seeds a user has selected.
#[derive(Default)]
pub struct SeedGraph {
    seeds: Mutex<Vec<GraphSeed>>,
}

impl SeedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeds(&self) -> Vec<GraphSeed> {
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SeedSink for SeedGraph {
    fn add_seed(&self, vertex_type: &str, serialized_vertex: String) {
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(GraphSeed {
                vertex_type: vertex_type.to_string(),
                vertex: serialized_vertex,
            });
    }
}
