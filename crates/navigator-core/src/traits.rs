use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::Operation;

/// Future resolving to the backend payload of an accepted request.
pub type PendingResult = BoxFuture<'static, Result<serde_json::Value>>;

/// Execution gateway — sends serialized operation chains to the query service.
pub trait ExecutionGateway: Send + Sync + 'static {
    /// Submit a serialized chain.
    ///
    /// An `Err` here is a rejection detectable before anything goes over the
    /// wire. An accepted request yields a future that settles at most once.
    fn submit(&self, body: String) -> Result<PendingResult>;
}

/// Operation factory — manufactures the default post-processing operations.
pub trait OperationFactory: Send + Sync + 'static {
    /// Bounds the size of the result set.
    fn create_limit_operation(&self) -> Result<Operation>;

    /// Removes duplicate elements from the result.
    fn create_deduplicate_operation(&self) -> Result<Operation>;
}

/// Results sink — accumulates payloads from successful executions.
pub trait ResultsSink: Send + Sync + 'static {
    /// Discard everything accumulated so far.
    fn clear(&self);

    /// Merge a newly arrived payload.
    fn update(&self, payload: serde_json::Value);
}

/// Seed sink — the graph model's entry point for starting vertices.
pub trait SeedSink: Send + Sync + 'static {
    fn add_seed(&self, vertex_type: &str, serialized_vertex: String);
}
