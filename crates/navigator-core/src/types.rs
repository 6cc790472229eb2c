use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator the backend uses to recognise an operation chain.
pub const OPERATION_CHAIN_CLASS: &str = "uk.gov.gchq.gaffer.operation.OperationChain";

/// Unique identifier for one execute-all batch.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BatchId(pub String);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed starting vertex handed to the graph model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub vertex_type: String,
    pub vertex: serde_json::Value,
}

impl Seed {
    pub fn new(vertex_type: impl Into<String>, vertex: serde_json::Value) -> Self {
        Self {
            vertex_type: vertex_type.into(),
            vertex,
        }
    }
}

/// One unit of backend graph work. Opaque: only composed, never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operation(pub serde_json::Value);

impl Operation {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The backend class name, if the operation carries one.
    pub fn class(&self) -> Option<&str> {
        self.0.get("class").and_then(|c| c.as_str())
    }
}

impl From<serde_json::Value> for Operation {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// An ordered sequence of operations submitted as one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationChain {
    class: String,
    operations: Vec<Operation>,
}

impl OperationChain {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            class: OPERATION_CHAIN_CLASS.to_string(),
            operations,
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Serialize to the wire format expected by the query service.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Which attempt produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempt {
    /// Chain with the default limit and deduplicate operations.
    Primary,
    /// Chain carrying only the user's operation.
    Fallback,
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attempt::Primary => write!(f, "primary"),
            Attempt::Fallback => write!(f, "fallback"),
        }
    }
}

/// Settled result of one queued operation within a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The backend answered; the payload was forwarded to the results sink.
    Success {
        index: usize,
        attempt: Attempt,
        payload: serde_json::Value,
    },
    /// Both the primary and the fallback submission were rejected up front.
    Dropped { index: usize, reason: String },
    /// The request was accepted but the service failed to answer.
    Failed {
        index: usize,
        attempt: Attempt,
        reason: String,
    },
}

impl OperationOutcome {
    /// Position of the operation in the drained queue snapshot.
    pub fn index(&self) -> usize {
        match self {
            OperationOutcome::Success { index, .. }
            | OperationOutcome::Dropped { index, .. }
            | OperationOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success { .. })
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, OperationOutcome::Dropped { .. })
    }
}

/// Everything that happened to one execute-all batch, in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<OperationOutcome>,
}

impl BatchReport {
    pub fn empty(batch_id: BatchId) -> Self {
        let now = Utc::now();
        Self {
            batch_id,
            started_at: now,
            finished_at: now,
            outcomes: vec![],
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn dropped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_dropped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, OperationOutcome::Failed { .. }))
            .count()
    }
}

/// Events emitted while seeds are added and operations execute.
#[derive(Debug, Clone)]
pub enum NavigatorEvent {
    SeedAdded {
        vertex_type: String,
    },
    BatchStarted {
        batch_id: BatchId,
        operations: usize,
    },
    OperationFellBack {
        batch_id: BatchId,
        index: usize,
        reason: String,
    },
    OperationSucceeded {
        batch_id: BatchId,
        index: usize,
        attempt: Attempt,
    },
    OperationDropped {
        batch_id: BatchId,
        index: usize,
        reason: String,
    },
    OperationFailed {
        batch_id: BatchId,
        index: usize,
        reason: String,
    },
    BatchFinished {
        batch_id: BatchId,
        succeeded: usize,
        dropped: usize,
        failed: usize,
    },
}
