use std::sync::{Mutex, PoisonError};

use navigator_core::types::Operation;

/// Ordered operations waiting for the next execute-all.
pub struct OperationQueue {
    operations: Mutex<Vec<Operation>>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self {
            operations: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, operation: Operation) {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(operation);
    }

    /// Take every queued operation, leaving the queue empty.
    pub fn drain(&self) -> Vec<Operation> {
        std::mem::take(&mut *self.operations.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copy of the queued operations, in order.
    pub fn snapshot(&self) -> Vec<Operation> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OperationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let queue = OperationQueue::new();
        queue.push(Operation::new(json!({"class": "a"})));
        queue.push(Operation::new(json!({"class": "b"})));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained[0].class(), Some("a"));
        assert_eq!(drained[1].class(), Some("b"));
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_snapshot_leaves_queue_intact() {
        let queue = OperationQueue::new();
        queue.push(Operation::new(json!({"class": "a"})));
        assert_eq!(queue.snapshot().len(), 1);
        assert_eq!(queue.len(), 1);
    }
}
