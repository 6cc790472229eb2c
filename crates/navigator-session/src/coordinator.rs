use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use navigator_core::config::LoadingPolicy;
use navigator_core::error::Result;
use navigator_core::event::EventBus;
use navigator_core::traits::{ExecutionGateway, PendingResult, ResultsSink};
use navigator_core::types::{
    Attempt, BatchId, BatchReport, NavigatorEvent, Operation, OperationOutcome,
};
use navigator_query::ChainBuilder;

use crate::loading::LoadingState;
use crate::queue::OperationQueue;

/// Turns queued operations into gateway requests and routes their results.
///
/// Every operation of a batch is submitted before any answer is awaited, so
/// requests run concurrently while result handling stays on one task.
pub struct ExecutionCoordinator {
    builder: ChainBuilder,
    gateway: Arc<dyn ExecutionGateway>,
    queue: Arc<OperationQueue>,
    results: Arc<dyn ResultsSink>,
    loading: LoadingState,
    policy: LoadingPolicy,
    event_bus: Arc<EventBus>,
}

impl ExecutionCoordinator {
    pub fn new(
        builder: ChainBuilder,
        gateway: Arc<dyn ExecutionGateway>,
        queue: Arc<OperationQueue>,
        results: Arc<dyn ResultsSink>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            builder,
            gateway,
            queue,
            results,
            loading: LoadingState::new(),
            policy: LoadingPolicy::default(),
            event_bus,
        }
    }

    /// Choose when a batch's loading flag is lowered.
    pub fn with_loading_policy(mut self, policy: LoadingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Handle to the shared loading flag.
    pub fn loading(&self) -> LoadingState {
        self.loading.clone()
    }

    pub fn queue(&self) -> &Arc<OperationQueue> {
        &self.queue
    }

    /// Run one operation immediately, with the default operations appended.
    ///
    /// Does not touch the loading flag. A rejected submission is returned to
    /// the caller as is; there is no fallback on this path.
    pub async fn dispatch_single(&self, operation: Operation) -> Result<serde_json::Value> {
        let pending = self.submit(&operation, true)?;
        match pending.await {
            Ok(payload) => {
                self.results.update(payload.clone());
                Ok(payload)
            }
            Err(e) => {
                warn!(error = %e, "Single operation failed");
                Err(e)
            }
        }
    }

    /// Drain the queue and execute every operation in it.
    pub async fn execute_all(&self) -> BatchReport {
        self.results.clear();

        let batch_id = BatchId::new();
        let snapshot = self.queue.drain();
        if snapshot.is_empty() {
            debug!("Execute all with an empty queue");
            return BatchReport::empty(batch_id);
        }

        let started_at = Utc::now();
        let batch = self.loading.begin_batch();
        info!(batch_id = %batch_id, operations = snapshot.len(), "Executing queued operations");
        self.event_bus.publish(NavigatorEvent::BatchStarted {
            batch_id: batch_id.clone(),
            operations: snapshot.len(),
        });

        let mut outcomes = Vec::with_capacity(snapshot.len());
        let mut in_flight = FuturesUnordered::new();
        for (index, operation) in snapshot.iter().enumerate() {
            match self.submit_with_fallback(&batch_id, index, operation) {
                Ok((attempt, pending)) => {
                    in_flight.push(self.settle(batch_id.clone(), index, attempt, pending));
                }
                Err(reason) => {
                    warn!(batch_id = %batch_id, index, reason = %reason, "Dropping operation");
                    self.event_bus.publish(NavigatorEvent::OperationDropped {
                        batch_id: batch_id.clone(),
                        index,
                        reason: reason.clone(),
                    });
                    outcomes.push(OperationOutcome::Dropped { index, reason });
                }
            }
        }

        while let Some(outcome) = in_flight.next().await {
            outcomes.push(outcome);
        }
        drop(batch);

        let report = BatchReport {
            batch_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            batch_id = %report.batch_id,
            succeeded = report.succeeded(),
            dropped = report.dropped(),
            failed = report.failed(),
            "Batch finished"
        );
        self.event_bus.publish(NavigatorEvent::BatchFinished {
            batch_id: report.batch_id.clone(),
            succeeded: report.succeeded(),
            dropped: report.dropped(),
            failed: report.failed(),
        });
        report
    }

    /// Run [`execute_all`](Self::execute_all) on its own task.
    pub fn spawn_execute_all(self: &Arc<Self>) -> JoinHandle<BatchReport> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.execute_all().await })
    }

    fn submit(&self, operation: &Operation, append_defaults: bool) -> Result<PendingResult> {
        let chain = self
            .builder
            .build_chain(std::slice::from_ref(operation), append_defaults)?;
        self.gateway.submit(chain.to_json()?)
    }

    /// Submit with the default operations, then once more without them if
    /// that is rejected. `Err` carries the reason the retry was rejected.
    fn submit_with_fallback(
        &self,
        batch_id: &BatchId,
        index: usize,
        operation: &Operation,
    ) -> std::result::Result<(Attempt, PendingResult), String> {
        let primary_err = match self.submit(operation, true) {
            Ok(pending) => return Ok((Attempt::Primary, pending)),
            Err(e) => e,
        };

        warn!(
            batch_id = %batch_id,
            index,
            error = %primary_err,
            "Submission with default operations rejected, retrying without"
        );
        self.event_bus.publish(NavigatorEvent::OperationFellBack {
            batch_id: batch_id.clone(),
            index,
            reason: primary_err.to_string(),
        });

        self.submit(operation, false)
            .map(|pending| (Attempt::Fallback, pending))
            .map_err(|e| e.to_string())
    }

    async fn settle(
        &self,
        batch_id: BatchId,
        index: usize,
        attempt: Attempt,
        pending: PendingResult,
    ) -> OperationOutcome {
        match pending.await {
            Ok(payload) => {
                self.results.update(payload.clone());
                if self.policy == LoadingPolicy::FirstCompletion {
                    self.loading.clear();
                }
                debug!(batch_id = %batch_id, index, attempt = %attempt, "Operation completed");
                self.event_bus.publish(NavigatorEvent::OperationSucceeded {
                    batch_id,
                    index,
                    attempt,
                });
                OperationOutcome::Success {
                    index,
                    attempt,
                    payload,
                }
            }
            Err(e) => {
                warn!(batch_id = %batch_id, index, attempt = %attempt, error = %e, "Operation failed");
                self.event_bus.publish(NavigatorEvent::OperationFailed {
                    batch_id,
                    index,
                    reason: e.to_string(),
                });
                OperationOutcome::Failed {
                    index,
                    attempt,
                    reason: e.to_string(),
                }
            }
        }
    }
}
