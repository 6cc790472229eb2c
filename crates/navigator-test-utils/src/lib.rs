//! Fakes for the collaborators around the execution coordinator.

use std::sync::{Mutex, PoisonError};

use serde_json::{json, Value};
use tokio::sync::oneshot;

use navigator_core::error::{NavigatorError, Result};
use navigator_core::traits::{ExecutionGateway, PendingResult, ResultsSink, SeedSink};
use navigator_core::types::Operation;

/// How the scripted gateway answers one submission.
pub enum Reply {
    /// Accept and resolve immediately with this payload.
    Payload(Value),
    /// Reject synchronously.
    Reject(String),
    /// Accept, then fail asynchronously.
    Fail(String),
    /// Accept and stay pending until [`ScriptedGateway::release`].
    Hold,
}

type Responder = Box<dyn Fn(usize, &Value) -> Reply + Send + Sync>;

/// Gateway whose answers are decided by a closure over (call index, parsed chain).
pub struct ScriptedGateway {
    responder: Responder,
    calls: Mutex<Vec<Value>>,
    held: Mutex<Vec<Option<oneshot::Sender<Value>>>>,
}

impl ScriptedGateway {
    pub fn new(responder: impl Fn(usize, &Value) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    /// Answers every chain with a one-element array naming its first operation.
    pub fn echo() -> Self {
        Self::new(|_, chain| Reply::Payload(json!([chain["operations"][0].clone()])))
    }

    /// Rejects any chain longer than one operation.
    pub fn rejecting_defaults() -> Self {
        Self::new(|_, chain| {
            if chain_len(chain) > 1 {
                Reply::Reject("default operations not supported".into())
            } else {
                Reply::Payload(json!([chain["operations"][0].clone()]))
            }
        })
    }

    /// Holds every request until released.
    pub fn holding() -> Self {
        Self::new(|_, _| Reply::Hold)
    }

    /// Every chain submitted so far, accepted or not.
    pub fn calls(&self) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of held requests submitted so far.
    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Resolve the `n`th held request. Returns false if there is none.
    pub fn release(&self, n: usize, payload: Value) -> bool {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        match held.get_mut(n).and_then(Option::take) {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }
}

impl ExecutionGateway for ScriptedGateway {
    fn submit(&self, body: String) -> Result<PendingResult> {
        let chain: Value = serde_json::from_str(&body)?;
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            calls.push(chain.clone());
            calls.len() - 1
        };

        match (self.responder)(index, &chain) {
            Reply::Payload(payload) => Ok(Box::pin(async move { Ok(payload) })),
            Reply::Reject(reason) => Err(NavigatorError::Rejected(reason)),
            Reply::Fail(reason) => {
                Ok(Box::pin(async move { Err(NavigatorError::GatewayRequest(reason)) }))
            }
            Reply::Hold => {
                let (tx, rx) = oneshot::channel();
                self.held
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Some(tx));
                Ok(Box::pin(async move {
                    rx.await
                        .map_err(|_| NavigatorError::GatewayRequest("request abandoned".into()))
                }))
            }
        }
    }
}

/// Number of operations in a parsed chain.
pub fn chain_len(chain: &Value) -> usize {
    chain["operations"].as_array().map_or(0, |ops| ops.len())
}

/// Class of the first operation in a parsed chain.
pub fn first_class(chain: &Value) -> Option<&str> {
    chain["operations"][0]["class"].as_str()
}

/// One call observed by [`RecordingResults`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Clear,
    Update(Value),
}

/// Results sink that records every call.
#[derive(Default)]
pub struct RecordingResults {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clears(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Clear))
            .count()
    }

    pub fn updates(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Update(v) => Some(v),
                SinkCall::Clear => None,
            })
            .collect()
    }
}

impl ResultsSink for RecordingResults {
    fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkCall::Clear);
    }

    fn update(&self, payload: Value) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkCall::Update(payload));
    }
}

/// Seed sink that records every seed handed to it.
#[derive(Default)]
pub struct RecordingSeeds {
    seeds: Mutex<Vec<(String, String)>>,
}

impl RecordingSeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeds(&self) -> Vec<(String, String)> {
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SeedSink for RecordingSeeds {
    fn add_seed(&self, vertex_type: &str, serialized_vertex: String) {
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((vertex_type.to_string(), serialized_vertex));
    }
}

/// A `GetElements` operation seeded with `vertex`.
pub fn get_elements(vertex: &str) -> Operation {
    Operation::new(json!({
        "class": "uk.gov.gchq.gaffer.operation.impl.get.GetElements",
        "input": [{
            "class": "uk.gov.gchq.gaffer.operation.data.EntitySeed",
            "vertex": vertex
        }]
    }))
}

/// Yield to the scheduler until `cond` holds. Panics after many rounds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
