use std::sync::Arc;

use tracing::{debug, info};

use navigator_core::config::AppConfig;
use navigator_core::error::Result;
use navigator_core::event::EventBus;
use navigator_core::traits::{ExecutionGateway, SeedSink};
use navigator_core::types::{BatchReport, NavigatorEvent, Operation, Seed};
use navigator_query::{ChainBuilder, GafferOperationFactory, HttpGateway};

use crate::coordinator::ExecutionCoordinator;
use crate::graph::SeedGraph;
use crate::loading::LoadingState;
use crate::queue::OperationQueue;
use crate::results::ResultsStore;

/// The navigation controller: seeds in, operations queued and executed,
/// results collected.
pub struct Navigator {
    coordinator: Arc<ExecutionCoordinator>,
    results: Arc<ResultsStore>,
    seeds: Arc<dyn SeedSink>,
    event_bus: Arc<EventBus>,
}

impl Navigator {
    /// Wire a navigator that talks to the configured REST endpoint.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let gateway = HttpGateway::new(&config.gateway)?;
        info!(url = %gateway.url(), "Using graph query service");
        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Wire a navigator around an arbitrary gateway, keeping seeds in a
    /// [`SeedGraph`].
    pub fn with_gateway(config: &AppConfig, gateway: Arc<dyn ExecutionGateway>) -> Self {
        Self::with_parts(config, gateway, Arc::new(SeedGraph::new()))
    }

    /// Wire a navigator around an arbitrary gateway and graph model.
    pub fn with_parts(
        config: &AppConfig,
        gateway: Arc<dyn ExecutionGateway>,
        seeds: Arc<dyn SeedSink>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::for_batch_size(
            config.execution.expected_batch_size,
        ));
        let results = Arc::new(ResultsStore::new());
        let factory = Arc::new(GafferOperationFactory::new(config.defaults.clone()));
        let coordinator = ExecutionCoordinator::new(
            ChainBuilder::new(factory),
            gateway,
            Arc::new(OperationQueue::new()),
            results.clone(),
            event_bus.clone(),
        )
        .with_loading_policy(config.execution.loading_policy);

        Self {
            coordinator: Arc::new(coordinator),
            results,
            seeds,
            event_bus,
        }
    }

    /// Hand seeds to the graph model, each vertex serialized to JSON text.
    pub fn add_seeds(&self, seeds: &[Seed]) -> Result<()> {
        for seed in seeds {
            let vertex = serde_json::to_string(&seed.vertex)?;
            debug!(vertex_type = %seed.vertex_type, vertex = %vertex, "Adding seed");
            self.seeds.add_seed(&seed.vertex_type, vertex);
            self.event_bus.publish(NavigatorEvent::SeedAdded {
                vertex_type: seed.vertex_type.clone(),
            });
        }
        Ok(())
    }

    /// Queue an operation for the next execute-all.
    pub fn add_operation(&self, operation: Operation) {
        self.coordinator.queue().push(operation);
    }

    /// A freshly built query is queued and also run straight away.
    pub async fn run_built_query(&self, operation: Operation) -> Result<serde_json::Value> {
        self.add_operation(operation.clone());
        self.coordinator.dispatch_single(operation).await
    }

    pub async fn execute_all(&self) -> BatchReport {
        self.coordinator.execute_all().await
    }

    pub fn coordinator(&self) -> &Arc<ExecutionCoordinator> {
        &self.coordinator
    }

    pub fn loading(&self) -> LoadingState {
        self.coordinator.loading()
    }

    pub fn results(&self) -> &Arc<ResultsStore> {
        &self.results
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigator_test_utils::{chain_len, get_elements, RecordingSeeds, ScriptedGateway};
    use serde_json::json;

    fn navigator(gateway: Arc<ScriptedGateway>) -> Navigator {
        Navigator::with_gateway(&AppConfig::default(), gateway)
    }

    #[test]
    fn test_seeds_are_serialized() {
        let seeds = Arc::new(RecordingSeeds::new());
        let nav = Navigator::with_parts(
            &AppConfig::default(),
            Arc::new(ScriptedGateway::echo()),
            seeds.clone(),
        );
        let mut events = nav.event_bus().subscribe();
        nav.add_seeds(&[
            Seed::new("junction", json!("M5:10")),
            Seed::new("location", json!({"lat": 51.5, "lon": -2.6})),
        ])
        .unwrap();

        let recorded = seeds.seeds();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], ("junction".to_string(), "\"M5:10\"".to_string()));
        assert_eq!(recorded[1].0, "location");
        assert!(recorded[1].1.starts_with('{'));
        assert!(matches!(
            events.try_recv().unwrap(),
            NavigatorEvent::SeedAdded { .. }
        ));
    }

    #[tokio::test]
    async fn test_built_query_is_queued_and_run() {
        let gateway = Arc::new(ScriptedGateway::echo());
        let nav = navigator(gateway.clone());

        nav.run_built_query(get_elements("M5")).await.unwrap();

        assert_eq!(gateway.call_count(), 1);
        assert_eq!(nav.coordinator().queue().len(), 1);
        assert_eq!(nav.results().updates(), 1);
    }

    #[tokio::test]
    async fn test_execute_all_replaces_previous_results() {
        let gateway = Arc::new(ScriptedGateway::echo());
        let nav = navigator(gateway.clone());

        nav.run_built_query(get_elements("M5")).await.unwrap();
        nav.add_operation(get_elements("M4"));
        let report = nav.execute_all().await;

        assert_eq!(report.succeeded(), 2);
        assert_eq!(nav.results().updates(), 2);
        assert_eq!(nav.results().len(), 2);
        assert!(!nav.loading().is_loading());
        assert!(gateway.calls().iter().all(|c| chain_len(c) == 3));
    }
}
