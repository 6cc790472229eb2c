pub mod coordinator;
pub mod graph;
pub mod loading;
pub mod navigator;
pub mod queue;
pub mod results;

pub use coordinator::ExecutionCoordinator;
pub use graph::SeedGraph;
pub use loading::LoadingState;
pub use navigator::Navigator;
pub use queue::OperationQueue;
pub use results::ResultsStore;
