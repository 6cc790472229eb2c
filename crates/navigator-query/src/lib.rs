pub mod chain;
pub mod factory;
pub mod gateway;

pub use chain::ChainBuilder;
pub use factory::GafferOperationFactory;
pub use gateway::HttpGateway;
