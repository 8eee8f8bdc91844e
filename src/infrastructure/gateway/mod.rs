pub mod timeout_gateway;

pub use timeout_gateway::TimeoutGateway;
