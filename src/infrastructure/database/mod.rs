pub mod connection_pool;
mod queries;
pub mod sqlite_gateway;

pub use connection_pool::ConnectionPool;
pub use sqlite_gateway::SqliteInteractionGateway;
