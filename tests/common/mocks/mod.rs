pub mod gateway;
pub mod scripted_gateway;

pub use gateway::MockInteractionGatewayPort;
pub use scripted_gateway::{ScriptedGateway, WriteGate};
