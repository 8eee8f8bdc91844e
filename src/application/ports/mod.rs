pub mod interaction_gateway;

pub use interaction_gateway::{DeleteOutcome, InteractionGateway, InteractionTable, UpsertOutcome};
