#![allow(dead_code)]

pub mod mocks;

use flora_interactions::domain::value_objects::UserId;
use flora_interactions::shared::config::AppConfig;
use flora_interactions::{AppState, InteractionGateway};
use std::sync::Arc;

pub fn user(name: &str) -> UserId {
    UserId::new(name).expect("valid user id")
}

/// タイムアウトを短くした設定でサービス一式を組み立てる
pub fn state_with(gateway: Arc<dyn InteractionGateway>) -> AppState {
    let mut config = AppConfig::default();
    config.gateway.request_timeout_ms = 2_000;
    AppState::with_gateway(config, gateway)
}
