pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::InteractionGateway;
pub use application::services::{
    CommentError, CommentService, MutationCoordinator, SessionService, ToggleError, ToggleOutcome,
};
pub use infrastructure::cache::{FavoritesProjection, InteractionCache};
pub use shared::{AppConfig, AppError};
pub use state::AppState;

/// `RUST_LOG` が未設定なら `flora_interactions=debug,info` で初期化する。
/// 二重初期化はエラーにせず無視する。
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flora_interactions=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
