use crate::application::ports::InteractionGateway;
use crate::application::services::{CommentService, MutationCoordinator, SessionService};
use crate::infrastructure::cache::{FavoritesProjection, InteractionCache};
use crate::infrastructure::database::connection_pool::database_file_path;
use crate::infrastructure::database::{ConnectionPool, SqliteInteractionGateway};
use crate::infrastructure::gateway::TimeoutGateway;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// アプリケーション全体で共有するサービス群。
///
/// キャッシュと一覧はここで 1 度だけ生成し、各サービスへ同じハンドルを渡す。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub cache: InteractionCache,
    pub projection: FavoritesProjection,
    pub coordinator: MutationCoordinator,
    pub session: SessionService,
    pub comments: CommentService,
    pool: Option<ConnectionPool>,
}

impl AppState {
    /// SQLite バックエンドで初期化する。マイグレーションもここで適用する。
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().map_err(AppError::ConfigurationError)?;

        if let Some(parent) = database_file_path(&config.database.url)
            .and_then(|path| Path::new(path).parent())
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::from_config(&config.database).await?;
        let sqlite = SqliteInteractionGateway::new(pool.clone());
        sqlite.initialize().await?;
        info!(url = %config.database.url, "interaction database ready");

        let gateway: Arc<dyn InteractionGateway> = Arc::new(sqlite);
        let mut state = Self::with_gateway(config, gateway);
        state.pool = Some(pool);
        Ok(state)
    }

    /// 任意のゲートウェイで組み立てる。タイムアウトは設定値で必ず付与する。
    pub fn with_gateway(config: AppConfig, gateway: Arc<dyn InteractionGateway>) -> Self {
        let gateway: Arc<dyn InteractionGateway> =
            Arc::new(TimeoutGateway::from_config(gateway, &config.gateway));
        let cache = InteractionCache::from_config(&config.cache);
        let projection = FavoritesProjection::new();

        let coordinator =
            MutationCoordinator::new(cache.clone(), projection.clone(), Arc::clone(&gateway));
        let session = SessionService::new(
            cache.clone(),
            projection.clone(),
            Arc::clone(&gateway),
            coordinator.in_flight(),
        );
        let comments = CommentService::new(cache.clone(), gateway, &config.comments);

        Self {
            config,
            cache,
            projection,
            coordinator,
            session,
            comments,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        self.session.end();
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
