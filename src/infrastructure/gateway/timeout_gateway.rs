use crate::application::ports::{
    DeleteOutcome, InteractionGateway, InteractionTable, UpsertOutcome,
};
use crate::domain::entities::{Comment, InteractionCounts, MembershipRow, NewComment};
use crate::domain::value_objects::{CommentId, ItemId, MembershipKind, UserId};
use crate::shared::config::GatewayConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// ゲートウェイ呼び出しにタイムアウトを課すデコレータ。
///
/// 期限切れは `AppError::Timeout` になり、トグル側ではゲートウェイ失敗として
/// ロールバックされる。
pub struct TimeoutGateway {
    inner: Arc<dyn InteractionGateway>,
    timeout: Duration,
}

impl TimeoutGateway {
    pub fn new(inner: Arc<dyn InteractionGateway>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn from_config(inner: Arc<dyn InteractionGateway>, config: &GatewayConfig) -> Self {
        Self::new(inner, Duration::from_millis(config.request_timeout_ms))
    }

    async fn guarded<T, F>(&self, operation: &'static str, future: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>> + Send,
    {
        match tokio::time::timeout(self.timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(operation, timeout_ms, "gateway call timed out");
                Err(AppError::Timeout(format!(
                    "{operation} did not complete within {timeout_ms}ms"
                )))
            }
        }
    }
}

#[async_trait]
impl InteractionGateway for TimeoutGateway {
    async fn fetch_counts(&self, item_id: ItemId) -> Result<InteractionCounts, AppError> {
        self.guarded("fetch_counts", self.inner.fetch_counts(item_id))
            .await
    }

    async fn fetch_membership_batch(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipRow>, AppError> {
        self.guarded(
            "fetch_membership_batch",
            self.inner.fetch_membership_batch(user_id),
        )
        .await
    }

    async fn upsert_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<UpsertOutcome, AppError> {
        self.guarded(
            "upsert_membership",
            self.inner.upsert_membership(item_id, user_id, kind),
        )
        .await
    }

    async fn delete_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<DeleteOutcome, AppError> {
        self.guarded(
            "delete_membership",
            self.inner.delete_membership(item_id, user_id, kind),
        )
        .await
    }

    async fn count_rows(&self, table: InteractionTable, item_id: ItemId) -> Result<u64, AppError> {
        self.guarded("count_rows", self.inner.count_rows(table, item_id))
            .await
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, AppError> {
        self.guarded("insert_comment", self.inner.insert_comment(comment))
            .await
    }

    async fn get_comment(&self, comment_id: CommentId) -> Result<Option<Comment>, AppError> {
        self.guarded("get_comment", self.inner.get_comment(comment_id))
            .await
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<DeleteOutcome, AppError> {
        self.guarded("delete_comment", self.inner.delete_comment(comment_id))
            .await
    }

    async fn list_comments(&self, item_id: ItemId) -> Result<Vec<Comment>, AppError> {
        self.guarded("list_comments", self.inner.list_comments(item_id))
            .await
    }
}
