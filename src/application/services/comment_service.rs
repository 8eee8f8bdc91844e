use crate::application::ports::{DeleteOutcome, InteractionGateway};
use crate::domain::entities::{Comment, NewComment};
use crate::domain::value_objects::{CommentId, CountKind, ItemId};
use crate::infrastructure::cache::InteractionCache;
use crate::shared::config::CommentConfig;
use crate::shared::error::AppError;
use crate::shared::validation::normalize_content;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    #[error("sign-in required")]
    Unauthenticated,
    #[error("comment {0} not found")]
    NotFound(CommentId),
    #[error("comment {0} belongs to another user")]
    NotOwner(CommentId),
    #[error("invalid comment: {0}")]
    Validation(#[source] AppError),
    #[error("comment request failed: {0}")]
    Gateway(#[source] AppError),
}

/// コメントの投稿・削除・一覧。コメント数カウンタは書き込み確定後に更新する。
#[derive(Clone)]
pub struct CommentService {
    cache: InteractionCache,
    gateway: Arc<dyn InteractionGateway>,
    max_length: usize,
}

impl CommentService {
    pub fn new(
        cache: InteractionCache,
        gateway: Arc<dyn InteractionGateway>,
        config: &CommentConfig,
    ) -> Self {
        Self {
            cache,
            gateway,
            max_length: config.max_length,
        }
    }

    pub async fn submit_comment(
        &self,
        item_id: ItemId,
        content: &str,
    ) -> Result<Comment, CommentError> {
        let author = self.cache.current_user().ok_or(CommentError::Unauthenticated)?;
        let content =
            normalize_content(content, self.max_length).map_err(CommentError::Validation)?;

        let comment = self
            .gateway
            .insert_comment(&NewComment::new(item_id, author, content))
            .await
            .map_err(CommentError::Gateway)?;

        self.cache.adjust_count(item_id, CountKind::Comments, 1);
        info!(item_id = %item_id, comment_id = %comment.id, "comment submitted");
        Ok(comment)
    }

    /// 投稿者本人のみ削除できる
    pub async fn delete_comment(&self, comment_id: CommentId) -> Result<(), CommentError> {
        let user_id = self.cache.current_user().ok_or(CommentError::Unauthenticated)?;

        let comment = self
            .gateway
            .get_comment(comment_id)
            .await
            .map_err(CommentError::Gateway)?
            .ok_or(CommentError::NotFound(comment_id))?;

        if !comment.is_authored_by(&user_id) {
            debug!(comment_id = %comment_id, user_id = %user_id, "delete rejected: not the author");
            return Err(CommentError::NotOwner(comment_id));
        }

        match self
            .gateway
            .delete_comment(comment_id)
            .await
            .map_err(CommentError::Gateway)?
        {
            DeleteOutcome::Deleted => {
                self.cache
                    .adjust_count(comment.item_id, CountKind::Comments, -1);
                info!(item_id = %comment.item_id, comment_id = %comment_id, "comment deleted");
                Ok(())
            }
            DeleteOutcome::AlreadyAbsent => Err(CommentError::NotFound(comment_id)),
        }
    }

    /// 新しい順。取得した件数でコメント数カウンタも合わせる。
    pub async fn list_comments(&self, item_id: ItemId) -> Result<Vec<Comment>, CommentError> {
        let comments = self
            .gateway
            .list_comments(item_id)
            .await
            .map_err(CommentError::Gateway)?;
        let total = i64::try_from(comments.len()).unwrap_or(i64::MAX);
        self.cache.set_count(item_id, CountKind::Comments, total);
        Ok(comments)
    }
}
