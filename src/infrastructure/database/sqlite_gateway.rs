use super::ConnectionPool;
use super::queries::{
    COUNT_COMMENTS, COUNT_FAVORITES, COUNT_LIKES, DELETE_COMMENT, DELETE_FAVORITE, DELETE_LIKE,
    INSERT_COMMENT, INSERT_FAVORITE, INSERT_LIKE, SELECT_COMMENT_BY_ID, SELECT_COMMENTS_BY_ITEM,
    SELECT_FAVORITES_BY_USER, SELECT_LIKES_BY_USER,
};
use crate::application::ports::{
    DeleteOutcome, InteractionGateway, InteractionTable, UpsertOutcome,
};
use crate::domain::entities::{Comment, InteractionCounts, MembershipRow, NewComment};
use crate::domain::value_objects::{CommentId, ItemId, MembershipKind, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::FromRow;
use tracing::debug;

#[derive(Debug, FromRow)]
struct MembershipRecord {
    item_id: i64,
    created_at: i64,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    item_id: i64,
    user_id: String,
    content: String,
    created_at: i64,
}

fn timestamp_from_millis(value: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_millis_opt(value)
        .single()
        .ok_or_else(|| AppError::SerializationError(format!("Invalid timestamp: {value}")))
}

impl CommentRow {
    fn into_domain(self) -> Result<Comment, AppError> {
        let author = UserId::new(self.user_id)
            .map_err(|err| AppError::SerializationError(format!("Invalid user id: {err}")))?;
        Ok(Comment {
            id: CommentId::new(self.id),
            item_id: ItemId::new(self.item_id),
            author,
            content: self.content,
            created_at: timestamp_from_millis(self.created_at)?,
        })
    }
}

/// SQLite をバックエンドにした `InteractionGateway` 実装。
pub struct SqliteInteractionGateway {
    pool: ConnectionPool,
}

impl SqliteInteractionGateway {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub async fn initialize(&self) -> Result<(), AppError> {
        self.pool.migrate().await?;
        Ok(())
    }

    async fn fetch_membership_rows(
        &self,
        query: &'static str,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<Vec<MembershipRow>, AppError> {
        let records = sqlx::query_as::<_, MembershipRecord>(query)
            .bind(user_id.as_str())
            .fetch_all(self.pool.get_pool())
            .await?;

        records
            .into_iter()
            .map(|record| -> Result<MembershipRow, AppError> {
                Ok(MembershipRow::new(
                    ItemId::new(record.item_id),
                    kind,
                    timestamp_from_millis(record.created_at)?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl InteractionGateway for SqliteInteractionGateway {
    async fn fetch_counts(&self, item_id: ItemId) -> Result<InteractionCounts, AppError> {
        let likes = self.count_rows(InteractionTable::Likes, item_id).await?;
        let favorites = self.count_rows(InteractionTable::Favorites, item_id).await?;
        let comments = self.count_rows(InteractionTable::Comments, item_id).await?;
        Ok(InteractionCounts::new(likes, favorites, comments))
    }

    async fn fetch_membership_batch(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipRow>, AppError> {
        let mut rows = self
            .fetch_membership_rows(SELECT_LIKES_BY_USER, user_id, MembershipKind::Liked)
            .await?;
        rows.extend(
            self.fetch_membership_rows(SELECT_FAVORITES_BY_USER, user_id, MembershipKind::Favorited)
                .await?,
        );
        Ok(rows)
    }

    async fn upsert_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<UpsertOutcome, AppError> {
        let query = match kind {
            MembershipKind::Liked => INSERT_LIKE,
            MembershipKind::Favorited => INSERT_FAVORITE,
        };
        let result = sqlx::query(query)
            .bind(item_id.value())
            .bind(user_id.as_str())
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            debug!(item_id = %item_id, user_id = %user_id, kind = %kind, "membership row already exists");
            return Ok(UpsertOutcome::AlreadyExists);
        }
        Ok(UpsertOutcome::Inserted)
    }

    async fn delete_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<DeleteOutcome, AppError> {
        let query = match kind {
            MembershipKind::Liked => DELETE_LIKE,
            MembershipKind::Favorited => DELETE_FAVORITE,
        };
        let result = sqlx::query(query)
            .bind(item_id.value())
            .bind(user_id.as_str())
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            debug!(item_id = %item_id, user_id = %user_id, kind = %kind, "membership row already absent");
            return Ok(DeleteOutcome::AlreadyAbsent);
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn count_rows(&self, table: InteractionTable, item_id: ItemId) -> Result<u64, AppError> {
        let query = match table {
            InteractionTable::Likes => COUNT_LIKES,
            InteractionTable::Favorites => COUNT_FAVORITES,
            InteractionTable::Comments => COUNT_COMMENTS,
        };
        let count: i64 = sqlx::query_scalar(query)
            .bind(item_id.value())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, AppError> {
        let created_at = comment.created_at.timestamp_millis();
        let result = sqlx::query(INSERT_COMMENT)
            .bind(comment.item_id.value())
            .bind(comment.author.as_str())
            .bind(&comment.content)
            .bind(created_at)
            .execute(self.pool.get_pool())
            .await?;

        Ok(Comment {
            id: CommentId::new(result.last_insert_rowid()),
            item_id: comment.item_id,
            author: comment.author.clone(),
            content: comment.content.clone(),
            created_at: timestamp_from_millis(created_at)?,
        })
    }

    async fn get_comment(&self, comment_id: CommentId) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(SELECT_COMMENT_BY_ID)
            .bind(comment_id.value())
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.map(CommentRow::into_domain).transpose()
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<DeleteOutcome, AppError> {
        let result = sqlx::query(DELETE_COMMENT)
            .bind(comment_id.value())
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(DeleteOutcome::AlreadyAbsent);
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn list_comments(&self, item_id: ItemId) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(SELECT_COMMENTS_BY_ITEM)
            .bind(item_id.value())
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.into_iter().map(CommentRow::into_domain).collect()
    }
}
