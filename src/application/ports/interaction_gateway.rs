use crate::domain::entities::{Comment, InteractionCounts, MembershipRow, NewComment};
use crate::domain::value_objects::{CommentId, ItemId, MembershipKind, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 行数を数える対象テーブル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionTable {
    Likes,
    Favorites,
    Comments,
}

impl fmt::Display for InteractionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionTable::Likes => "likes",
            InteractionTable::Favorites => "favorites",
            InteractionTable::Comments => "comments",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// 植物のいいね・お気に入り・コメントを保持するリモートデータストアへの窓口。
///
/// 具体的なストアは外部コラボレータであり、ここでは問い合わせの形だけを定める。
#[async_trait]
pub trait InteractionGateway: Send + Sync {
    async fn fetch_counts(&self, item_id: ItemId) -> Result<InteractionCounts, AppError>;

    /// ユーザーのいいね・お気に入り行をまとめて取得（セッション開始時の一括読み込み用）
    async fn fetch_membership_batch(&self, user_id: &UserId)
    -> Result<Vec<MembershipRow>, AppError>;

    /// `(item_id, user_id)` をキーとした冪等な挿入
    async fn upsert_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<UpsertOutcome, AppError>;

    async fn delete_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<DeleteOutcome, AppError>;

    async fn count_rows(&self, table: InteractionTable, item_id: ItemId) -> Result<u64, AppError>;

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, AppError>;

    async fn get_comment(&self, comment_id: CommentId) -> Result<Option<Comment>, AppError>;

    async fn delete_comment(&self, comment_id: CommentId) -> Result<DeleteOutcome, AppError>;

    /// 新しい順
    async fn list_comments(&self, item_id: ItemId) -> Result<Vec<Comment>, AppError>;
}
