use crate::domain::value_objects::{CommentId, ItemId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 植物へのコメント。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub item_id: ItemId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.author == user_id
    }
}

/// 保存前のコメント。ID はデータストアが払い出す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub item_id: ItemId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn new(item_id: ItemId, author: UserId, content: String) -> Self {
        Self {
            item_id,
            author,
            content,
            created_at: Utc::now(),
        }
    }
}
