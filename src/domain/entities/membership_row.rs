use crate::domain::value_objects::{ItemId, MembershipKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一括取得で返るメンバーシップ行（いいね、またはお気に入り 1 件）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRow {
    pub item_id: ItemId,
    pub kind: MembershipKind,
    pub created_at: DateTime<Utc>,
}

impl MembershipRow {
    pub fn new(item_id: ItemId, kind: MembershipKind, created_at: DateTime<Utc>) -> Self {
        Self {
            item_id,
            kind,
            created_at,
        }
    }
}
