use crate::domain::entities::ItemMembership;
use crate::domain::value_objects::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// お気に入り一覧の 1 行。いずれかのフラグが立っている植物だけが存在する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub item_id: ItemId,
    pub is_liked: bool,
    pub is_favorited: bool,
    pub last_interaction_at: DateTime<Utc>,
}

impl FavoriteEntry {
    pub fn membership(&self) -> ItemMembership {
        ItemMembership::new(self.is_liked, self.is_favorited)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionFilter {
    #[default]
    All,
    LikedOnly,
    FavoritedOnly,
}

impl ProjectionFilter {
    pub fn matches(&self, entry: &FavoriteEntry) -> bool {
        match self {
            ProjectionFilter::All => true,
            ProjectionFilter::LikedOnly => entry.is_liked,
            ProjectionFilter::FavoritedOnly => entry.is_favorited,
        }
    }
}
