use serde::{Deserialize, Serialize};
use std::fmt;

/// 集計カウンタの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountKind {
    Likes,
    Favorites,
    Comments,
}

impl CountKind {
    pub const ALL: [CountKind; 3] = [CountKind::Likes, CountKind::Favorites, CountKind::Comments];

    pub fn as_str(&self) -> &'static str {
        match self {
            CountKind::Likes => "likes",
            CountKind::Favorites => "favorites",
            CountKind::Comments => "comments",
        }
    }
}

impl fmt::Display for CountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ユーザーがトグルできるメンバーシップの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    Liked,
    Favorited,
}

impl MembershipKind {
    pub const ALL: [MembershipKind; 2] = [MembershipKind::Liked, MembershipKind::Favorited];

    /// このメンバーシップと連動するカウンタ
    pub fn count_kind(&self) -> CountKind {
        match self {
            MembershipKind::Liked => CountKind::Likes,
            MembershipKind::Favorited => CountKind::Favorites,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipKind::Liked => "liked",
            MembershipKind::Favorited => "favorited",
        }
    }
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
