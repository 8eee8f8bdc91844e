use crate::domain::value_objects::{ItemId, MembershipKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 1 つの植物に対する現在ユーザーのいいね・お気に入り状態。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMembership {
    pub is_liked: bool,
    pub is_favorited: bool,
}

impl ItemMembership {
    pub fn new(is_liked: bool, is_favorited: bool) -> Self {
        Self {
            is_liked,
            is_favorited,
        }
    }

    pub fn get(&self, kind: MembershipKind) -> bool {
        match kind {
            MembershipKind::Liked => self.is_liked,
            MembershipKind::Favorited => self.is_favorited,
        }
    }

    pub fn with(mut self, kind: MembershipKind, present: bool) -> Self {
        match kind {
            MembershipKind::Liked => self.is_liked = present,
            MembershipKind::Favorited => self.is_favorited = present,
        }
        self
    }

    /// いずれかのフラグが立っているか
    pub fn is_any(&self) -> bool {
        self.is_liked || self.is_favorited
    }
}

/// サインイン中ユーザーのメンバーシップ集合。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMembership {
    pub liked_items: HashSet<ItemId>,
    pub favorited_items: HashSet<ItemId>,
}

impl UserMembership {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_for(&self, kind: MembershipKind) -> &HashSet<ItemId> {
        match kind {
            MembershipKind::Liked => &self.liked_items,
            MembershipKind::Favorited => &self.favorited_items,
        }
    }

    fn set_for_mut(&mut self, kind: MembershipKind) -> &mut HashSet<ItemId> {
        match kind {
            MembershipKind::Liked => &mut self.liked_items,
            MembershipKind::Favorited => &mut self.favorited_items,
        }
    }

    pub fn contains(&self, item_id: ItemId, kind: MembershipKind) -> bool {
        self.set_for(kind).contains(&item_id)
    }

    /// 状態が変化した場合のみ true を返す。
    pub fn set(&mut self, item_id: ItemId, kind: MembershipKind, present: bool) -> bool {
        let set = self.set_for_mut(kind);
        if present {
            set.insert(item_id)
        } else {
            set.remove(&item_id)
        }
    }

    pub fn for_item(&self, item_id: ItemId) -> ItemMembership {
        ItemMembership {
            is_liked: self.liked_items.contains(&item_id),
            is_favorited: self.favorited_items.contains(&item_id),
        }
    }

    pub fn insert(&mut self, item_id: ItemId, kind: MembershipKind) {
        self.set_for_mut(kind).insert(item_id);
    }

    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.liked_items
            .iter()
            .chain(self.favorited_items.difference(&self.liked_items))
            .copied()
    }

    pub fn clear(&mut self) {
        self.liked_items.clear();
        self.favorited_items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.liked_items.is_empty() && self.favorited_items.is_empty()
    }
}
