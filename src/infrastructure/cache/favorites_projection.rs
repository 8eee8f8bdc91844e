use crate::domain::entities::{FavoriteEntry, ItemMembership, MembershipRow, ProjectionFilter};
use crate::domain::value_objects::{ItemId, MembershipKind};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type OrderKey = (Reverse<DateTime<Utc>>, ItemId);

#[derive(Default)]
struct ProjectionState {
    entries: HashMap<ItemId, FavoriteEntry>,
    // 最終操作日時の降順、同時刻は item_id 昇順
    order: BTreeSet<OrderKey>,
}

impl ProjectionState {
    fn order_key(entry: &FavoriteEntry) -> OrderKey {
        (Reverse(entry.last_interaction_at), entry.item_id)
    }

    fn remove(&mut self, item_id: ItemId) -> Option<FavoriteEntry> {
        let removed = self.entries.remove(&item_id)?;
        self.order.remove(&Self::order_key(&removed));
        Some(removed)
    }

    fn insert(&mut self, entry: FavoriteEntry) {
        self.remove(entry.item_id);
        self.order.insert(Self::order_key(&entry));
        self.entries.insert(entry.item_id, entry);
    }
}

/// いいね・お気に入りした植物の一覧（お気に入りページ用の派生インデックス）。
///
/// メンバーシップから常に導出できる従属データで、トグル成功ごとに
/// 差分更新される。全件再構築はセッション開始時のみ。
#[derive(Clone, Default)]
pub struct FavoritesProjection {
    state: Arc<RwLock<ProjectionState>>,
}

impl FavoritesProjection {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ProjectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ProjectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 両フラグが false ならエントリを削除し、それ以外は挿入または置換する。
    /// 更新後にエントリが存在するかを返す。
    pub fn upsert(
        &self,
        item_id: ItemId,
        is_liked: bool,
        is_favorited: bool,
        timestamp: DateTime<Utc>,
    ) -> bool {
        let mut state = self.write_state();
        if !is_liked && !is_favorited {
            state.remove(item_id);
            return false;
        }
        state.insert(FavoriteEntry {
            item_id,
            is_liked,
            is_favorited,
            last_interaction_at: timestamp,
        });
        true
    }

    /// フラグだけを現在のメンバーシップに合わせる。既存エントリの日時は維持し、
    /// 新規の場合のみ `timestamp` を使う。
    pub fn reconcile(
        &self,
        item_id: ItemId,
        membership: ItemMembership,
        timestamp: DateTime<Utc>,
    ) -> bool {
        let mut state = self.write_state();
        if !membership.is_any() {
            state.remove(item_id);
            return false;
        }
        let last_interaction_at = state
            .entries
            .get(&item_id)
            .map(|entry| entry.last_interaction_at)
            .unwrap_or(timestamp);
        state.insert(FavoriteEntry {
            item_id,
            is_liked: membership.is_liked,
            is_favorited: membership.is_favorited,
            last_interaction_at,
        });
        true
    }

    pub fn remove(&self, item_id: ItemId) -> Option<FavoriteEntry> {
        self.write_state().remove(item_id)
    }

    pub fn list(&self, filter: ProjectionFilter) -> Vec<FavoriteEntry> {
        let state = self.read_state();
        state
            .order
            .iter()
            .filter_map(|(_, item_id)| state.entries.get(item_id))
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect()
    }

    pub fn get(&self, item_id: ItemId) -> Option<FavoriteEntry> {
        self.read_state().entries.get(&item_id).cloned()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.read_state().entries.contains_key(&item_id)
    }

    pub fn len(&self) -> usize {
        self.read_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.write_state() = ProjectionState::default();
    }

    /// 一括取得した行から全件を作り直す。同じ植物にいいねとお気に入りの
    /// 両方がある場合は遅い方の日時を採用する。
    pub fn rebuild(&self, rows: &[MembershipRow]) {
        let mut merged: HashMap<ItemId, FavoriteEntry> = HashMap::new();
        for row in rows {
            let entry = merged.entry(row.item_id).or_insert_with(|| FavoriteEntry {
                item_id: row.item_id,
                is_liked: false,
                is_favorited: false,
                last_interaction_at: row.created_at,
            });
            match row.kind {
                MembershipKind::Liked => entry.is_liked = true,
                MembershipKind::Favorited => entry.is_favorited = true,
            }
            if row.created_at > entry.last_interaction_at {
                entry.last_interaction_at = row.created_at;
            }
        }

        let mut state = ProjectionState::default();
        for entry in merged.into_values() {
            state.insert(entry);
        }
        *self.write_state() = state;
    }
}
