use crate::domain::value_objects::{ItemId, MembershipKind};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type InFlightKey = (ItemId, MembershipKind);

#[derive(Default)]
struct InFlightState {
    active: HashSet<InFlightKey>,
    // キーごとに開始されたトグルの累計
    epochs: HashMap<InFlightKey, u64>,
}

/// ある時点の開始済みトグル数。リモート取得を挟んだ競合検出に使う。
#[derive(Debug, Clone, Default)]
pub struct InFlightSnapshot {
    epochs: HashMap<InFlightKey, u64>,
}

/// 実行中トグルの登録簿。コーディネーターとセッション開始処理で共有する。
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    state: Arc<Mutex<InFlightState>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InFlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn try_acquire(&self, key: InFlightKey) -> Option<InFlightGuard> {
        let mut state = self.lock();
        if !state.active.insert(key) {
            return None;
        }
        *state.epochs.entry(key).or_default() += 1;
        Some(InFlightGuard {
            registry: self.clone(),
            key,
        })
    }

    pub fn contains(&self, key: &InFlightKey) -> bool {
        self.lock().active.contains(key)
    }

    pub fn any_for_item(&self, item_id: ItemId) -> bool {
        let state = self.lock();
        MembershipKind::ALL
            .iter()
            .any(|kind| state.active.contains(&(item_id, *kind)))
    }

    pub(crate) fn item_epoch(&self, item_id: ItemId) -> u64 {
        let state = self.lock();
        MembershipKind::ALL
            .iter()
            .filter_map(|kind| state.epochs.get(&(item_id, *kind)))
            .sum()
    }

    pub fn snapshot(&self) -> InFlightSnapshot {
        InFlightSnapshot {
            epochs: self.lock().epochs.clone(),
        }
    }

    /// 現在実行中のキーと、`snapshot` 以降に開始されたキー
    pub fn changed_since(&self, snapshot: &InFlightSnapshot) -> HashSet<InFlightKey> {
        let state = self.lock();
        let mut keys = state.active.clone();
        keys.extend(
            state
                .epochs
                .iter()
                .filter(|(key, epoch)| snapshot.epochs.get(key).copied().unwrap_or(0) != **epoch)
                .map(|(key, _)| *key),
        );
        keys
    }

    fn release(&self, key: &InFlightKey) {
        self.lock().active.remove(key);
    }
}

/// 実行中マーカー。成功・失敗・future の破棄のいずれでも drop 時に解放される。
pub(crate) struct InFlightGuard {
    registry: InFlightRegistry,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIKE: InFlightKey = (ItemId::new(1), MembershipKind::Liked);
    const FAVORITE: InFlightKey = (ItemId::new(1), MembershipKind::Favorited);

    #[test]
    fn guard_releases_on_drop() {
        let registry = InFlightRegistry::new();
        let guard = registry.try_acquire(LIKE).expect("first acquire");
        assert!(registry.try_acquire(LIKE).is_none());
        assert!(registry.try_acquire(FAVORITE).is_some());

        drop(guard);

        assert!(!registry.contains(&LIKE));
        assert!(registry.try_acquire(LIKE).is_some());
    }

    #[test]
    fn changed_since_reports_active_and_completed_keys() {
        let registry = InFlightRegistry::new();
        let held = registry.try_acquire(LIKE).unwrap();
        let snapshot = registry.snapshot();

        drop(registry.try_acquire(FAVORITE).unwrap());

        let changed = registry.changed_since(&snapshot);
        assert!(changed.contains(&LIKE));
        assert!(changed.contains(&FAVORITE));

        drop(held);
        let settled = registry.snapshot();
        assert!(registry.changed_since(&settled).is_empty());
        assert_eq!(registry.item_epoch(ItemId::new(1)), 2);
    }
}
