use crate::domain::entities::{InteractionCounts, ItemMembership, UserMembership};
use crate::domain::value_objects::{CountKind, ItemId, MembershipKind, UserId};
use crate::shared::config::CacheConfig;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

pub type ItemChangedCallback = Arc<dyn Fn(ItemId) + Send + Sync>;

/// `on_item_changed` の購読ハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// `toggle_membership_and_count` で実際に適用された変更。
///
/// ロールバックは `applied_delta` を打ち消すので、クランプが効いた場合でも
/// トグル前の値に正確に戻る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipChange {
    pub item_id: ItemId,
    pub kind: MembershipKind,
    pub previous: bool,
    pub current: bool,
    pub applied_delta: i64,
    /// 適用時のセッション世代
    pub session: u64,
}

impl MembershipChange {
    pub fn is_noop(&self) -> bool {
        self.previous == self.current && self.applied_delta == 0
    }
}

#[derive(Default)]
struct CacheState {
    user: Option<UserId>,
    // ログアウト・ユーザー切り替えのたびに進む
    session: u64,
    counts: HashMap<ItemId, InteractionCounts>,
    membership: UserMembership,
}

/// いいね・お気に入り・コメント数と、サインイン中ユーザーのメンバーシップを保持するキャッシュ。
///
/// 描画されるカウンタの唯一の情報源。すべての更新系メソッドは同期的に
/// 完了し、影響を受けた植物ごとに 1 回だけ変更通知を発行する。通知には
/// 値を載せないので、購読側はゲッターで読み直す。
#[derive(Clone)]
pub struct InteractionCache {
    state: Arc<RwLock<CacheState>>,
    listeners: Arc<RwLock<BTreeMap<SubscriptionId, ItemChangedCallback>>>,
    next_subscription: Arc<AtomicU64>,
    sender: broadcast::Sender<ItemId>,
}

impl InteractionCache {
    pub fn new(notification_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(notification_capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            listeners: Arc::new(RwLock::new(BTreeMap::new())),
            next_subscription: Arc::new(AtomicU64::new(1)),
            sender,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.notification_capacity)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// ユーザーをサインインさせる。別ユーザーへの切り替え時はメンバーシップを破棄する。
    pub fn sign_in(&self, user_id: UserId) {
        let affected: Vec<ItemId> = {
            let mut state = self.write_state();
            if state.user.as_ref() == Some(&user_id) {
                return;
            }
            let affected = state.membership.item_ids().collect();
            state.membership.clear();
            state.user = Some(user_id);
            state.session += 1;
            affected
        };
        self.notify_all(affected);
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.read_state().user.clone()
    }

    pub fn session_generation(&self) -> u64 {
        self.read_state().session
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().user.is_some()
    }

    /// 未知の植物には 0 を返す
    pub fn get_counts(&self, item_id: ItemId) -> InteractionCounts {
        self.read_state()
            .counts
            .get(&item_id)
            .copied()
            .unwrap_or_default()
    }

    /// 匿名ユーザー、または未知の植物には `{false, false}` を返す
    pub fn get_membership(&self, item_id: ItemId) -> ItemMembership {
        let state = self.read_state();
        if state.user.is_none() {
            return ItemMembership::default();
        }
        state.membership.for_item(item_id)
    }

    /// 値は 0 以上にクランプされ、変化した場合のみ通知する。
    pub fn set_count(&self, item_id: ItemId, kind: CountKind, value: i64) -> bool {
        let changed = {
            let mut state = self.write_state();
            state.counts.entry(item_id).or_default().set(kind, value)
        };
        if changed {
            self.notify(item_id);
        }
        changed
    }

    /// 相対更新。実際に適用された差分を返す（コメント数の更新口）。
    pub fn adjust_count(&self, item_id: ItemId, kind: CountKind, delta: i64) -> i64 {
        let applied = {
            let mut state = self.write_state();
            state.counts.entry(item_id).or_default().apply_delta(kind, delta)
        };
        if applied != 0 {
            self.notify(item_id);
        }
        applied
    }

    /// 3 種類のカウンタをまとめて置き換え、通知は 1 回にまとめる。
    pub fn replace_counts(&self, item_id: ItemId, counts: InteractionCounts) -> bool {
        let changed = {
            let mut state = self.write_state();
            let slot = state.counts.entry(item_id).or_default();
            let changed = *slot != counts;
            *slot = counts;
            changed
        };
        if changed {
            self.notify(item_id);
        }
        changed
    }

    /// 冪等。同じ値を 2 回設定しても通知は発生しない。匿名時は何もしない。
    pub fn set_membership(&self, item_id: ItemId, kind: MembershipKind, present: bool) -> bool {
        let changed = {
            let mut state = self.write_state();
            if state.user.is_none() {
                return false;
            }
            state.membership.set(item_id, kind, present)
        };
        if changed {
            self.notify(item_id);
        }
        changed
    }

    /// メンバーシップのビットと対応するカウンタの ±1 を 1 回のロックで適用する。
    pub fn toggle_membership_and_count(
        &self,
        item_id: ItemId,
        kind: MembershipKind,
        present: bool,
    ) -> MembershipChange {
        let change = {
            let mut state = self.write_state();
            let previous = state.membership.contains(item_id, kind);
            if state.user.is_none() || previous == present {
                MembershipChange {
                    item_id,
                    kind,
                    previous,
                    current: previous,
                    applied_delta: 0,
                    session: state.session,
                }
            } else {
                state.membership.set(item_id, kind, present);
                let delta = if present { 1 } else { -1 };
                let applied_delta = state
                    .counts
                    .entry(item_id)
                    .or_default()
                    .apply_delta(kind.count_kind(), delta);
                MembershipChange {
                    item_id,
                    kind,
                    previous,
                    current: present,
                    applied_delta,
                    session: state.session,
                }
            }
        };
        if !change.is_noop() {
            self.notify(item_id);
        }
        change
    }

    /// `toggle_membership_and_count` の結果を打ち消す。
    /// セッション世代が変わっている場合は何もしない。
    pub fn revert_membership_change(&self, change: &MembershipChange) {
        if change.is_noop() {
            return;
        }
        let changed = {
            let mut state = self.write_state();
            if state.session != change.session {
                return;
            }
            let bit_changed = state.user.is_some()
                && state
                    .membership
                    .set(change.item_id, change.kind, change.previous);
            let reverted = state
                .counts
                .entry(change.item_id)
                .or_default()
                .apply_delta(change.kind.count_kind(), -change.applied_delta);
            bit_changed || reverted != 0
        };
        if changed {
            self.notify(change.item_id);
        }
    }

    /// セッション開始時の一括投入。指定された植物の状態はマージせず置き換える。
    ///
    /// `counts` は `item_ids` と同じ順序で対応付け、不足分は 0 として扱う。
    pub fn initialize(
        &self,
        item_ids: &[ItemId],
        counts: &[InteractionCounts],
        membership: &UserMembership,
    ) {
        if counts.len() != item_ids.len() {
            debug!(
                item_ids = item_ids.len(),
                counts = counts.len(),
                "initialize received mismatched counts; padding with zeros"
            );
        }

        let affected: BTreeSet<ItemId> = {
            let mut state = self.write_state();
            let mut affected = seed_counts(&mut state, item_ids, counts, &HashSet::new());
            if state.user.is_some() {
                for &item_id in item_ids {
                    for kind in MembershipKind::ALL {
                        let present = membership.contains(item_id, kind);
                        if state.membership.set(item_id, kind, present) {
                            affected.insert(item_id);
                        }
                    }
                }
            }
            affected
        };

        self.notify_all(affected);
    }

    /// セッション開始時の全面置き換え。メンバーシップはバッチの内容で丸ごと置き換え、
    /// カウンタは `item_ids` の分を置き換える。
    ///
    /// `preserve` に含まれる `(植物, 種別)` は現在のビットと対応カウンタを維持する。
    /// 取得中に実行・完了したトグルの結果を古い値で上書きしないためのもの。
    pub fn replace_session(
        &self,
        item_ids: &[ItemId],
        counts: &[InteractionCounts],
        membership: &UserMembership,
        preserve: &HashSet<(ItemId, MembershipKind)>,
    ) {
        let affected: BTreeSet<ItemId> = {
            let mut state = self.write_state();
            let mut affected = seed_counts(&mut state, item_ids, counts, preserve);
            if state.user.is_some() {
                let mut next = membership.clone();
                for &(item_id, kind) in preserve {
                    next.set(item_id, kind, state.membership.contains(item_id, kind));
                }
                let touched: BTreeSet<ItemId> =
                    state.membership.item_ids().chain(next.item_ids()).collect();
                affected.extend(
                    touched
                        .into_iter()
                        .filter(|id| state.membership.for_item(*id) != next.for_item(*id)),
                );
                state.membership = next;
            }
            affected
        };

        self.notify_all(affected);
    }

    /// ログアウト時に呼ぶ。ユーザー・メンバーシップ・カウンタをすべて破棄する。
    pub fn reset(&self) {
        let affected: BTreeSet<ItemId> = {
            let mut state = self.write_state();
            let mut affected: BTreeSet<ItemId> = state.counts.keys().copied().collect();
            affected.extend(state.membership.item_ids());
            let session = state.session + 1;
            *state = CacheState {
                session,
                ..CacheState::default()
            };
            affected
        };
        self.notify_all(affected);
    }

    /// 既知の植物数
    pub fn len(&self) -> usize {
        let state = self.read_state();
        let mut ids: BTreeSet<ItemId> = state.counts.keys().copied().collect();
        ids.extend(state.membership.item_ids());
        ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 変更通知のコールバックを登録する。コールバックはロック解放後に呼ばれる。
    pub fn on_item_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(ItemId) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// 非同期の購読者向けチャネル
    pub fn subscribe(&self) -> broadcast::Receiver<ItemId> {
        self.sender.subscribe()
    }

    fn notify_all(&self, item_ids: impl IntoIterator<Item = ItemId>) {
        for item_id in item_ids {
            self.notify(item_id);
        }
    }

    fn notify(&self, item_id: ItemId) {
        let callbacks: Vec<ItemChangedCallback> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback(item_id);
        }
        // 受信者がいない場合の送信エラーは無視してよい
        let _ = self.sender.send(item_id);
    }
}

/// `item_ids` のカウンタを置き換え、変化した植物を返す。
/// `preserve` に含まれる種別の対応カウンタは現在値を維持する。
fn seed_counts(
    state: &mut CacheState,
    item_ids: &[ItemId],
    counts: &[InteractionCounts],
    preserve: &HashSet<(ItemId, MembershipKind)>,
) -> BTreeSet<ItemId> {
    let mut affected = BTreeSet::new();
    for (index, &item_id) in item_ids.iter().enumerate() {
        let mut next = counts.get(index).copied().unwrap_or_default();
        let slot = state.counts.entry(item_id).or_default();
        for kind in MembershipKind::ALL {
            if preserve.contains(&(item_id, kind)) {
                let count_kind = kind.count_kind();
                next.set(
                    count_kind,
                    i64::try_from(slot.get(count_kind)).unwrap_or(i64::MAX),
                );
            }
        }
        if *slot != next {
            *slot = next;
            affected.insert(item_id);
        }
    }
    affected
}

impl Default for InteractionCache {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}
