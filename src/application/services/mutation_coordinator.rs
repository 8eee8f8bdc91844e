use super::in_flight::InFlightRegistry;
use crate::application::ports::{DeleteOutcome, InteractionGateway, UpsertOutcome};
use crate::domain::entities::InteractionCounts;
use crate::domain::value_objects::{ItemId, MembershipKind, UserId};
use crate::infrastructure::cache::{FavoritesProjection, InteractionCache, MembershipChange};
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// トグル成功時の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub item_id: ItemId,
    pub kind: MembershipKind,
    /// トグル後の状態（true = いいね／お気に入り済み）
    pub active: bool,
    pub counts: InteractionCounts,
    /// リモート側が既に目的の状態だった（既存行への挿入、存在しない行の削除）
    pub already_in_desired_state: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("sign-in required to toggle {kind} on item {item_id}")]
    Unauthenticated { item_id: ItemId, kind: MembershipKind },
    #[error("{kind} toggle for item {item_id} is already in progress")]
    AlreadyInProgress { item_id: ItemId, kind: MembershipKind },
    #[error("{kind} toggle for item {item_id} was rolled back: {source}")]
    GatewayFailure {
        item_id: ItemId,
        kind: MembershipKind,
        #[source]
        source: AppError,
    },
}

/// いいね・お気に入りのトグルを「楽観的更新 → リモート書き込み → 確定 or ロールバック」
/// として実行する。
///
/// 同じ `(item_id, kind)` のトグルは実行中マーカーで直列化され、二重クリックは
/// 待たせずに `AlreadyInProgress` で即座に拒否する。異なる植物・種別のトグルは
/// 並行して進んでよい。
#[derive(Clone)]
pub struct MutationCoordinator {
    cache: InteractionCache,
    projection: FavoritesProjection,
    gateway: Arc<dyn InteractionGateway>,
    in_flight: InFlightRegistry,
}

impl MutationCoordinator {
    pub fn new(
        cache: InteractionCache,
        projection: FavoritesProjection,
        gateway: Arc<dyn InteractionGateway>,
    ) -> Self {
        Self {
            cache,
            projection,
            gateway,
            in_flight: InFlightRegistry::new(),
        }
    }

    /// セッション開始処理と共有する実行中トグルの登録簿
    pub fn in_flight(&self) -> InFlightRegistry {
        self.in_flight.clone()
    }

    pub fn is_in_flight(&self, item_id: ItemId, kind: MembershipKind) -> bool {
        self.in_flight.contains(&(item_id, kind))
    }

    pub async fn toggle(
        &self,
        item_id: ItemId,
        kind: MembershipKind,
    ) -> Result<ToggleOutcome, ToggleError> {
        let Some(user_id) = self.cache.current_user() else {
            debug!(item_id = %item_id, kind = %kind, "toggle rejected: not signed in");
            return Err(ToggleError::Unauthenticated { item_id, kind });
        };

        let Some(_guard) = self.in_flight.try_acquire((item_id, kind)) else {
            debug!(item_id = %item_id, kind = %kind, "toggle rejected: already in progress");
            return Err(ToggleError::AlreadyInProgress { item_id, kind });
        };

        let target = !self.cache.get_membership(item_id).get(kind);
        let change = self
            .cache
            .toggle_membership_and_count(item_id, kind, target);

        match self.write_remote(item_id, &user_id, kind, target).await {
            Ok(already_in_desired_state) => {
                self.commit(&change);
                info!(
                    item_id = %item_id,
                    kind = %kind,
                    active = target,
                    already_in_desired_state,
                    "toggle committed"
                );
                Ok(ToggleOutcome {
                    item_id,
                    kind,
                    active: target,
                    counts: self.cache.get_counts(item_id),
                    already_in_desired_state,
                })
            }
            Err(source) => {
                self.rollback(&change);
                warn!(
                    item_id = %item_id,
                    kind = %kind,
                    error = %source,
                    "toggle rolled back"
                );
                Err(ToggleError::GatewayFailure {
                    item_id,
                    kind,
                    source,
                })
            }
        }
    }

    /// 既に目的の状態だった場合は `Ok(true)` を返す
    async fn write_remote(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
        target: bool,
    ) -> Result<bool, AppError> {
        if target {
            let outcome = self
                .gateway
                .upsert_membership(item_id, user_id, kind)
                .await?;
            Ok(outcome == UpsertOutcome::AlreadyExists)
        } else {
            let outcome = self
                .gateway
                .delete_membership(item_id, user_id, kind)
                .await?;
            Ok(outcome == DeleteOutcome::AlreadyAbsent)
        }
    }

    /// 楽観的更新を適用したときと同じセッションか。ログアウトや
    /// ユーザー切り替えを挟んだ書き込み結果はローカルへ反映しない。
    fn is_same_session(&self, change: &MembershipChange) -> bool {
        self.cache.session_generation() == change.session
    }

    fn commit(&self, change: &MembershipChange) {
        if !self.is_same_session(change) {
            debug!(item_id = %change.item_id, kind = %change.kind, "session changed; commit not applied locally");
            return;
        }
        let membership = self.cache.get_membership(change.item_id);
        self.projection.upsert(
            change.item_id,
            membership.is_liked,
            membership.is_favorited,
            Utc::now(),
        );
    }

    fn rollback(&self, change: &MembershipChange) {
        if !self.is_same_session(change) {
            debug!(item_id = %change.item_id, kind = %change.kind, "session changed; rollback not applied locally");
            return;
        }
        self.cache.revert_membership_change(change);
        // 同じ植物の別種別トグルが先に成功していた場合に備えてフラグを合わせ直す
        let membership = self.cache.get_membership(change.item_id);
        self.projection
            .reconcile(change.item_id, membership, Utc::now());
    }

    /// リモートから正確な集計値を取り直す。
    ///
    /// その植物のトグルが実行中、または取得中に開始された場合は、自分の書き込みが
    /// まだ反映されていない古い集計で上書きしないよう適用を見送り `Ok(false)` を返す。
    pub async fn refresh_counts(&self, item_id: ItemId) -> Result<bool, AppError> {
        if self.in_flight.any_for_item(item_id) {
            debug!(item_id = %item_id, "count refresh skipped: toggle in flight");
            return Ok(false);
        }
        let epoch = self.in_flight.item_epoch(item_id);

        let counts = self.gateway.fetch_counts(item_id).await?;

        if self.in_flight.any_for_item(item_id) || self.in_flight.item_epoch(item_id) != epoch {
            debug!(item_id = %item_id, "count refresh discarded: toggle started meanwhile");
            return Ok(false);
        }
        self.cache.replace_counts(item_id, counts);
        Ok(true)
    }
}
