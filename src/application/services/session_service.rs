use super::in_flight::InFlightRegistry;
use crate::application::ports::InteractionGateway;
use crate::domain::entities::{InteractionCounts, UserMembership};
use crate::domain::value_objects::{ItemId, UserId};
use crate::infrastructure::cache::{FavoritesProjection, InteractionCache};
use crate::shared::error::AppError;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// `start` の結果サマリー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub user_id: UserId,
    /// 集計値を投入した植物数（表示対象とメンバーシップ対象の和集合）
    pub seeded_items: usize,
    pub membership_rows: usize,
    /// 集計取得に失敗し、既存のキャッシュ値を維持した植物
    pub stale_items: Vec<ItemId>,
}

/// ログイン・ログアウトに合わせてキャッシュと一覧を作り直す
#[derive(Clone)]
pub struct SessionService {
    cache: InteractionCache,
    projection: FavoritesProjection,
    gateway: Arc<dyn InteractionGateway>,
    in_flight: InFlightRegistry,
}

impl SessionService {
    /// `in_flight` には `MutationCoordinator::in_flight()` を渡す
    pub fn new(
        cache: InteractionCache,
        projection: FavoritesProjection,
        gateway: Arc<dyn InteractionGateway>,
        in_flight: InFlightRegistry,
    ) -> Self {
        Self {
            cache,
            projection,
            gateway,
            in_flight,
        }
    }

    pub async fn start(
        &self,
        user_id: UserId,
        item_ids: &[ItemId],
    ) -> Result<SessionSummary, AppError> {
        let generation = self.cache.session_generation();
        let snapshot = self.in_flight.snapshot();

        let rows = match self.gateway.fetch_membership_batch(&user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "membership fetch failed; session not started");
                self.end();
                return Err(e);
            }
        };

        let mut membership = UserMembership::new();
        for row in &rows {
            membership.insert(row.item_id, row.kind);
        }

        // 表示対象を先に、重複を除いて順序を保つ
        let mut seen = HashSet::new();
        let mut seeded: Vec<ItemId> = item_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        let mut extra: Vec<ItemId> = membership.item_ids().filter(|id| seen.insert(*id)).collect();
        extra.sort();
        seeded.extend(extra);

        let results = join_all(seeded.iter().map(|id| self.gateway.fetch_counts(*id))).await;
        let mut stale_items = Vec::new();
        let counts: Vec<InteractionCounts> = seeded
            .iter()
            .zip(results)
            .map(|(id, result)| match result {
                Ok(counts) => counts,
                Err(e) => {
                    warn!(item_id = %id, error = %e, "count fetch failed; keeping cached counts");
                    stale_items.push(*id);
                    self.cache.get_counts(*id)
                }
            })
            .collect();

        // 同じセッションの再開時は、取得中に実行・完了したトグルの結果を残す
        let resumed = self.cache.session_generation() == generation
            && self.cache.current_user().as_ref() == Some(&user_id);
        let preserve = if resumed {
            self.in_flight.changed_since(&snapshot)
        } else {
            HashSet::new()
        };

        self.cache.sign_in(user_id.clone());
        self.cache
            .replace_session(&seeded, &counts, &membership, &preserve);
        self.projection.rebuild(&rows);
        // 確定済みのトグルは取得した行より新しい。実行中のものは確定時に反映される
        for &(item_id, kind) in &preserve {
            if !self.in_flight.contains(&(item_id, kind)) {
                self.projection
                    .reconcile(item_id, self.cache.get_membership(item_id), Utc::now());
            }
        }

        info!(
            user_id = %user_id,
            items = seeded.len(),
            membership_rows = rows.len(),
            stale = stale_items.len(),
            "session started"
        );

        Ok(SessionSummary {
            user_id,
            seeded_items: seeded.len(),
            membership_rows: rows.len(),
            stale_items,
        })
    }

    /// ログアウト。キャッシュと一覧を空にする。
    pub fn end(&self) {
        self.cache.reset();
        self.projection.clear();
        info!("session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::interaction_gateway::mocks::MockGateway;
    use crate::domain::entities::{MembershipRow, ProjectionFilter};
    use crate::domain::value_objects::{CountKind, MembershipKind};
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn bob() -> UserId {
        UserId::new("bob").unwrap()
    }

    fn service(gateway: MockGateway) -> (SessionService, InteractionCache, FavoritesProjection) {
        let cache = InteractionCache::default();
        let projection = FavoritesProjection::new();
        let service = SessionService::new(
            cache.clone(),
            projection.clone(),
            Arc::new(gateway),
            InFlightRegistry::new(),
        );
        (service, cache, projection)
    }

    #[tokio::test]
    async fn start_seeds_cache_and_projection() {
        let liked_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut gateway = MockGateway::new();
        gateway
            .expect_fetch_membership_batch()
            .with(eq(bob()))
            .times(1)
            .returning(move |_| {
                Ok(vec![
                    MembershipRow::new(ItemId::new(2), MembershipKind::Liked, liked_at),
                    MembershipRow::new(ItemId::new(9), MembershipKind::Favorited, liked_at),
                ])
            });
        gateway
            .expect_fetch_counts()
            .times(3)
            .returning(|id| Ok(InteractionCounts::new(id.value() as u64, 1, 0)));
        let (service, cache, projection) = service(gateway);

        let summary = service
            .start(bob(), &[ItemId::new(1), ItemId::new(2), ItemId::new(1)])
            .await
            .expect("session starts");

        assert_eq!(summary.seeded_items, 3);
        assert_eq!(summary.membership_rows, 2);
        assert!(summary.stale_items.is_empty());
        assert_eq!(cache.current_user(), Some(bob()));
        assert!(cache.get_membership(ItemId::new(2)).is_liked);
        assert!(cache.get_membership(ItemId::new(9)).is_favorited);
        assert_eq!(cache.get_counts(ItemId::new(9)).likes, 9);
        assert_eq!(projection.list(ProjectionFilter::All).len(), 2);
    }

    #[tokio::test]
    async fn membership_failure_leaves_cache_anonymous() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_fetch_membership_batch()
            .returning(|_| Err(AppError::Network("unreachable".to_string())));
        let (service, cache, projection) = service(gateway);
        cache.sign_in(UserId::new("previous").unwrap());
        cache.set_count(ItemId::new(1), CountKind::Likes, 4);
        projection.upsert(ItemId::new(1), true, false, Utc::now());

        let result = service.start(bob(), &[ItemId::new(1)]).await;

        assert_eq!(result, Err(AppError::Network("unreachable".to_string())));
        assert!(!cache.is_authenticated());
        assert!(cache.is_empty());
        assert!(projection.is_empty());
    }

    #[tokio::test]
    async fn failed_count_fetch_keeps_cached_value() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_fetch_membership_batch()
            .returning(|_| Ok(Vec::new()));
        gateway
            .expect_fetch_counts()
            .with(eq(ItemId::new(1)))
            .returning(|_| Err(AppError::Timeout("slow".to_string())));
        gateway
            .expect_fetch_counts()
            .with(eq(ItemId::new(2)))
            .returning(|_| Ok(InteractionCounts::new(5, 0, 1)));
        let (service, cache, _projection) = service(gateway);
        cache.set_count(ItemId::new(1), CountKind::Likes, 7);

        let summary = service
            .start(bob(), &[ItemId::new(1), ItemId::new(2)])
            .await
            .unwrap();

        assert_eq!(summary.stale_items, vec![ItemId::new(1)]);
        assert_eq!(cache.get_counts(ItemId::new(1)).likes, 7);
        assert_eq!(cache.get_counts(ItemId::new(2)), InteractionCounts::new(5, 0, 1));
    }

    #[tokio::test]
    async fn restart_drops_membership_removed_on_server() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut sequence = Sequence::new();
        let mut gateway = MockGateway::new();
        gateway
            .expect_fetch_membership_batch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_| {
                Ok(vec![
                    MembershipRow::new(ItemId::new(1), MembershipKind::Liked, at),
                    MembershipRow::new(ItemId::new(5), MembershipKind::Favorited, at),
                ])
            });
        gateway
            .expect_fetch_membership_batch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_| {
                Ok(vec![MembershipRow::new(
                    ItemId::new(1),
                    MembershipKind::Liked,
                    at,
                )])
            });
        gateway
            .expect_fetch_counts()
            .returning(|_| Ok(InteractionCounts::default()));
        let (service, cache, projection) = service(gateway);

        service.start(bob(), &[ItemId::new(1)]).await.unwrap();
        assert!(cache.get_membership(ItemId::new(5)).is_favorited);

        service.start(bob(), &[ItemId::new(1)]).await.unwrap();

        assert!(!cache.get_membership(ItemId::new(5)).is_favorited);
        assert!(!projection.contains(ItemId::new(5)));
        assert!(cache.get_membership(ItemId::new(1)).is_liked);
        assert!(projection.contains(ItemId::new(1)));
    }

    #[tokio::test]
    async fn end_clears_everything() {
        let (service, cache, projection) = service(MockGateway::new());
        cache.sign_in(bob());
        cache.set_membership(ItemId::new(3), MembershipKind::Liked, true);
        projection.upsert(ItemId::new(3), true, false, Utc::now());

        service.end();

        assert!(cache.current_user().is_none());
        assert!(!cache.get_membership(ItemId::new(3)).is_liked);
        assert!(projection.is_empty());
    }
}
