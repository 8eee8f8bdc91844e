use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

use flora_interactions::application::ports::{
    DeleteOutcome, InteractionGateway, InteractionTable, UpsertOutcome,
};
use flora_interactions::domain::entities::{
    Comment, InteractionCounts, MembershipRow, NewComment,
};
use flora_interactions::domain::value_objects::{CommentId, ItemId, MembershipKind, UserId};
use flora_interactions::shared::error::AppError;

type MembershipKey = (ItemId, UserId, MembershipKind);

#[derive(Default)]
struct Store {
    memberships: HashMap<MembershipKey, DateTime<Utc>>,
    comments: BTreeMap<CommentId, Comment>,
    next_comment_id: i64,
    ticks: i64,
}

impl Store {
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(self.ticks)
    }

    fn count(&self, item_id: ItemId, kind: MembershipKind) -> u64 {
        self.memberships
            .keys()
            .filter(|(item, _, k)| *item == item_id && *k == kind)
            .count() as u64
    }
}

struct PendingGate {
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<Option<AppError>>,
}

/// 書き込み 1 回分の一時停止ハンドル
pub struct WriteGate {
    entered: oneshot::Receiver<()>,
    release: oneshot::Sender<Option<AppError>>,
}

impl WriteGate {
    /// 書き込みがゲートウェイに到達するまで待つ
    pub async fn entered(&mut self) {
        (&mut self.entered).await.expect("gated write never started");
    }

    pub fn succeed(self) {
        let _ = self.release.send(None);
    }

    pub fn fail(self, error: AppError) {
        let _ = self.release.send(Some(error));
    }
}

/// メモリ上のデータストア。書き込みを止めたり失敗させたりできる。
#[derive(Default)]
pub struct ScriptedGateway {
    store: Mutex<Store>,
    gates: Mutex<VecDeque<PendingGate>>,
    failures: Mutex<VecDeque<AppError>>,
    write_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次のメンバーシップ書き込みを、返したゲートが解放されるまで止める
    pub fn hold_next_write(&self) -> WriteGate {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(PendingGate {
            entered: entered_tx,
            release: release_rx,
        });
        WriteGate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    pub fn fail_next_write(&self, error: AppError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn seed_membership(&self, item_id: ItemId, user_id: &UserId, kind: MembershipKind) {
        let mut store = self.store.lock().unwrap();
        let at = store.now();
        store
            .memberships
            .insert((item_id, user_id.clone(), kind), at);
    }

    pub fn has_membership(&self, item_id: ItemId, user_id: &UserId, kind: MembershipKind) -> bool {
        self.store
            .lock()
            .unwrap()
            .memberships
            .contains_key(&(item_id, user_id.clone(), kind))
    }

    async fn gated_write(&self) -> Result<(), AppError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            if let Ok(Some(error)) = gate.release.await {
                return Err(error);
            }
        }
        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InteractionGateway for ScriptedGateway {
    async fn fetch_counts(&self, item_id: ItemId) -> Result<InteractionCounts, AppError> {
        let store = self.store.lock().unwrap();
        let comments = store
            .comments
            .values()
            .filter(|comment| comment.item_id == item_id)
            .count() as u64;
        Ok(InteractionCounts::new(
            store.count(item_id, MembershipKind::Liked),
            store.count(item_id, MembershipKind::Favorited),
            comments,
        ))
    }

    async fn fetch_membership_batch(&self, user_id: &UserId) -> Result<Vec<MembershipRow>, AppError> {
        let store = self.store.lock().unwrap();
        let mut rows: Vec<MembershipRow> = store
            .memberships
            .iter()
            .filter(|((_, user, _), _)| user == user_id)
            .map(|((item, _, kind), at)| MembershipRow::new(*item, *kind, *at))
            .collect();
        rows.sort_by_key(|row| (row.item_id, row.kind));
        Ok(rows)
    }

    async fn upsert_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<UpsertOutcome, AppError> {
        self.gated_write().await?;
        let mut store = self.store.lock().unwrap();
        let key = (item_id, user_id.clone(), kind);
        if store.memberships.contains_key(&key) {
            return Ok(UpsertOutcome::AlreadyExists);
        }
        let at = store.now();
        store.memberships.insert(key, at);
        Ok(UpsertOutcome::Inserted)
    }

    async fn delete_membership(
        &self,
        item_id: ItemId,
        user_id: &UserId,
        kind: MembershipKind,
    ) -> Result<DeleteOutcome, AppError> {
        self.gated_write().await?;
        let mut store = self.store.lock().unwrap();
        match store.memberships.remove(&(item_id, user_id.clone(), kind)) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::AlreadyAbsent),
        }
    }

    async fn count_rows(&self, table: InteractionTable, item_id: ItemId) -> Result<u64, AppError> {
        let counts = self.fetch_counts(item_id).await?;
        Ok(match table {
            InteractionTable::Likes => counts.likes,
            InteractionTable::Favorites => counts.favorites,
            InteractionTable::Comments => counts.comments,
        })
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, AppError> {
        let mut store = self.store.lock().unwrap();
        store.next_comment_id += 1;
        let stored = Comment {
            id: CommentId::new(store.next_comment_id),
            item_id: comment.item_id,
            author: comment.author.clone(),
            content: comment.content.clone(),
            created_at: store.now(),
        };
        store.comments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_comment(&self, comment_id: CommentId) -> Result<Option<Comment>, AppError> {
        Ok(self.store.lock().unwrap().comments.get(&comment_id).cloned())
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<DeleteOutcome, AppError> {
        match self.store.lock().unwrap().comments.remove(&comment_id) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::AlreadyAbsent),
        }
    }

    async fn list_comments(&self, item_id: ItemId) -> Result<Vec<Comment>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .comments
            .values()
            .rev()
            .filter(|comment| comment.item_id == item_id)
            .cloned()
            .collect())
    }
}
