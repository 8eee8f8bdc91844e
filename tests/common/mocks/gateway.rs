use async_trait::async_trait;
use mockall::mock;

use flora_interactions::application::ports::{
    DeleteOutcome, InteractionGateway, InteractionTable, UpsertOutcome,
};
use flora_interactions::domain::entities::{
    Comment, InteractionCounts, MembershipRow, NewComment,
};
use flora_interactions::domain::value_objects::{CommentId, ItemId, MembershipKind, UserId};
use flora_interactions::shared::error::AppError;

mock! {
    pub InteractionGatewayPort {}

    #[async_trait]
    impl InteractionGateway for InteractionGatewayPort {
        async fn fetch_counts(&self, item_id: ItemId) -> Result<InteractionCounts, AppError>;
        async fn fetch_membership_batch(&self, user_id: &UserId) -> Result<Vec<MembershipRow>, AppError>;
        async fn upsert_membership(
            &self,
            item_id: ItemId,
            user_id: &UserId,
            kind: MembershipKind,
        ) -> Result<UpsertOutcome, AppError>;
        async fn delete_membership(
            &self,
            item_id: ItemId,
            user_id: &UserId,
            kind: MembershipKind,
        ) -> Result<DeleteOutcome, AppError>;
        async fn count_rows(&self, table: InteractionTable, item_id: ItemId) -> Result<u64, AppError>;
        async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, AppError>;
        async fn get_comment(&self, comment_id: CommentId) -> Result<Option<Comment>, AppError>;
        async fn delete_comment(&self, comment_id: CommentId) -> Result<DeleteOutcome, AppError>;
        async fn list_comments(&self, item_id: ItemId) -> Result<Vec<Comment>, AppError>;
    }
}
