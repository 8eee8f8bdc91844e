pub mod comment_id;
pub mod interaction_kind;
pub mod item_id;
pub mod user_id;

pub use comment_id::CommentId;
pub use interaction_kind::{CountKind, MembershipKind};
pub use item_id::ItemId;
pub use user_id::UserId;
