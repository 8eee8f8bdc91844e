pub mod entities;
pub mod value_objects;

pub use entities::{
    Comment, FavoriteEntry, InteractionCounts, ItemMembership, MembershipRow, ProjectionFilter,
    UserMembership,
};
pub use value_objects::{CommentId, CountKind, ItemId, MembershipKind, UserId};
