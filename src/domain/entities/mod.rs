pub mod comment;
pub mod favorite_entry;
pub mod interaction_counts;
pub mod membership;
pub mod membership_row;

pub use comment::{Comment, NewComment};
pub use favorite_entry::{FavoriteEntry, ProjectionFilter};
pub use interaction_counts::InteractionCounts;
pub use membership::{ItemMembership, UserMembership};
pub use membership_row::MembershipRow;
