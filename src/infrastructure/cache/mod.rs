pub mod favorites_projection;
pub mod interaction_cache;

pub use favorites_projection::FavoritesProjection;
pub use interaction_cache::{
    InteractionCache, ItemChangedCallback, MembershipChange, SubscriptionId,
};
