use crate::domain::value_objects::CountKind;
use serde::{Deserialize, Serialize};

/// 植物ごとのいいね・お気に入り・コメント数。
///
/// 値は常に 0 以上で、更新は [`InteractionCounts::set`] と
/// [`InteractionCounts::apply_delta`] を通じてクランプされる。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounts {
    pub likes: u64,
    pub favorites: u64,
    pub comments: u64,
}

impl InteractionCounts {
    pub fn new(likes: u64, favorites: u64, comments: u64) -> Self {
        Self {
            likes,
            favorites,
            comments,
        }
    }

    pub fn get(&self, kind: CountKind) -> u64 {
        match kind {
            CountKind::Likes => self.likes,
            CountKind::Favorites => self.favorites,
            CountKind::Comments => self.comments,
        }
    }

    fn slot_mut(&mut self, kind: CountKind) -> &mut u64 {
        match kind {
            CountKind::Likes => &mut self.likes,
            CountKind::Favorites => &mut self.favorites,
            CountKind::Comments => &mut self.comments,
        }
    }

    /// 負の値は 0 にクランプする。値が変化した場合のみ true を返す。
    pub fn set(&mut self, kind: CountKind, value: i64) -> bool {
        let clamped = u64::try_from(value).unwrap_or(0);
        let slot = self.slot_mut(kind);
        if *slot == clamped {
            return false;
        }
        *slot = clamped;
        true
    }

    /// 相対更新。クランプ後に実際に適用された差分を返す。
    pub fn apply_delta(&mut self, kind: CountKind, delta: i64) -> i64 {
        let slot = self.slot_mut(kind);
        let before = *slot;
        let after = if delta >= 0 {
            before.saturating_add(delta.unsigned_abs())
        } else {
            before.saturating_sub(delta.unsigned_abs())
        };
        *slot = after;
        if after >= before {
            i64::try_from(after - before).unwrap_or(i64::MAX)
        } else {
            -i64::try_from(before - after).unwrap_or(i64::MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_negative_values() {
        let mut counts = InteractionCounts::new(3, 0, 0);
        assert!(counts.set(CountKind::Likes, -5));
        assert_eq!(counts.likes, 0);
    }

    #[test]
    fn set_reports_unchanged_value() {
        let mut counts = InteractionCounts::new(3, 0, 0);
        assert!(!counts.set(CountKind::Likes, 3));
    }

    #[test]
    fn apply_delta_returns_clamped_difference() {
        let mut counts = InteractionCounts::new(0, 1, 0);
        assert_eq!(counts.apply_delta(CountKind::Likes, -1), 0);
        assert_eq!(counts.apply_delta(CountKind::Favorites, -3), -1);
        assert_eq!(counts.apply_delta(CountKind::Comments, 2), 2);
        assert_eq!(counts, InteractionCounts::new(0, 0, 2));
    }
}
