//! Exploration scoring by room category, feeding the reward multiplier.

use serde::{Deserialize, Serialize};

use crate::types::RoomKind;

const MULTIPLIER_STEP: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomCategory {
    Safe,
    Dangerous,
    Boss,
}

impl RoomCategory {
    pub fn of(kind: RoomKind) -> Self {
        match kind {
            RoomKind::Combat | RoomKind::Event | RoomKind::Trap => Self::Dangerous,
            RoomKind::Boss => Self::Boss,
            // Start, altar, merchant, chest, and anything unrecognized
            // count as safe ground.
            _ => Self::Safe,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Self::Safe => 1,
            Self::Dangerous => 2,
            Self::Boss => 3,
        }
    }
}

/// Accumulated exploration score. `current` always equals the sum of the
/// three sub-totals, and every field only grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationPoints {
    current: u32,
    from_safe: u32,
    from_dangerous: u32,
    from_boss: u32,
}

impl ExplorationPoints {
    pub fn from_saved(
        current: u32,
        from_safe: u32,
        from_dangerous: u32,
        from_boss: u32,
    ) -> Option<Self> {
        if current != from_safe + from_dangerous + from_boss {
            return None;
        }
        Some(Self { current, from_safe, from_dangerous, from_boss })
    }

    #[must_use]
    pub fn add_points(self, kind: RoomKind) -> Self {
        let category = RoomCategory::of(kind);
        let points = category.points();
        let mut next = self;
        next.current += points;
        match category {
            RoomCategory::Safe => next.from_safe += points,
            RoomCategory::Dangerous => next.from_dangerous += points,
            RoomCategory::Boss => next.from_boss += points,
        }
        next
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn from_safe(&self) -> u32 {
        self.from_safe
    }

    pub fn from_dangerous(&self) -> u32 {
        self.from_dangerous
    }

    pub fn from_boss(&self) -> u32 {
        self.from_boss
    }

    /// Additive reward multiplier earned by exploration. Uncapped.
    pub fn multiplier(&self) -> f64 {
        1.0 + f64::from(self.current) * MULTIPLIER_STEP
    }

    pub fn rank(&self) -> Rank {
        match self.current {
            score if score >= 20 => Rank::Master,
            score if score >= 15 => Rank::Veteran,
            score if score >= 10 => Rank::Explorer,
            _ => Rank::Novice,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Novice,
    Explorer,
    Veteran,
    Master,
}

impl Rank {
    pub fn label(self) -> &'static str {
        match self {
            Self::Novice => "novice",
            Self::Explorer => "explorer",
            Self::Veteran => "veteran",
            Self::Master => "master",
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn category_mapping_matches_the_scoring_table() {
        assert_eq!(RoomCategory::of(RoomKind::Start), RoomCategory::Safe);
        assert_eq!(RoomCategory::of(RoomKind::Altar), RoomCategory::Safe);
        assert_eq!(RoomCategory::of(RoomKind::Merchant), RoomCategory::Safe);
        assert_eq!(RoomCategory::of(RoomKind::Chest), RoomCategory::Safe);
        assert_eq!(RoomCategory::of(RoomKind::Gate), RoomCategory::Safe);
        assert_eq!(RoomCategory::of(RoomKind::Combat), RoomCategory::Dangerous);
        assert_eq!(RoomCategory::of(RoomKind::Event), RoomCategory::Dangerous);
        assert_eq!(RoomCategory::of(RoomKind::Trap), RoomCategory::Dangerous);
        assert_eq!(RoomCategory::of(RoomKind::Boss), RoomCategory::Boss);
    }

    #[test]
    fn mixed_visits_hit_the_explorer_scenario() {
        // Three safe rooms, two dangerous rooms, one boss: 3 + 4 + 3 = 10.
        let points = ExplorationPoints::default()
            .add_points(RoomKind::Start)
            .add_points(RoomKind::Chest)
            .add_points(RoomKind::Altar)
            .add_points(RoomKind::Combat)
            .add_points(RoomKind::Trap)
            .add_points(RoomKind::Boss);

        assert_eq!(points.current(), 10);
        assert_eq!(points.from_safe(), 3);
        assert_eq!(points.from_dangerous(), 4);
        assert_eq!(points.from_boss(), 3);
        assert!((points.multiplier() - 1.5).abs() < 1e-9);
        assert_eq!(points.rank(), Rank::Explorer);
    }

    #[test]
    fn rank_thresholds_are_inclusive_lower_bounds() {
        let mut points = ExplorationPoints::default();
        assert_eq!(points.rank(), Rank::Novice);
        for _ in 0..5 {
            points = points.add_points(RoomKind::Combat);
        }
        assert_eq!(points.current(), 10);
        assert_eq!(points.rank(), Rank::Explorer);

        for _ in 0..2 {
            points = points.add_points(RoomKind::Combat);
        }
        assert_eq!(points.current(), 14);
        assert_eq!(points.rank(), Rank::Explorer);
        points = points.add_points(RoomKind::Chest);
        assert_eq!(points.current(), 15);
        assert_eq!(points.rank(), Rank::Veteran);

        for _ in 0..5 {
            points = points.add_points(RoomKind::Chest);
        }
        assert_eq!(points.current(), 20);
        assert_eq!(points.rank(), Rank::Master);
    }

    #[test]
    fn inconsistent_saved_totals_are_rejected() {
        assert!(ExplorationPoints::from_saved(10, 3, 4, 3).is_some());
        assert!(ExplorationPoints::from_saved(10, 3, 4, 2).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]
        #[test]
        fn sub_totals_always_sum_to_current(kinds in proptest::collection::vec(0_u8..9, 0..128)) {
            let all = [
                RoomKind::Start,
                RoomKind::Combat,
                RoomKind::Boss,
                RoomKind::Gate,
                RoomKind::Trap,
                RoomKind::Altar,
                RoomKind::Merchant,
                RoomKind::Chest,
                RoomKind::Event,
            ];
            let mut points = ExplorationPoints::default();
            let mut previous = 0;
            for pick in kinds {
                points = points.add_points(all[pick as usize]);
                prop_assert_eq!(
                    points.current(),
                    points.from_safe() + points.from_dangerous() + points.from_boss()
                );
                prop_assert!(points.current() >= previous);
                previous = points.current();
            }
        }
    }
}
