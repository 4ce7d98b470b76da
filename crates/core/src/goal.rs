//! Run objective progress tracking and boss-gate admission.

use serde::{Deserialize, Serialize};

use crate::content;
use crate::types::RoomKind;

/// The run's single objective. Progress only moves forward; `completed`
/// latches once `current` reaches `required`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub kind: String,
    pub description: String,
    pub required: u32,
    pub current: u32,
    pub completed: bool,
}

impl Goal {
    pub fn new(kind: &str) -> Option<Self> {
        content::goal_by_kind(kind).map(|spec| Self {
            kind: spec.kind.to_string(),
            description: spec.description.to_string(),
            required: spec.required,
            current: 0,
            completed: false,
        })
    }

    /// Advance progress, clamped at `required`. Never decreases.
    #[must_use]
    pub fn advanced(&self, increment: u32) -> Self {
        let current = (self.current + increment).min(self.required);
        Self {
            kind: self.kind.clone(),
            description: self.description.clone(),
            required: self.required,
            current,
            completed: self.completed || current >= self.required,
        }
    }

    /// Boss and gate rooms open only once the objective is met; every other
    /// kind is always enterable.
    pub fn can_enter(&self, kind: RoomKind) -> bool {
        match kind {
            RoomKind::Boss | RoomKind::Gate => self.completed,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::keys;

    #[test]
    fn unknown_kind_yields_no_goal() {
        assert!(Goal::new("polish_the_silverware").is_none());
    }

    #[test]
    fn progress_clamps_at_required_and_latches_completed() {
        let goal = Goal::new(keys::GOAL_COLLECT_SHARDS).expect("goal");
        assert_eq!(goal.required, 3);

        let goal = goal.advanced(2);
        assert_eq!(goal.current, 2);
        assert!(!goal.completed);

        let goal = goal.advanced(5);
        assert_eq!(goal.current, 3);
        assert!(goal.completed);

        // Latched even if the clamp keeps current pinned.
        let goal = goal.advanced(1);
        assert_eq!(goal.current, 3);
        assert!(goal.completed);
    }

    #[test]
    fn progress_never_decreases_across_arbitrary_increments() {
        let mut goal = Goal::new(keys::GOAL_SLAY_ELITES).expect("goal");
        let mut previous = goal.current;
        for increment in [0_u32, 1, 0, 3, 1] {
            goal = goal.advanced(increment);
            assert!(goal.current >= previous);
            previous = goal.current;
        }
    }

    #[test]
    fn boss_and_gate_rooms_wait_on_completion() {
        let goal = Goal::new(keys::GOAL_FIND_KEY).expect("goal");
        assert!(!goal.can_enter(RoomKind::Boss));
        assert!(!goal.can_enter(RoomKind::Gate));
        assert!(goal.can_enter(RoomKind::Combat));
        assert!(goal.can_enter(RoomKind::Merchant));

        let goal = goal.advanced(1);
        assert!(goal.can_enter(RoomKind::Boss));
        assert!(goal.can_enter(RoomKind::Gate));
    }
}
