//! Affix selection and the value-effect pipeline.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

use crate::content::{AFFIXES, Affix, AffixContext, AffixEffect};
use crate::types::Polarity;

/// Select `count` affixes for a run, deterministically for a fixed seed.
///
/// Polarity balancing: half the slots (rounded down) are filled with
/// negative entries first, the rest preferentially with positive entries,
/// then backfilled with whatever remains until `count` is reached or the
/// catalog runs out. Asking for more than the catalog holds returns the
/// whole catalog.
pub fn select_affixes(count: usize, seed: u64) -> Vec<&'static Affix> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut negatives: Vec<&'static Affix> =
        AFFIXES.iter().filter(|affix| affix.polarity == Polarity::Negative).collect();
    let mut positives: Vec<&'static Affix> =
        AFFIXES.iter().filter(|affix| affix.polarity == Polarity::Positive).collect();
    shuffle(&mut negatives, &mut rng);
    shuffle(&mut positives, &mut rng);

    let negative_quota = (count / 2).min(negatives.len());
    let mut selected: Vec<&'static Affix> = negatives.drain(..negative_quota).collect();

    while selected.len() < count && !positives.is_empty() {
        selected.push(positives.remove(0));
    }
    while selected.len() < count && !negatives.is_empty() {
        selected.push(negatives.remove(0));
    }

    selected
}

/// Run `value` through every affix whose context matches, in list order.
/// Multiplier contexts stay float; use [`apply_affix_count`] where an
/// integer is expected.
pub fn apply_affix_effect(affixes: &[&Affix], context: AffixContext, value: f64) -> f64 {
    affixes.iter().fold(value, |current, affix| {
        if affix.context != context {
            return current;
        }
        match affix.effect {
            AffixEffect::Scale(factor) => current * factor,
            AffixEffect::Add(delta) => current + delta,
            AffixEffect::ExtraChestRoom => current,
        }
    })
}

/// Integer variant for resource and loot counts.
pub fn apply_affix_count(affixes: &[&Affix], context: AffixContext, value: i64) -> i64 {
    apply_affix_effect(affixes, context, value as f64).round() as i64
}

pub fn has_extra_chest_room(affixes: &[&Affix]) -> bool {
    affixes.iter().any(|affix| affix.effect == AffixEffect::ExtraChestRoom)
}

fn shuffle(items: &mut [&'static Affix], rng: &mut ChaCha8Rng) {
    for index in (1..items.len()).rev() {
        let other = rng.next_u64() as usize % (index + 1);
        items.swap(index, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::keys;

    #[test]
    fn selection_is_deterministic_for_a_fixed_seed() {
        let left: Vec<&str> = select_affixes(4, 909).iter().map(|a| a.kind).collect();
        let right: Vec<&str> = select_affixes(4, 909).iter().map(|a| a.kind).collect();
        assert_eq!(left, right);
        assert_eq!(left.len(), 4);
    }

    #[test]
    fn different_seeds_eventually_differ() {
        let picks: Vec<Vec<&str>> = (0..16)
            .map(|seed| select_affixes(4, seed).iter().map(|a| a.kind).collect())
            .collect();
        assert!(picks.iter().any(|pick| pick != &picks[0]));
    }

    #[test]
    fn half_the_slots_go_to_negative_affixes_first() {
        for seed in [1_u64, 7, 42, 1_000] {
            let selected = select_affixes(4, seed);
            let negatives =
                selected.iter().filter(|a| a.polarity == Polarity::Negative).count();
            assert!(negatives >= 2, "seed {seed} selected only {negatives} negatives");
        }
    }

    #[test]
    fn oversized_request_returns_the_whole_catalog() {
        let selected = select_affixes(AFFIXES.len() + 10, 5);
        assert_eq!(selected.len(), AFFIXES.len());
    }

    #[test]
    fn no_affix_is_selected_twice() {
        let selected = select_affixes(AFFIXES.len(), 3);
        let mut kinds: Vec<&str> = selected.iter().map(|a| a.kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), selected.len());
    }

    #[test]
    fn strong_enemies_raises_a_hundred_to_one_fifteen() {
        let affix = crate::content::affix_by_kind(keys::AFFIX_STRONG_ENEMIES).expect("affix");
        let value = apply_affix_effect(&[affix], AffixContext::EnemyStats, 100.0);
        assert!((value - 115.0).abs() < 1e-9);
    }

    #[test]
    fn non_matching_context_is_a_no_op() {
        let affix = crate::content::affix_by_kind(keys::AFFIX_STRONG_ENEMIES).expect("affix");
        let value = apply_affix_effect(&[affix], AffixContext::GoldReward, 100.0);
        assert!((value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn matching_affixes_compose_in_list_order() {
        let dim = crate::content::affix_by_kind(keys::AFFIX_DIM_TORCHES).expect("affix");
        let quartermaster =
            crate::content::affix_by_kind(keys::AFFIX_QUARTERMASTER).expect("affix");
        let value = apply_affix_count(&[dim, quartermaster], AffixContext::TorchCount, 6);
        assert_eq!(value, 6);
        let value = apply_affix_count(&[dim], AffixContext::TorchCount, 6);
        assert_eq!(value, 4);
    }
}
