//! Icon Choice Builder
//!
//! Builds the six icons offered for a post: a weighted mix across the five
//! tiers, topped up with random catalog icons when tiers run short, then
//! shuffled so slot position says nothing about tier.

use crate::core::rng::DeterministicRng;
use crate::game::catalog::{Catalog, Icon, PostTemplate, Tier};

/// Number of icons offered each round.
pub const CHOICE_COUNT: usize = 6;

/// Chance (percent) that a Perfect icon is offered.
const PERFECT_CHANCE_PERCENT: u32 = 30;

/// Chance (percent) that only one Correct icon is offered instead of two.
const SINGLE_CORRECT_CHANCE_PERCENT: u32 = 50;

/// Per-tier draw counts for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierMix {
    /// Perfect icons (0 or 1)
    pub perfect: usize,
    /// Correct icons (1 or 2)
    pub correct: usize,
    /// Neutral icons (0 or 1)
    pub neutral: usize,
    /// Wrong icons
    pub wrong: usize,
    /// Horrible icons
    pub horrible: usize,
}

impl TierMix {
    /// Roll a mix. Wrong/Horrible split the remaining slots, Horrible
    /// taking the odd one.
    pub fn roll(rng: &mut DeterministicRng) -> Self {
        let perfect = usize::from(rng.next_bool(PERFECT_CHANCE_PERCENT));
        let correct = if rng.next_bool(SINGLE_CORRECT_CHANCE_PERCENT) { 1 } else { 2 };
        let neutral = rng.next_int(2) as usize;

        let remaining = CHOICE_COUNT - perfect - correct - neutral;
        let wrong = remaining / 2;
        let horrible = remaining - wrong;

        Self { perfect, correct, neutral, wrong, horrible }
    }

    /// Count for a tier.
    pub fn count(&self, tier: Tier) -> usize {
        match tier {
            Tier::Perfect => self.perfect,
            Tier::Correct => self.correct,
            Tier::Neutral => self.neutral,
            Tier::Wrong => self.wrong,
            Tier::Horrible => self.horrible,
        }
    }
}

/// Build exactly [`CHOICE_COUNT`] distinct icons for a template.
///
/// Unresolvable ids are dropped; any shortfall is filled uniformly from the
/// rest of the catalog. The catalog guarantees at least six icons.
pub fn build_choices(
    template: &PostTemplate,
    catalog: &Catalog,
    rng: &mut DeterministicRng,
) -> Vec<Icon> {
    let mix = TierMix::roll(rng);
    build_choices_with_mix(template, catalog, mix, rng)
}

/// Build choices for a pre-rolled mix.
pub fn build_choices_with_mix(
    template: &PostTemplate,
    catalog: &Catalog,
    mix: TierMix,
    rng: &mut DeterministicRng,
) -> Vec<Icon> {
    let mut chosen: Vec<Icon> = Vec::with_capacity(CHOICE_COUNT);

    for tier in Tier::ALL {
        draw_tier(template.tier_ids(tier), mix.count(tier), catalog, rng, &mut chosen);
    }

    if chosen.len() < CHOICE_COUNT {
        fill_from_catalog(catalog, rng, &mut chosen);
    }

    rng.shuffle(&mut chosen);
    chosen
}

/// Shuffle a tier's ids, keep the first `count`, resolve them.
fn draw_tier(
    ids: &[String],
    count: usize,
    catalog: &Catalog,
    rng: &mut DeterministicRng,
    chosen: &mut Vec<Icon>,
) {
    if count == 0 || ids.is_empty() {
        return;
    }

    let mut order: Vec<&String> = ids.iter().collect();
    rng.shuffle(&mut order);

    for id in order.into_iter().take(count) {
        // Same id in two tiers must not produce a duplicate choice
        if chosen.iter().any(|icon| &icon.id == id) {
            continue;
        }
        if let Some(icon) = catalog.icon(id) {
            chosen.push(icon.clone());
        }
    }
}

/// Top up with random catalog icons not already chosen.
fn fill_from_catalog(catalog: &Catalog, rng: &mut DeterministicRng, chosen: &mut Vec<Icon>) {
    let mut available: Vec<&Icon> = catalog
        .icons()
        .iter()
        .filter(|icon| !chosen.iter().any(|c| c.id == icon.id))
        .collect();
    rng.shuffle(&mut available);

    let needed = CHOICE_COUNT.saturating_sub(chosen.len());
    chosen.extend(available.into_iter().take(needed).cloned());
}
