#![allow(dead_code)]

use std::sync::Arc;

use reaction_rush::game::{Catalog, Game, Icon, PostTemplate, Tier};
use reaction_rush::GameConfig;
use reaction_rush::Millis;

pub fn fixture_catalog() -> Arc<Catalog> {
    let ids = [
        "wolf", "moon", "shock", "party", "fire", "sleep", "crying", "brain", "sock", "basket",
        "butter", "skull",
    ];
    let icons = ids.iter().map(|id| Icon::new(*id, *id, format!("{id}.png"))).collect();

    let templates = vec![
        PostTemplate::new("I feel like howling at the moon")
            .with_tier(Tier::Perfect, ["wolf"])
            .with_tier(Tier::Correct, ["moon", "shock"])
            .with_tier(Tier::Neutral, ["fire"])
            .with_tier(Tier::Wrong, ["crying", "brain"])
            .with_tier(Tier::Horrible, ["basket", "butter"]),
        PostTemplate::new("Finally friday!")
            .with_tier(Tier::Perfect, ["party"])
            .with_tier(Tier::Correct, ["fire", "moon"])
            .with_tier(Tier::Neutral, ["sleep"])
            .with_tier(Tier::Wrong, ["crying", "sock"])
            .with_tier(Tier::Horrible, ["skull", "butter"]),
        PostTemplate::new("Up all night studying")
            .with_tier(Tier::Perfect, ["brain"])
            .with_tier(Tier::Correct, ["sleep", "moon"])
            .with_tier(Tier::Neutral, ["sock"])
            .with_tier(Tier::Wrong, ["party", "wolf"])
            .with_tier(Tier::Horrible, ["skull", "basket"]),
    ];

    Arc::new(Catalog::new(icons, templates).unwrap())
}

pub fn fixture_game(seed: u64) -> Game {
    Game::new(fixture_catalog(), GameConfig::default(), seed).unwrap()
}

/// Slot of the best-tier icon on offer among `tiers`, in preference order.
pub fn slot_for(game: &Game, tiers: &[Tier]) -> Option<usize> {
    let round = game.current_round()?;
    tiers.iter().find_map(|tier| {
        round
            .choices
            .iter()
            .position(|icon| round.template.classify(&icon.id) == Some(*tier))
    })
}

/// Icon id of the given tier in the current template (need not be on offer).
pub fn template_icon(game: &Game, tier: Tier) -> Option<String> {
    game.current_round()?.template.tier_ids(tier).first().cloned()
}

/// Tick every 100ms from `from` (exclusive) until a new round starts.
pub fn tick_until_next_round(game: &mut Game, from: Millis) -> Millis {
    let round = game.run().rounds_seen;
    let mut now = from;
    while game.run().rounds_seen == round && game.run().is_active() {
        now += 100;
        game.tick(now);
    }
    now
}
