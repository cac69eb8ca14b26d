mod common;

use common::{fixture_game, template_icon, tick_until_next_round};
use reaction_rush::game::{Category, Game, GameEventData, Phase, Tier};
use reaction_rush::{GameConfig, Millis};

fn deltas(game_events: &[reaction_rush::GameEvent]) -> Vec<Category> {
    game_events.iter().filter_map(|e| e.delta()).map(|d| d.category).collect()
}

fn round_duration(game: &Game) -> Millis {
    game.run().timer.duration_ms().unwrap()
}

#[test]
fn test_expiry_then_pick_same_instant() {
    let mut game = fixture_game(10);
    game.start(0);
    let deadline = round_duration(&game);
    let perfect = template_icon(&game, Tier::Perfect).unwrap();

    let expired = game.tick(deadline);
    let late_pick = game.submit_choice(&perfect, deadline);

    assert_eq!(deltas(&expired.events), vec![Category::Timeout]);
    assert!(late_pick.is_empty());
    assert_eq!(game.run().score, -2);
    assert_eq!(game.run().counts.total(), 1);
}

#[test]
fn test_pick_then_expiry_same_instant() {
    let mut game = fixture_game(11);
    game.start(0);
    let deadline = round_duration(&game);
    let perfect = template_icon(&game, Tier::Perfect).unwrap();

    let pick = game.submit_choice(&perfect, deadline);
    let expiry = game.tick(deadline);

    assert_eq!(deltas(&pick.events), vec![Category::Perfect]);
    assert!(deltas(&expiry.events).is_empty());
    assert_eq!(game.run().score, 5);
}

#[test]
fn test_late_poll_scores_one_timeout() {
    let mut game = fixture_game(12);
    game.start(0);

    let step = game.tick(600_000);
    assert_eq!(deltas(&step.events), vec![Category::Timeout]);
    // Next round is scheduled relative to the poll that saw the expiry
    assert_eq!(game.run().pending_advance.map(|p| p.due_at), Some(600_800));
    assert_eq!(game.run().rounds_seen, 1);
}

#[test]
fn test_picks_between_rounds_are_ignored() {
    let mut game = fixture_game(13);
    game.start(0);
    game.submit_slot(0, 400);

    for t in [450, 500, 999] {
        assert!(game.submit_slot(1, t).is_empty());
        assert!(game.submit_choice("wolf", t).is_empty());
    }
    assert_eq!(game.run().counts.total(), 1);
}

#[test]
fn test_double_start_keeps_one_timer() {
    let mut game = fixture_game(14);
    game.start(0);
    game.start(5_000);

    let deadline = round_duration(&game);
    let step = game.tick(deadline);
    assert_eq!(deltas(&step.events), vec![Category::Timeout]);
    assert_eq!(game.run().started_at, 0);
}

#[test]
fn test_stale_callbacks_after_menu() {
    let mut game = fixture_game(15);
    game.start(0);
    let perfect = template_icon(&game, Tier::Perfect).unwrap();
    game.back_to_menu(100);

    assert!(game.submit_choice(&perfect, 150).is_empty());
    assert!(game.submit_slot(0, 150).is_empty());
    assert!(game.tick(50_000).is_empty());
    assert_eq!(game.run().counts.total(), 0);
}

#[test]
fn test_stale_callbacks_after_loss() {
    let mut config = GameConfig::default();
    config.rules.lose_floor = -2;
    let mut game = Game::new(common::fixture_catalog(), config, 16).unwrap();

    game.start(0);
    let deadline = round_duration(&game);
    let step = game.tick(deadline);
    assert!(step.run_ended);
    assert_eq!(game.phase(), Phase::Lost);

    assert!(game.submit_slot(0, deadline + 1).is_empty());
    assert!(game.tick(deadline + 5_000).is_empty());
    assert_eq!(game.run().counts.timeout, 1);
}

#[test]
fn test_exactly_one_resolution_per_round() {
    let mut game = fixture_game(17);
    let mut now = 0;
    game.start(now);

    // Alternate between beating the clock and losing to it
    let rounds = 12;
    for round in 0..rounds {
        let deadline = now + round_duration(&game);
        let mut resolved = 0;
        if round % 2 == 0 {
            resolved += deltas(&game.submit_slot(round % 6, deadline - 1).events).len();
            resolved += deltas(&game.tick(deadline).events).len();
        } else {
            resolved += deltas(&game.tick(deadline).events).len();
            resolved += deltas(&game.submit_slot(round % 6, deadline).events).len();
        }
        assert_eq!(resolved, 1, "round {}", round + 1);

        if !game.run().is_active() || round + 1 == rounds {
            break;
        }
        now = tick_until_next_round(&mut game, deadline);
    }

    // The last round seen is resolved; no extra round was started
    assert!(game.current_round().map_or(true, |r| r.resolved));
    assert_eq!(game.run().counts.total(), game.run().rounds_seen);
}

#[test]
fn test_round_started_only_after_pending_advance() {
    let mut game = fixture_game(18);
    game.start(0);
    game.submit_slot(2, 1_000);

    let early = game.tick(1_500);
    assert!(!early.events.iter().any(|e| matches!(e.data, GameEventData::RoundStarted { .. })));
    let due = game.tick(1_600);
    assert!(due.events.iter().any(|e| matches!(e.data, GameEventData::RoundStarted { .. })));
}
