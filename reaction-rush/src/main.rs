//! Reaction Rush Demo
//!
//! Plays one run with an autoplay bot on a simulated clock, then replays
//! the recorded transcript and checks the final state hash.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use reaction_rush::{
    derive_run_seed, new_run_id, Catalog, GameConfig, LaunchOptions, Millis, VERSION,
    core::{clock::format_run_time, rng::fresh_entropy},
    game::{
        catalog::Tier,
        engine::{Game, StepResult},
        events::GameEventData,
        input::PlayerInput,
        timer::TIMER_TICK_MS,
    },
    presentation::{LogBridge, Session},
    replay::{verify_transcript, RunMetadata, RunTranscript},
};

/// Give up on a run that has not finished after this long.
const DEMO_LIMIT_MS: Millis = 15 * 60 * 1000;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Reaction Rush v{}", VERSION);

    let options = LaunchOptions::from_env();
    let config = GameConfig::from_env();
    config.validate().context("invalid game configuration")?;

    let catalog = match &options.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin().context("built-in catalog is invalid")?,
    };
    info!("Catalog: {} icons, {} posts", catalog.icons().len(), catalog.template_count());
    let catalog = Arc::new(catalog);

    let run_id = new_run_id();
    let seed = options.seed.unwrap_or_else(|| derive_run_seed(&run_id, fresh_entropy()));
    info!("Run ID: {}", hex::encode(run_id));
    info!("RNG Seed: {}", seed);

    let transcript = demo_run(catalog.clone(), config.clone(), run_id, seed)?;

    info!("=== Verifying Determinism ===");
    let bytes = transcript.to_bytes()?;
    info!("Transcript: {} inputs, {} bytes", transcript.inputs.len(), bytes.len());

    let decoded = RunTranscript::from_bytes(&bytes)?;
    let result = verify_transcript(catalog, config, &decoded)?;
    info!("Replay State Hash: {}", hex::encode(result.computed_final_hash));

    if !result.valid {
        bail!("determinism failure: {:?}", result.error);
    }
    info!("DETERMINISM VERIFIED: {} checkpoints match", result.checkpoints_checked);
    Ok(())
}

/// Seeded bot: mostly picks a good icon after a human-ish delay.
struct Bot {
    rng: StdRng,
}

impl Bot {
    fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Decide when (and which slot) to answer a fresh round, or sit it out.
    fn plan(&mut self, game: &Game, now: Millis) -> Option<(Millis, usize)> {
        let round = game.current_round()?;

        if self.rng.gen_bool(0.05) {
            return None;
        }

        let latency: Millis = self.rng.gen_range(350..2_800);
        let slot = if self.rng.gen_bool(0.8) {
            let best = [Tier::Perfect, Tier::Correct].into_iter().find_map(|tier| {
                round
                    .choices
                    .iter()
                    .position(|icon| round.template.classify(&icon.id) == Some(tier))
            });
            best.unwrap_or(0)
        } else {
            self.rng.gen_range(0..round.choices.len())
        };

        Some((now + latency, slot))
    }
}

fn demo_run(catalog: Arc<Catalog>, config: GameConfig, run_id: [u8; 16], seed: u64) -> Result<RunTranscript> {
    info!("=== Starting Demo Run ===");

    let game = Game::new(catalog, config.clone(), seed)?;
    let mut session = Session::new(game, LogBridge::new());
    let mut transcript = RunTranscript::new(RunMetadata::new(run_id, seed, &config));
    let mut bot = Bot::new(seed ^ 0x5EED);

    let mut apply = |session: &mut Session<LogBridge>, input: PlayerInput, now: Millis| -> StepResult {
        let step = session.apply(&input, now);
        transcript.record_step(&input, now, &step, session.game());
        step
    };

    let mut now: Millis = 0;
    let mut planned = None;

    let step = apply(&mut session, PlayerInput::Start, now);
    if started_round(&step) {
        planned = bot.plan(session.game(), now);
    }

    let mut finished = false;
    while now < DEMO_LIMIT_MS {
        now += TIMER_TICK_MS;

        if let Some((due, slot)) = planned {
            if now >= due {
                planned = None;
                let step = apply(&mut session, PlayerInput::Slot { index: slot }, now);
                if step.run_ended {
                    finished = true;
                    break;
                }
            }
        }

        let step = apply(&mut session, PlayerInput::Tick, now);
        for event in &step.events {
            if let GameEventData::ClockTick { elapsed_secs } = event.data {
                if elapsed_secs % 30 == 0 {
                    info!("Run clock {}", format_run_time(elapsed_secs * 1000));
                }
            }
        }
        if step.run_ended {
            finished = true;
            break;
        }
        if started_round(&step) {
            planned = bot.plan(session.game(), now);
        }
    }

    if !finished {
        warn!("Demo stopped after {} without finishing", format_run_time(now));
    }

    let (game, _) = session.into_parts();
    transcript.finalize(&game);
    info!("Final State Hash: {}", hex::encode(game.compute_hash()));

    Ok(transcript)
}

fn started_round(step: &StepResult) -> bool {
    step.events.iter().any(|e| matches!(e.data, GameEventData::RoundStarted { .. }))
}
