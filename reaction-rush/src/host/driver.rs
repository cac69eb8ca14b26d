//! Async Session Driver
//!
//! Runs a [`Session`] on a tokio task. A 100ms interval delivers ticks and
//! an mpsc channel delivers player commands; both are handled on the one
//! task, so round resolution is always serialized.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::env_parse;
use crate::core::clock::Millis;
use crate::game::events::GameEvent;
use crate::game::input::PlayerInput;
use crate::game::timer::TIMER_TICK_MS;
use crate::presentation::{PresentationBridge, Session};
use crate::replay::transcript::{RunMetadata, RunTranscript};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Commands a UI sends to the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Start or replay
    Start,
    /// Return to menu
    BackToMenu,
    /// Pick by icon id
    Choose(String),
    /// Pick by display slot
    Slot(usize),
    /// Stop the driver
    Shutdown,
}

impl PlayerCommand {
    fn into_input(self) -> Option<PlayerInput> {
        match self {
            PlayerCommand::Start => Some(PlayerInput::Start),
            PlayerCommand::BackToMenu => Some(PlayerInput::BackToMenu),
            PlayerCommand::Choose(icon_id) => Some(PlayerInput::Choose { icon_id }),
            PlayerCommand::Slot(index) => Some(PlayerInput::Slot { index }),
            PlayerCommand::Shutdown => None,
        }
    }
}

/// Driver errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The driver task has stopped.
    #[error("driver is no longer running")]
    ChannelClosed,
}

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Tick cadence.
    pub tick_interval: Duration,
    /// Record a transcript of every input.
    pub record_transcript: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(TIMER_TICK_MS),
            record_transcript: true,
        }
    }
}

impl DriverConfig {
    /// Defaults overridden by `REACTION_RUSH_TICK_MS` and
    /// `REACTION_RUSH_RECORD`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_parse::<u64>("REACTION_RUSH_TICK_MS").filter(|ms| *ms > 0) {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(record) = env_parse("REACTION_RUSH_RECORD") {
            config.record_transcript = record;
        }
        config
    }
}

/// Sending side held by the UI.
#[derive(Clone, Debug)]
pub struct DriverHandle {
    commands: mpsc::Sender<PlayerCommand>,
    events: broadcast::Sender<GameEvent>,
}

impl DriverHandle {
    /// Queue a command.
    pub async fn send(&self, command: PlayerCommand) -> Result<(), DriverError> {
        self.commands.send(command).await.map_err(|_| DriverError::ChannelClosed)
    }

    /// Subscribe to every game event the driver produces.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Ask the driver to stop.
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.send(PlayerCommand::Shutdown).await
    }
}

/// What the driver hands back when it stops.
pub struct DriverOutcome<B: PresentationBridge> {
    /// The session in its final state.
    pub session: Session<B>,
    /// Finalized transcript, if recording was on.
    pub transcript: Option<RunTranscript>,
}

/// Owns a session and feeds it ticks and commands.
pub struct Driver<B: PresentationBridge> {
    session: Session<B>,
    config: DriverConfig,
    commands: mpsc::Receiver<PlayerCommand>,
    events: broadcast::Sender<GameEvent>,
    epoch: Instant,
    transcript: Option<RunTranscript>,
}

impl<B: PresentationBridge> Driver<B> {
    /// Create a driver and its handle. Host time 0 is now.
    pub fn new(session: Session<B>, config: DriverConfig, run_id: [u8; 16]) -> (Self, DriverHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let transcript = config.record_transcript.then(|| {
            let game = session.game();
            RunTranscript::new(RunMetadata::new(run_id, game.rng_seed(), game.config()))
        });

        let driver = Self {
            session,
            config,
            commands: command_rx,
            events: event_tx.clone(),
            epoch: Instant::now(),
            transcript,
        };
        let handle = DriverHandle { commands: command_tx, events: event_tx };

        (driver, handle)
    }

    /// Run until `Shutdown` or every handle is dropped.
    pub async fn run(mut self) -> DriverOutcome<B> {
        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Driver running at {:?} per tick", self.config.tick_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.apply(PlayerInput::Tick);
                }
                command = self.commands.recv() => {
                    match command.and_then(PlayerCommand::into_input) {
                        Some(input) => self.apply(input),
                        None => {
                            info!("Shutdown signal received");
                            break;
                        }
                    }
                }
            }
        }

        if let Some(transcript) = self.transcript.as_mut() {
            transcript.finalize(self.session.game());
            debug!("Transcript sealed with {} inputs", transcript.inputs.len());
        }

        DriverOutcome { session: self.session, transcript: self.transcript }
    }

    fn now(&self) -> Millis {
        self.epoch.elapsed().as_millis() as Millis
    }

    fn apply(&mut self, input: PlayerInput) {
        let now = self.now();
        let step = self.session.apply(&input, now);

        if let Some(transcript) = self.transcript.as_mut() {
            transcript.record_step(&input, now, &step, self.session.game());
        }

        for event in step.events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::config::GameConfig;
    use crate::game::catalog::Catalog;
    use crate::game::engine::Game;
    use crate::game::scoring::Category;
    use crate::game::state::Phase;
    use crate::presentation::RecordingBridge;
    use crate::replay::verify::verify_transcript;

    fn session(config: GameConfig) -> Session<RecordingBridge> {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        Session::new(Game::new(catalog, config, 2024).unwrap(), RecordingBridge::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_on_interval() {
        let (driver, handle) = Driver::new(session(GameConfig::default()), DriverConfig::default(), [0; 16]);
        let task = tokio::spawn(driver.run());

        handle.send(PlayerCommand::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        handle.shutdown().await.unwrap();

        let outcome = task.await.unwrap();
        let bridge = outcome.session.bridge();
        assert_eq!(bridge.outcomes().first(), Some(&Category::Timeout));
        assert_eq!(outcome.session.game().phase(), Phase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_broadcast() {
        let (driver, handle) = Driver::new(session(GameConfig::default()), DriverConfig::default(), [0; 16]);
        let mut events = handle.subscribe();
        let task = tokio::spawn(driver.run());

        handle.send(PlayerCommand::Start).await.unwrap();
        let first = events.recv().await.unwrap();
        assert!(matches!(first.data, crate::game::events::GameEventData::RunStarted { .. }));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_replays() {
        let (driver, handle) = Driver::new(session(GameConfig::default()), DriverConfig::default(), [9; 16]);
        let task = tokio::spawn(driver.run());

        handle.send(PlayerCommand::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        handle.send(PlayerCommand::Slot(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        handle.send(PlayerCommand::Slot(0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(12_000)).await;
        handle.shutdown().await.unwrap();

        let outcome = task.await.unwrap();
        let transcript = outcome.transcript.unwrap();
        assert!(transcript.is_complete());

        let catalog = Arc::new(Catalog::builtin().unwrap());
        let result = verify_transcript(catalog, GameConfig::default(), &transcript).unwrap();
        assert!(result.valid, "{:?}", result.error);
    }

    #[tokio::test]
    async fn test_send_after_stop_fails() {
        let (driver, handle) = Driver::new(session(GameConfig::default()), DriverConfig::default(), [0; 16]);
        let task = tokio::spawn(driver.run());
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(handle.send(PlayerCommand::Start).await, Err(DriverError::ChannelClosed));
    }
}
