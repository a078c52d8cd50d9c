//! The orchestrator: sequences the agent chain and owns the world.
//!
//! A turn is Rules call → merge → Narrator call, strictly in that order;
//! the narrator always describes the post-merge world. The turn-phase state
//! machine allows at most one exchange in flight: player input arriving
//! while a turn is running is rejected, not queued.

use crate::agent::CompletionClient;
use crate::narrator::NarratorAgent;
use crate::prompts::PromptSource;
use crate::rules::{RulesAgent, RulesUpdate};
use crate::world::WorldState;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// User-visible text when the narrator call fails at the transport level.
const NARRATOR_UNREACHABLE: &str =
    "The narrator falls silent; the storyteller could not be reached. Try again in a moment.";

/// User-visible text when the rules call fails at the transport level.
const RULES_UNREACHABLE: &str =
    "The dungeon's rules engine could not be reached, so nothing happens. Try again in a moment.";

/// Errors from the manager's own sequencing. Transport and decode failures
/// never surface here; they are recovered into narration text.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("a turn is already in flight")]
    TurnInFlight,

    #[error("world serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where the manager is within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Agents constructed, opening narration not yet requested.
    AgentsInitializing,
    /// Ready for player input.
    Idle,
    /// The rules call for the current turn is outstanding.
    AwaitingRulesReply,
    /// The narrator call for the current turn is outstanding.
    AwaitingNarratorReply,
}

/// A response pushed to the subscribed caller, once per completed
/// narration.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub text: String,
    pub from_player: bool,
}

/// Everything a completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// The narrator's prose (or a recovered could-not-reach message).
    pub narrative: String,

    /// The decoded rules verdict for the turn.
    pub rules: RulesUpdate,

    /// The cleaned rules reply text as the narrator saw it.
    pub rules_json: String,
}

/// Owns the world state and drives the two-agent chain.
pub struct GameMaster {
    rules: RulesAgent,
    narrator: NarratorAgent,
    world: WorldState,
    phase: TurnPhase,
    events: Option<mpsc::UnboundedSender<ResponseEvent>>,
}

impl GameMaster {
    /// Construct both agents around a shared completion client and seed the
    /// starting world.
    pub fn new(client: Arc<dyn CompletionClient>, prompts: &dyn PromptSource) -> Self {
        Self {
            rules: RulesAgent::new(client.clone(), prompts),
            narrator: NarratorAgent::new(client, prompts),
            world: WorldState::starting(),
            phase: TurnPhase::AgentsInitializing,
            events: None,
        }
    }

    /// Replace the seeded world. Intended for custom scenarios and tests;
    /// only sensible before [`start`](Self::start).
    pub fn with_world(mut self, world: WorldState) -> Self {
        self.world = world;
        self
    }

    /// Subscribe to per-narration response events.
    ///
    /// At most one receiver exists; repeated calls return `None` rather
    /// than silently rebinding the stream elsewhere.
    pub fn subscribe(&mut self) -> Option<mpsc::UnboundedReceiver<ResponseEvent>> {
        if self.events.is_some() {
            tracing::warn!("response events already subscribed, ignoring");
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        Some(rx)
    }

    /// Request the opening narration. No rules step runs; there is
    /// nothing to adjudicate yet.
    pub async fn start(&mut self) -> Result<String, ManagerError> {
        if self.phase != TurnPhase::AgentsInitializing {
            tracing::warn!(phase = ?self.phase, "start called on a running session, ignoring");
            return Err(ManagerError::TurnInFlight);
        }

        self.phase = TurnPhase::AwaitingNarratorReply;
        let world_json = match self.world.to_json() {
            Ok(json) => json,
            Err(error) => {
                self.phase = TurnPhase::Idle;
                return Err(error.into());
            }
        };

        let narrative = match self.narrator.open_scene(&world_json).await {
            Ok(narration) => narration.text,
            Err(error) => {
                tracing::warn!(%error, "opening narration failed");
                NARRATOR_UNREACHABLE.to_string()
            }
        };

        self.phase = TurnPhase::Idle;
        self.emit(&narrative);
        Ok(narrative)
    }

    /// Run one full player turn: rules adjudication, world merge, then
    /// narration of the merged world.
    ///
    /// Returns [`ManagerError::TurnInFlight`] without touching the world or
    /// the network if a turn is already running.
    pub async fn player_turn(&mut self, player_input: &str) -> Result<TurnReport, ManagerError> {
        if self.phase != TurnPhase::Idle {
            tracing::warn!(phase = ?self.phase, "player input rejected, a turn is in flight");
            return Err(ManagerError::TurnInFlight);
        }

        self.phase = TurnPhase::AwaitingRulesReply;
        let world_json = match self.world.to_json() {
            Ok(json) => json,
            Err(error) => {
                self.phase = TurnPhase::Idle;
                return Err(error.into());
            }
        };

        let outcome = match self.rules.evaluate(player_input, &world_json).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(%error, "rules call failed, turn abandoned");
                self.phase = TurnPhase::Idle;
                self.emit(RULES_UNREACHABLE);
                return Ok(TurnReport {
                    narrative: RULES_UNREACHABLE.to_string(),
                    rules: RulesUpdate::default(),
                    rules_json: String::new(),
                });
            }
        };

        // Merge before the narrator runs: narration must describe the
        // post-update world.
        self.world.apply_update(&outcome.update.state_changes);

        self.phase = TurnPhase::AwaitingNarratorReply;
        let merged_json = match self.world.to_json() {
            Ok(json) => json,
            Err(error) => {
                self.phase = TurnPhase::Idle;
                return Err(error.into());
            }
        };

        let narrative = match self
            .narrator
            .narrate(&outcome.player_input, &merged_json, &outcome.raw_json)
            .await
        {
            Ok(narration) => narration.text,
            Err(error) => {
                tracing::warn!(%error, "narration call failed");
                NARRATOR_UNREACHABLE.to_string()
            }
        };

        self.phase = TurnPhase::Idle;
        self.emit(&narrative);
        Ok(TurnReport {
            narrative,
            rules: outcome.update,
            rules_json: outcome.raw_json,
        })
    }

    fn emit(&self, text: &str) {
        if let Some(events) = &self.events {
            let _ = events.send(ResponseEvent {
                text: text.to_string(),
                from_player: false,
            });
        }
    }

    /// The live world state.
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Current position in the turn state machine.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptTable;
    use crate::testing::MockClient;

    fn mock_master(client: Arc<MockClient>) -> GameMaster {
        GameMaster::new(client, &PromptTable::default())
    }

    #[tokio::test]
    async fn test_input_rejected_before_start() {
        let client = Arc::new(MockClient::new());
        let mut master = mock_master(client.clone());

        let result = master.player_turn("I look around").await;

        assert!(matches!(result, Err(ManagerError::TurnInFlight)));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_input_rejected_while_turn_in_flight() {
        let client = Arc::new(MockClient::new());
        let mut master = mock_master(client.clone());
        let before = master.world().clone();

        for phase in [TurnPhase::AwaitingRulesReply, TurnPhase::AwaitingNarratorReply] {
            master.phase = phase;
            let result = master.player_turn("I open the door").await;
            assert!(matches!(result, Err(ManagerError::TurnInFlight)));
        }

        assert_eq!(master.world(), &before);
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_start_only_runs_once() {
        let client = Arc::new(MockClient::new().with_reply("You arrive."));
        let mut master = mock_master(client.clone());

        master.start().await.unwrap();
        let again = master.start().await;

        assert!(matches!(again, Err(ManagerError::TurnInFlight)));
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let client = Arc::new(MockClient::new().with_reply("You arrive."));
        let mut master = mock_master(client);

        let mut rx = master.subscribe().expect("first subscribe succeeds");
        assert!(master.subscribe().is_none());

        master.start().await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.text, "You arrive.");
        assert!(!event.from_player);
    }

    #[tokio::test]
    async fn test_opening_transport_failure_recovers_to_idle() {
        let client = Arc::new(
            MockClient::new().with_error(openai::Error::Network("connection reset".into())),
        );
        let mut master = mock_master(client);

        let narrative = master.start().await.unwrap();

        assert_eq!(narrative, NARRATOR_UNREACHABLE);
        assert_eq!(master.phase(), TurnPhase::Idle);
    }
}
