//! Two-agent AI dungeon master engine.
//!
//! This crate chains a rules-adjudication agent and a narration agent
//! around a mutable world model:
//! - The rules agent turns player input plus a world snapshot into a
//!   structured, defensively decoded world-state delta.
//! - The manager merges the delta into the authoritative world.
//! - The narrator describes the merged world back to the player.
//!
//! # Quick Start
//!
//! ```ignore
//! use chatdm_core::{GameMaster, PromptTable};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(openai::OpenAi::from_env()?);
//!     let prompts = PromptTable::default();
//!     let mut master = GameMaster::new(client, &prompts);
//!
//!     println!("{}", master.start().await?);
//!     let report = master.player_turn("I take the key").await?;
//!     println!("{}", report.narrative);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod manager;
pub mod message;
pub mod narrator;
pub mod prompts;
pub mod rules;
pub mod testing;
pub mod world;

// Primary public API
pub use agent::{AgentError, ChatAgent, CompletionClient};
pub use manager::{GameMaster, ManagerError, ResponseEvent, TurnPhase, TurnReport};
pub use message::{ChatMessage, ConversationLog};
pub use narrator::{Narration, NarratorAgent};
pub use prompts::{PromptSource, PromptTable};
pub use rules::{RulesAgent, RulesOutcome, RulesUpdate};
pub use world::{Enemy, Room, WorldState, WorldStateUpdate};
