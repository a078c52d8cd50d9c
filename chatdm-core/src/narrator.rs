//! The narration agent.
//!
//! Produces the player-facing prose for each turn. The narrator never
//! parses its own output and never touches world state; the raw reply text
//! is the deliverable.

use crate::agent::{
    wrap_user_message, wrap_user_message_with_rules, AgentError, ChatAgent, CompletionClient,
};
use crate::prompts::{PromptSource, NARRATOR_STARTUP_KEY, NARRATOR_SYSTEM_KEY};
use std::sync::Arc;

/// Scene-setting instruction used when no startup prompt row exists.
const FALLBACK_STARTUP_PROMPT: &str = "Describe the player's arrival into the room described \
    by the WorldState. Set the scene and invite them to act.";

/// One narration result.
#[derive(Debug, Clone)]
pub struct Narration {
    /// The narrator's prose.
    pub text: String,

    /// The player input this narration answers. For the opening scene this
    /// echoes the startup prompt.
    pub player_input: String,
}

/// Narrates outcomes back to the player.
pub struct NarratorAgent {
    agent: ChatAgent,
    startup_prompt: String,
}

impl NarratorAgent {
    /// Create the agent, loading its persona and startup prompt.
    ///
    /// Missing prompt rows are logged and recovered: the persona falls back
    /// to empty and the startup prompt to a fixed literal.
    pub fn new(client: Arc<dyn CompletionClient>, prompts: &dyn PromptSource) -> Self {
        let mut agent = ChatAgent::new(client);
        match prompts.lookup(NARRATOR_SYSTEM_KEY) {
            Some(prompt) => agent.set_system_prompt(&prompt),
            None => {
                tracing::warn!(key = NARRATOR_SYSTEM_KEY, "prompt row missing, proceeding without persona");
            }
        }

        let startup_prompt = prompts.lookup(NARRATOR_STARTUP_KEY).unwrap_or_else(|| {
            tracing::warn!(key = NARRATOR_STARTUP_KEY, "prompt row missing, using fallback");
            String::new()
        });

        Self {
            agent,
            startup_prompt,
        }
    }

    /// Produce the opening narration for a fresh session.
    pub async fn open_scene(&mut self, world_state_json: &str) -> Result<Narration, AgentError> {
        if self.startup_prompt.is_empty() {
            self.startup_prompt = FALLBACK_STARTUP_PROMPT.to_string();
        }

        self.agent
            .push_user(wrap_user_message(world_state_json, &self.startup_prompt));

        let text = self.agent.send().await?;
        Ok(Narration {
            text,
            player_input: self.startup_prompt.clone(),
        })
    }

    /// Narrate one completed turn, given the merged world state and the
    /// rules verdict JSON.
    pub async fn narrate(
        &mut self,
        player_input: &str,
        world_state_json: &str,
        rules_result_json: &str,
    ) -> Result<Narration, AgentError> {
        self.agent.push_user(wrap_user_message_with_rules(
            world_state_json,
            rules_result_json,
            player_input,
        ));

        let text = self.agent.send().await?;
        Ok(Narration {
            text,
            player_input: player_input.to_string(),
        })
    }

    pub fn log(&self) -> &crate::message::ConversationLog {
        self.agent.log()
    }
}
