//! The rules-adjudication agent.
//!
//! Turns player input plus a world-state snapshot into a structured
//! [`RulesUpdate`]. Model replies are free text and frequently malformed
//! (fenced in markdown, missing fields, or not JSON at all), so the decode
//! path here never fails hard: the worst outcome is a
//! `success = false` verdict with an empty delta and the cleaned reply text
//! preserved for diagnostics.

use crate::agent::{wrap_user_message, AgentError, ChatAgent, CompletionClient};
use crate::prompts::{PromptSource, RULES_SYSTEM_KEY};
use crate::world::WorldStateUpdate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The full decoded shape of a rules reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesUpdate {
    /// Whether the player's action succeeded according to the rules agent.
    pub success: bool,

    /// Why the action succeeded or failed.
    pub reason: String,

    /// Items the player picked up during the action.
    pub items_picked_up: Vec<String>,

    /// The world-state delta to merge.
    pub state_changes: WorldStateUpdate,
}

/// The result of one rules evaluation, handed back to the manager.
#[derive(Debug, Clone)]
pub struct RulesOutcome {
    /// The decoded (possibly recovered-to-default) verdict.
    pub update: RulesUpdate,

    /// The cleaned reply text, JSON or not, for the narrator and for
    /// diagnostics.
    pub raw_json: String,

    /// The player input this verdict answers.
    pub player_input: String,
}

/// Adjudicates player actions against the world state.
pub struct RulesAgent {
    agent: ChatAgent,
}

impl RulesAgent {
    /// Create the agent and install its persona from the prompt source.
    pub fn new(client: Arc<dyn CompletionClient>, prompts: &dyn PromptSource) -> Self {
        let mut agent = ChatAgent::new(client);
        match prompts.lookup(RULES_SYSTEM_KEY) {
            Some(prompt) => agent.set_system_prompt(&prompt),
            None => {
                tracing::warn!(key = RULES_SYSTEM_KEY, "prompt row missing, proceeding without persona");
            }
        }
        Self { agent }
    }

    /// Ask the rules agent to adjudicate one player action.
    ///
    /// A transport or API failure is returned as an error; a malformed
    /// reply is not, and decodes to a failed verdict instead.
    pub async fn evaluate(
        &mut self,
        player_input: &str,
        world_state_json: &str,
    ) -> Result<RulesOutcome, AgentError> {
        self.agent
            .push_user(wrap_user_message(world_state_json, player_input));

        let reply = self.agent.send().await?;
        let (update, raw_json) = decode_rules_reply(&reply);

        tracing::info!(success = update.success, reason = %update.reason, "rules verdict");

        Ok(RulesOutcome {
            update,
            raw_json,
            player_input: player_input.to_string(),
        })
    }

    pub fn log(&self) -> &crate::message::ConversationLog {
        self.agent.log()
    }
}

/// Decode a raw rules reply into a [`RulesUpdate`] plus the cleaned text.
///
/// The cleanup order is: trim whitespace, strip a UTF-8 BOM, strip markdown
/// code fences (any case for the `json` tag), trim again. If the cleaned
/// text is not a JSON object the verdict defaults to `success = false` with
/// an empty delta. When the struct decode leaves `success` false, the field
/// is re-read from the raw parsed object so a literal `"success": true`
/// survives an otherwise mismatched payload.
pub fn decode_rules_reply(raw: &str) -> (RulesUpdate, String) {
    let cleaned = strip_code_fences(raw.trim().trim_start_matches('\u{feff}'))
        .trim()
        .to_string();

    let root: serde_json::Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, reply = %cleaned, "rules reply is not valid JSON");
            return (RulesUpdate::default(), cleaned);
        }
    };

    let mut update: RulesUpdate = match serde_json::from_value(root.clone()) {
        Ok(update) => update,
        Err(error) => {
            tracing::warn!(%error, "rules reply did not match the expected shape");
            RulesUpdate::default()
        }
    };

    if !update.success {
        if let Some(success) = root.get("success").and_then(serde_json::Value::as_bool) {
            update.success = success;
        }
    }

    (update, cleaned)
}

/// Remove markdown code-fence markers anywhere in the text.
///
/// Handles both a fence with a `json` language tag (any tag case) and a
/// bare fence; the fenced content itself is kept.
fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 3..];
        rest = match after.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &after[4..],
            _ => after,
        };
    }

    out.push_str(rest);
    out
}
