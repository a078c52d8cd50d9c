//! The base chat-agent capability.
//!
//! A `ChatAgent` owns one persona (system message) and one running
//! conversation, and performs a single request/response exchange against an
//! injected completion client per call. The concrete agents (`RulesAgent`,
//! `NarratorAgent`) compose one of these and interpret the replies.

use crate::message::ConversationLog;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Model requested for agent calls unless overridden.
pub const DEFAULT_AGENT_MODEL: &str = "gpt-4o";

/// Errors from a single agent exchange.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("completion request failed: {0}")]
    Completion(#[from] openai::Error),
}

/// The chat-completion collaborator an agent talks to.
///
/// The real implementation is the `openai` client; tests inject a scripted
/// mock. Implementations must resolve every call with exactly one reply or
/// one error so the turn state machine can always return to idle.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue one completion request and return the assistant's reply text.
    async fn complete(&self, request: openai::Request) -> Result<String, openai::Error>;
}

#[async_trait]
impl CompletionClient for openai::OpenAi {
    async fn complete(&self, request: openai::Request) -> Result<String, openai::Error> {
        self.complete(request).await.map(|response| response.content)
    }
}

/// Persona plus conversation state for one agent.
pub struct ChatAgent {
    client: Arc<dyn CompletionClient>,
    model: String,
    log: ConversationLog,
}

impl ChatAgent {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            model: DEFAULT_AGENT_MODEL.to_string(),
            log: ConversationLog::new(),
        }
    }

    /// Override the model used for this agent's calls.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Install the agent's persona. Empty prompts are skipped; the agent
    /// then runs without a system message rather than failing.
    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.log.set_system(prompt);
    }

    /// Append a user turn to the agent's log.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.log.push_user(content);
    }

    /// Send the entire conversation log and return the reply text.
    ///
    /// The full log is re-sent on every call; the endpoint holds no
    /// conversation state between requests.
    pub async fn send(&self) -> Result<String, AgentError> {
        let request = openai::Request::new(self.log.to_wire()).with_model(&self.model);
        tracing::debug!(
            model = %self.model,
            messages = self.log.len(),
            "sending agent request"
        );

        let reply = self.client.complete(request).await?;
        tracing::debug!(chars = reply.len(), "agent reply received");
        Ok(reply)
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }
}

/// Wrap a world-state snapshot and the player's input into a single user
/// turn with labelled sections the model can locate reliably.
pub fn wrap_user_message(world_state_json: &str, player_input: &str) -> String {
    format!("WORLDSTATE:\n{world_state_json}\n\nPLAYERINPUT:\n{player_input}")
}

/// As [`wrap_user_message`], with the rules-agent verdict JSON in between.
pub fn wrap_user_message_with_rules(
    world_state_json: &str,
    rules_result_json: &str,
    player_input: &str,
) -> String {
    format!(
        "WORLDSTATE:\n{world_state_json}\n\nRULESRESULT:\n{rules_result_json}\n\nPLAYERINPUT:\n{player_input}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClient;

    #[test]
    fn test_wrap_user_message() {
        let wrapped = wrap_user_message("{\"rooms\":[]}", "look around");
        assert_eq!(
            wrapped,
            "WORLDSTATE:\n{\"rooms\":[]}\n\nPLAYERINPUT:\nlook around"
        );
    }

    #[test]
    fn test_wrap_user_message_with_rules() {
        let wrapped = wrap_user_message_with_rules("{}", "{\"success\":true}", "take the key");
        assert_eq!(
            wrapped,
            "WORLDSTATE:\n{}\n\nRULESRESULT:\n{\"success\":true}\n\nPLAYERINPUT:\ntake the key"
        );
    }

    #[tokio::test]
    async fn test_send_replays_full_log() {
        let client = Arc::new(MockClient::new().with_reply("one").with_reply("two"));
        let mut agent = ChatAgent::new(client.clone());
        agent.set_system_prompt("persona");

        agent.push_user("first");
        agent.send().await.unwrap();
        agent.push_user("second");
        agent.send().await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[0].role, openai::Role::System);
        assert_eq!(requests[1].messages[1].content, "first");
        assert_eq!(requests[1].messages[2].content, "second");
    }

    #[tokio::test]
    async fn test_send_surfaces_transport_error() {
        let client = Arc::new(
            MockClient::new().with_error(openai::Error::Network("connection refused".into())),
        );
        let mut agent = ChatAgent::new(client);
        agent.push_user("hello");

        assert!(matches!(
            agent.send().await,
            Err(AgentError::Completion(openai::Error::Network(_)))
        ));
    }
}
