//! Testing utilities.
//!
//! `MockClient` stands in for the completion endpoint so the whole pipeline
//! can be exercised deterministically, without network access. Replies are
//! scripted in order and every issued request is recorded for assertions.

use crate::agent::CompletionClient;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Reply returned once the script runs out.
const EXHAUSTED_REPLY: &str = "The voice trails off; there is nothing more scripted.";

/// A scripted completion client.
pub struct MockClient {
    replies: Mutex<VecDeque<Result<String, openai::Error>>>,
    requests: Mutex<Vec<openai::Request>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push_reply(reply);
        self
    }

    /// Queue an error outcome.
    pub fn with_error(self, error: openai::Error) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queue a successful reply on an existing client.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue an error outcome on an existing client.
    pub fn push_error(&self, error: openai::Error) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Number of requests issued so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copies of every request issued so far, in order.
    pub fn requests(&self) -> Vec<openai::Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockClient {
    async fn complete(&self, request: openai::Request) -> Result<String, openai::Error> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EXHAUSTED_REPLY.to_string()))
    }
}
