//! Prompt lookup for agent personas.
//!
//! Agents fetch their system messages and startup text by fixed keys from
//! an injected [`PromptSource`]. A missing key is a recovered condition:
//! the agent logs the gap and proceeds with an empty or fallback prompt.

use std::collections::HashMap;

/// Lookup key for the rules agent's persona.
pub const RULES_SYSTEM_KEY: &str = "Rules_SystemMessage";

/// Lookup key for the narrator agent's persona.
pub const NARRATOR_SYSTEM_KEY: &str = "Narrator_SystemMessage";

/// Lookup key for the narrator's opening-scene instruction.
pub const NARRATOR_STARTUP_KEY: &str = "Narrator_StartupPrompt";

/// A key/value source of prompt text.
pub trait PromptSource {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// An in-memory prompt table.
///
/// `Default` ships the built-in prompts; rows can be overridden or extended
/// for custom scenarios.
#[derive(Debug, Clone)]
pub struct PromptTable {
    rows: HashMap<String, String>,
}

impl PromptTable {
    /// An empty table with no rows at all.
    pub fn empty() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Insert or replace a prompt row.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.rows.insert(key.into(), text.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_prompt(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }
}

impl Default for PromptTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(RULES_SYSTEM_KEY, include_str!("prompts/rules_system.txt"));
        table.insert(
            NARRATOR_SYSTEM_KEY,
            include_str!("prompts/narrator_system.txt"),
        );
        table.insert(
            NARRATOR_STARTUP_KEY,
            include_str!("prompts/narrator_startup.txt"),
        );
        table
    }
}

impl PromptSource for PromptTable {
    fn lookup(&self, key: &str) -> Option<String> {
        self.rows.get(key).cloned()
    }
}
