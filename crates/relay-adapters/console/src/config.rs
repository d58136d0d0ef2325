//! Console adapter settings.

use serde::{Deserialize, Serialize};

/// Settings read from `[settings.console]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Printed before each read. Empty disables the prompt.
    pub prompt: String,

    /// User reported by requests. Defaults to `$USER`.
    pub user: Option<String>,

    /// Lines that end the session, compared after trimming.
    pub exit_commands: Vec<String>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            user: None,
            exit_commands: vec!["exit".to_string(), "quit".to_string()],
        }
    }
}

impl ConsoleSettings {
    /// The configured user, else `$USER`, else `console`.
    pub fn resolve_user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "console".to_string())
    }

    pub fn is_exit(&self, line: &str) -> bool {
        self.exit_commands.iter().any(|cmd| cmd == line)
    }
}
