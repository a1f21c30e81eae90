use std::fmt;
use std::str::FromStr;

/// Fixed instruction sent ahead of every conversation.
pub const SYSTEM_PROMPT: &str =
    "You are a concise, friendly support chatbot. If information is missing, ask a short follow-up.";

/// Prefix applied when the instruction travels as an ordinary user turn.
pub const SYSTEM_TURN_PREFIX: &str = "SYSTEM:\n";

/// Where the system instruction is placed in a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemPromptMode {
    /// Prepended to the contents as a synthetic `user` turn.
    #[default]
    UserTurn,
    /// Sent through the API's dedicated `systemInstruction` field.
    SystemInstruction,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseSystemPromptModeError {
    message: String,
}

impl fmt::Display for ParseSystemPromptModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseSystemPromptModeError {}

impl FromStr for SystemPromptMode {
    type Err = ParseSystemPromptModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user-turn" | "user_turn" | "user" => Ok(SystemPromptMode::UserTurn),
            "system-instruction" | "system_instruction" | "system" =>
                Ok(SystemPromptMode::SystemInstruction),
            _ =>
                Err(ParseSystemPromptModeError {
                    message: format!("Invalid system prompt mode: '{}'", s),
                }),
        }
    }
}

impl fmt::Display for SystemPromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemPromptMode::UserTurn => write!(f, "user-turn"),
            SystemPromptMode::SystemInstruction => write!(f, "system-instruction"),
        }
    }
}

/// Text of the synthetic turn used in [`SystemPromptMode::UserTurn`].
pub fn system_turn_text() -> String {
    format!("{}{}", SYSTEM_TURN_PREFIX, SYSTEM_PROMPT)
}
