use crate::config::prompt::{ system_turn_text, SystemPromptMode, SYSTEM_PROMPT };
use crate::models::chat::Turn;
use crate::models::content::{ GenerationRequest, ModelMessage };

/// Builds the Gemini `contents` for one exchange.
///
/// The result always starts with the system instruction as a `user` turn,
/// followed by `history` in order and the new `user_text` last. Roles and
/// content of history turns are copied verbatim.
pub fn assemble(history: &[Turn], user_text: &str) -> Vec<ModelMessage> {
    let mut contents = Vec::with_capacity(history.len() + 2);
    contents.push(ModelMessage::text("user", system_turn_text()));
    contents.extend(conversation_contents(history, user_text));
    contents
}

fn conversation_contents<'a>(
    history: &'a [Turn],
    user_text: &'a str
) -> impl Iterator<Item = ModelMessage> + 'a {
    history
        .iter()
        .map(|turn| ModelMessage::text(turn.role.clone(), turn.content.clone()))
        .chain(std::iter::once(ModelMessage::text("user", user_text)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadAssembler {
    mode: SystemPromptMode,
}

impl PayloadAssembler {
    pub fn new(mode: SystemPromptMode) -> Self {
        Self { mode }
    }

    pub fn build(&self, history: &[Turn], user_text: &str) -> GenerationRequest {
        match self.mode {
            SystemPromptMode::UserTurn =>
                GenerationRequest {
                    contents: assemble(history, user_text),
                    system_instruction: None,
                },
            SystemPromptMode::SystemInstruction =>
                GenerationRequest {
                    contents: conversation_contents(history, user_text).collect(),
                    system_instruction: Some(ModelMessage::text("system", SYSTEM_PROMPT)),
                },
        }
    }
}
