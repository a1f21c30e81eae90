use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A message in the shape the Gemini `contents` array expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: String,
    pub parts: Vec<Part>,
}

impl ModelMessage {
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part { text: text.into() }],
        }
    }

    #[cfg(test)]
    pub fn joined_text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Everything a generation call needs apart from the model id and credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub contents: Vec<ModelMessage>,
    pub system_instruction: Option<ModelMessage>,
}
