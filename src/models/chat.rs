use serde::{ Serialize, Deserialize };

/// One message of a caller-held conversation. `role` is normally `user` or `model`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConversationRequest {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub history: Vec<Turn>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_defaults_to_empty() {
        let req: ConversationRequest = serde_json::from_str(r#"{"user":"hi"}"#).unwrap();
        assert_eq!(req.user, "hi");
        assert!(req.history.is_empty());
    }

    #[test]
    fn missing_user_parses_as_empty() {
        let req: ConversationRequest = serde_json::from_str(r#"{"history":[]}"#).unwrap();
        assert_eq!(req.user, "");
    }

    #[test]
    fn history_keeps_roles_verbatim() {
        let req: ConversationRequest = serde_json::from_str(
            r#"{"user":"x","history":[{"role":"model","content":"a"},{"role":"tool","content":"b"}]}"#
        ).unwrap();
        assert_eq!(req.history[0], Turn { role: "model".into(), content: "a".into() });
        assert_eq!(req.history[1].role, "tool");
    }
}
