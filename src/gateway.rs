use crate::config::AppConfig;
use crate::history::PayloadAssembler;
use crate::llm::chat::{ new_client, ChatClient, ChatError, FragmentStream };
use crate::llm::LlmConfig;
use crate::models::chat::Turn;

use futures::{ future, Stream, StreamExt };
use log::{ error, info };
use std::pin::Pin;
use std::sync::Arc;

/// Reply substituted when the model answers without any text.
pub const NO_REPLY: &str = "(no reply)";

/// Non-empty text fragments in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn ChatClient>,
    assembler: PayloadAssembler,
}

impl Gateway {
    pub fn new(client: Arc<dyn ChatClient>, assembler: PayloadAssembler) -> Self {
        Self { client, assembler }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = new_client(&LlmConfig::from(config));
        info!(
            "Chat client configured: Model={}, BaseURL={}, SystemPromptMode={}",
            config.model,
            config.base_url,
            config.system_prompt_mode
        );
        Self::new(client, PayloadAssembler::new(config.system_prompt_mode))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub async fn reply(&self, history: &[Turn], user_text: &str) -> Result<String, ChatError> {
        let request = self.assembler.build(history, user_text);
        let text = self.client.generate(&request).await?;
        Ok(text.filter(|t| !t.is_empty()).unwrap_or_else(|| NO_REPLY.to_string()))
    }

    /// Starts a streamed generation. Errors before the first event are returned
    /// here; later ones end the stream after logging.
    pub async fn reply_stream(
        &self,
        history: &[Turn],
        user_text: &str
    ) -> Result<TextStream, ChatError> {
        let request = self.assembler.build(history, user_text);
        let fragments = self.client.generate_stream(&request).await?;
        Ok(relay_fragments(fragments))
    }
}

/// Drops text-less events and stops at the first upstream error.
pub fn relay_fragments(fragments: FragmentStream) -> TextStream {
    Box::pin(
        fragments
            .scan((), |_, item| {
                future::ready(match item {
                    Ok(fragment) => Some(fragment),
                    Err(e) => {
                        error!("Generation stream ended early: {}", e);
                        None
                    }
                })
            })
            .filter_map(|fragment| future::ready(fragment.filter(|t| !t.is_empty())))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::{ SystemPromptMode, SYSTEM_PROMPT };
    use crate::models::content::GenerationRequest;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Option<String>,
        fail: bool,
        events: Vec<Result<Option<String>, ChatError>>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedClient {
        fn new(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                fail: false,
                events: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, ChatError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ChatError::Network("connection refused".into()));
            }
            Ok(self.reply.clone())
        }

        async fn generate_stream(
            &self,
            request: &GenerationRequest
        ) -> Result<FragmentStream, ChatError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ChatError::Network("connection refused".into()));
            }
            let events: Vec<_> = self.events
                .iter()
                .map(|e| match e {
                    Ok(t) => Ok(t.clone()),
                    Err(e) => Err(ChatError::Stream(e.to_string())),
                })
                .collect();
            Ok(Box::pin(stream::iter(events)))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn gateway(client: Arc<ScriptedClient>) -> Gateway {
        Gateway::new(client, PayloadAssembler::new(SystemPromptMode::UserTurn))
    }

    #[tokio::test]
    async fn reply_returns_generated_text() {
        let client = Arc::new(ScriptedClient::new(Some("Hello!")));
        let reply = gateway(client.clone()).reply(&[], "hi").await.unwrap();
        assert_eq!(reply, "Hello!");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].contents.len(), 2);
        assert!(seen[0].contents[0].joined_text().contains(SYSTEM_PROMPT));
        assert_eq!(seen[0].contents[1].joined_text(), "hi");
    }

    #[tokio::test]
    async fn missing_or_empty_text_becomes_placeholder() {
        let none = gateway(Arc::new(ScriptedClient::new(None))).reply(&[], "hi").await.unwrap();
        assert_eq!(none, NO_REPLY);
        let empty = gateway(Arc::new(ScriptedClient::new(Some("")))).reply(&[], "hi").await.unwrap();
        assert_eq!(empty, NO_REPLY);
    }

    #[tokio::test]
    async fn reply_surfaces_client_error() {
        let mut client = ScriptedClient::new(None);
        client.fail = true;
        let err = gateway(Arc::new(client)).reply(&[], "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Request to generation API failed: connection refused");
    }

    #[tokio::test]
    async fn stream_skips_empty_and_textless_events() {
        let mut client = ScriptedClient::new(None);
        client.events = vec![Ok(Some("Hi".into())), Ok(None), Ok(Some("".into())), Ok(Some(" there".into()))];
        let stream = gateway(Arc::new(client)).reply_stream(&[], "hi").await.unwrap();
        let fragments: Vec<String> = stream.collect().await;
        assert_eq!(fragments, vec!["Hi", " there"]);
    }

    #[tokio::test]
    async fn stream_ends_at_first_error() {
        let mut client = ScriptedClient::new(None);
        client.events = vec![
            Ok(Some("partial".into())),
            Err(ChatError::Stream("reset".into())),
            Ok(Some("never".into()))
        ];
        let stream = gateway(Arc::new(client)).reply_stream(&[], "hi").await.unwrap();
        let fragments: Vec<String> = stream.collect().await;
        assert_eq!(fragments, vec!["partial"]);
    }

    #[tokio::test]
    async fn stream_start_failure_is_returned() {
        let mut client = ScriptedClient::new(None);
        client.fail = true;
        assert!(gateway(Arc::new(client)).reply_stream(&[], "hi").await.is_err());
    }
}
