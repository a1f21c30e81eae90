#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use gemini_chat_relay::config::prompt::SystemPromptMode;
use gemini_chat_relay::gateway::Gateway;
use gemini_chat_relay::history::PayloadAssembler;
use gemini_chat_relay::llm::chat::{ ChatClient, ChatError, FragmentStream };
use gemini_chat_relay::models::content::GenerationRequest;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Arc;

pub enum Script {
    Reply(Option<String>),
    Fail(String),
    Fragments(Vec<Option<String>>),
}

/// Generation dependency that plays back a fixed script and counts calls.
pub struct MockChatClient {
    script: Script,
    calls: AtomicUsize,
}

impl MockChatClient {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self { script, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn generate(&self, _request: &GenerationRequest) -> Result<Option<String>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(message) => Err(ChatError::Network(message.clone())),
            Script::Fragments(fragments) => Ok(Some(fragments.iter().flatten().cloned().collect())),
        }
    }

    async fn generate_stream(&self, _request: &GenerationRequest) -> Result<FragmentStream, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Fragments(fragments) => {
                let items: Vec<Result<Option<String>, ChatError>> = fragments
                    .iter()
                    .cloned()
                    .map(Ok)
                    .collect();
                Ok(Box::pin(stream::iter(items)))
            }
            Script::Reply(text) => {
                let items: Vec<Result<Option<String>, ChatError>> = vec![Ok(text.clone())];
                Ok(Box::pin(stream::iter(items)))
            }
            Script::Fail(message) => Err(ChatError::Network(message.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

pub fn gateway_with(client: Arc<MockChatClient>) -> Gateway {
    Gateway::new(client, PayloadAssembler::new(SystemPromptMode::UserTurn))
}
