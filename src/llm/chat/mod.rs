pub mod gemini;
pub mod sse;

use async_trait::async_trait;
use futures::{ Future, Stream, StreamExt };
use log::{ debug, warn };
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use self::gemini::GeminiChatClient;
use self::sse::SseDecoder;
use super::LlmConfig;
use crate::models::content::GenerationRequest;

const STREAM_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Request to generation API failed: {0}")]
    Network(String),
    #[error("Generation API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
    },
    #[error("Failed to decode generation response: {0}")]
    Decode(String),
    #[error("Generation stream interrupted: {0}")]
    Stream(String),
}

/// One item per upstream event; `None` when the event carried no text.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Option<String>, ChatError>> + Send>>;

type FragmentSender = mpsc::Sender<Result<Option<String>, ChatError>>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Whole-response call. `Ok(None)` means the API answered without any text.
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, ChatError>;

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<FragmentStream, ChatError>;

    fn model(&self) -> &str;
}

pub fn new_client(config: &LlmConfig) -> Arc<dyn ChatClient> {
    Arc::new(GeminiChatClient::from_config(config))
}

pub fn create_streaming_response<F, Fut>(producer: F) -> FragmentStream
    where
        F: FnOnce(FragmentSender) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        producer(tx).await;
    });

    Box::pin(ReceiverStream::new(rx))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Turns a non-2xx response into [`ChatError::Api`], preferring the
/// `{"error": {"message": ...}}` envelope over the raw body.
pub async fn error_from_response(resp: reqwest::Response) -> ChatError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty error body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    ChatError::Api { status, message }
}

/// Sends `request` and relays its server-sent events as fragments.
///
/// Connection and status errors are returned before any fragment exists.
/// After that, each `data` payload goes through `event_parser`, and the
/// reader stops as soon as the returned stream is dropped.
pub async fn http_stream_generate(
    request: reqwest::RequestBuilder,
    event_parser: fn(&str) -> Result<Option<String>, ChatError>
) -> Result<FragmentStream, ChatError> {
    let resp = request.send().await.map_err(|e| ChatError::Network(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }

    Ok(
        create_streaming_response(move |tx| async move {
            let mut bytes = resp.bytes_stream();
            let mut decoder = SseDecoder::new();

            loop {
                let chunk = tokio::select! {
                    _ = tx.closed() => {
                        debug!("Stream consumer went away, dropping upstream response");
                        return;
                    }
                    chunk = bytes.next() => chunk,
                };

                match chunk {
                    Some(Ok(buf)) => {
                        for payload in decoder.push(&buf) {
                            if !forward_event(&tx, &payload, event_parser).await {
                                return;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Upstream stream failed: {}", e);
                        let _ = tx.send(Err(ChatError::Stream(e.to_string()))).await;
                        return;
                    }
                    None => {
                        break;
                    }
                }
            }

            if let Some(payload) = decoder.finish() {
                forward_event(&tx, &payload, event_parser).await;
            }
        })
    )
}

/// Returns `false` once nothing more should be sent.
async fn forward_event(
    tx: &FragmentSender,
    payload: &str,
    event_parser: fn(&str) -> Result<Option<String>, ChatError>
) -> bool {
    if payload.trim() == "[DONE]" {
        return true;
    }
    match event_parser(payload) {
        Ok(fragment) => tx.send(Ok(fragment)).await.is_ok(),
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn streaming_response_relays_in_order() {
        let stream = create_streaming_response(|tx| async move {
            for text in ["a", "b", "c"] {
                tx.send(Ok(Some(text.to_string()))).await.unwrap();
            }
        });
        let items: Vec<_> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![Some("a".into()), Some("b".into()), Some("c".into())]);
    }

    #[tokio::test]
    async fn producer_sees_closed_channel_after_drop() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let stream = create_streaming_response(|tx| async move {
            tx.closed().await;
            let _ = done_tx.send(());
        });
        drop(stream);
        tokio::time::timeout(std::time::Duration::from_secs(1), done_rx)
            .await
            .expect("producer should notice the dropped consumer")
            .unwrap();
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = ChatError::Api { status: 400, message: "API key not valid".into() };
        assert_eq!(err.to_string(), "Generation API error 400: API key not valid");
    }
}
