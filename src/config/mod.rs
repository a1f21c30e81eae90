pub mod prompt;

use crate::cli::Args;
use prompt::SystemPromptMode;
use std::error::Error;
use std::fmt;

pub enum ConfigError {
    MissingApiKey,
    EmptyModel,
    InvalidSystemPromptMode(String),
    IncompleteTls(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => write!(f, "Missing GOOGLE_API_KEY in environment/.env"),
            ConfigError::EmptyModel => write!(f, "MODEL must not be empty"),
            ConfigError::InvalidSystemPromptMode(msg) => write!(f, "{}", msg),
            ConfigError::IncompleteTls(msg) => write!(f, "TLS configuration error: {}", msg),
        }
    }
}

// `main` reports startup failures through `Debug`; show the readable message.
impl fmt::Debug for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert_path: String,
    pub key_path: String,
}

/// Process-wide settings, fixed once the server starts.
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub system_prompt_mode: SystemPromptMode,
    pub server_addr: String,
    pub static_dir: String,
    pub tls: Option<TlsPaths>,
}

// The key stays out of logs and panics.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("system_prompt_mode", &self.system_prompt_mode)
            .field("server_addr", &self.server_addr)
            .field("static_dir", &self.static_dir)
            .field("tls", &self.tls)
            .finish()
    }
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let api_key = args.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        let model = args.model.trim().to_string();
        if model.is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        let system_prompt_mode = args.system_prompt_mode
            .parse::<SystemPromptMode>()
            .map_err(|e| ConfigError::InvalidSystemPromptMode(e.to_string()))?;

        let tls = if args.enable_tls {
            match (&args.tls_cert_path, &args.tls_key_path) {
                (Some(cert_path), Some(key_path)) =>
                    Some(TlsPaths {
                        cert_path: cert_path.clone(),
                        key_path: key_path.clone(),
                    }),
                (Some(_), None) | (None, Some(_)) => {
                    return Err(
                        ConfigError::IncompleteTls(
                            "Both --tls-cert-path and --tls-key-path must be provided to enable TLS.".into()
                        )
                    );
                }
                (None, None) => {
                    return Err(
                        ConfigError::IncompleteTls(
                            "--enable-tls was set but no certificate/key paths provided.".into()
                        )
                    );
                }
            }
        } else {
            None
        };

        Ok(Self {
            api_key,
            model,
            base_url: args.base_url.trim_end_matches('/').to_string(),
            system_prompt_mode,
            server_addr: args.server_addr.clone(),
            static_dir: args.static_dir.clone(),
            tls,
        })
    }
}
