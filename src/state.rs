use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::continuation::ContinuationResponder;
use crate::core::llm::{OpenAIChatGenerator, ReplyGenerator};
use crate::core::session::SessionRegistry;
use crate::core::stt::{RtzrAuthClient, RtzrSTTConfig, STTError, SttRelay};
use crate::core::tts::ElevenLabsTTS;
use crate::core::turn::TurnOrchestrator;

/// Timeout for establishing outbound HTTP connections.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state.
///
/// Holds the session registry (the only state shared across calls) and the
/// long-lived components built from configuration.
pub struct AppState {
    pub config: ServerConfig,
    pub registry: Arc<SessionRegistry>,
    pub orchestrator: Arc<TurnOrchestrator>,
    pub responder: ContinuationResponder,
    pub tts: ElevenLabsTTS,
    stt_config: RtzrSTTConfig,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// Exchanges RTZR client credentials for a token unless a token is
    /// configured directly.
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, STTError> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| STTError::ConfigurationError(format!("HTTP client: {e}")))?;

        let token = match (&config.rtzr_token, &config.rtzr_client_id, &config.rtzr_client_secret)
        {
            (Some(token), _, _) => token.clone(),
            (None, Some(client_id), Some(client_secret)) => {
                RtzrAuthClient::new(client.clone(), config.rtzr_auth_url.clone())
                    .authenticate(client_id, client_secret)
                    .await?
                    .access_token
            }
            _ => {
                return Err(STTError::ConfigurationError(
                    "no RTZR token or client credentials configured".to_string(),
                ));
            }
        };

        if config.openai_api_key.is_none() {
            warn!("OPENAI_API_KEY not set; replies will be empty");
        }
        if config.elevenlabs_api_key.is_none() {
            warn!("ELEVENLABS_API_KEY not set; TTS requests will fail");
        }

        let generator = Arc::new(OpenAIChatGenerator::new(
            client.clone(),
            config.openai_chat_config(),
        ));
        Ok(Self::with_components(config, client, token, generator))
    }

    /// Build the state from explicit parts.
    pub fn with_components(
        config: ServerConfig,
        client: reqwest::Client,
        stt_token: String,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Arc<Self> {
        let registry = Arc::new(SessionRegistry::new(
            config.response_queue_capacity,
            config.session_linger(),
        ));
        let orchestrator = Arc::new(TurnOrchestrator::new(
            registry.clone(),
            generator,
            config.content_guard(),
            config.llm_timeout(),
        ));
        let responder = ContinuationResponder::new(registry.clone(), config.tts_voice_id.clone());
        let tts = ElevenLabsTTS::new(client, config.elevenlabs_config(), registry.clone());
        let stt_config = config.rtzr_stt_config(&stt_token);

        info!(
            "Relay state ready (model {}, voice {})",
            config.llm_model, config.tts_voice_id
        );

        Arc::new(Self {
            config,
            registry,
            orchestrator,
            responder,
            tts,
            stt_config,
        })
    }

    /// A relay for one media stream.
    pub fn stt_relay(&self) -> SttRelay {
        SttRelay::new(
            self.stt_config.clone(),
            self.registry.clone(),
            self.orchestrator.clone(),
        )
    }
}
