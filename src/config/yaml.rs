use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override the corresponding environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///   public_url: "https://relay.example.com"
///   cors_allowed_origins: "*"
///
/// stt:
///   client_id: "rtzr-client-id"
///   client_secret: "rtzr-client-secret"
///   url: "wss://openapi.vito.ai/v1/transcribe:streaming"
///   auth_url: "https://openapi.vito.ai/v1/authenticate"
///
/// llm:
///   api_key: "sk-..."
///   model: "gpt-4-0125-preview"
///   timeout_seconds: 30
///   system_prompt: "You are a bank representative..."
///
/// tts:
///   api_key: "xi-..."
///   voice_id: "pMsXgVXv3BLzUgSXRplE"
///   model_id: "eleven_multilingual_v2"
///
/// call:
///   greeting: "Hello?"
///   goodbye: "Thank you for calling. Goodbye!"
///   say_voice: "Polly.Amy"
///   say_language: "en-US"
///
/// relay:
///   audio_queue_capacity: 256
///   response_queue_capacity: 16
///   session_linger_seconds: 30
///
/// guard:
///   blocked_terms: ["shutdown", "reboot"]
///   warning: "Warning: Your input contains restricted terms."
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub stt: Option<SttYaml>,
    pub llm: Option<LlmYaml>,
    pub tts: Option<TtsYaml>,
    pub call: Option<CallYaml>,
    pub relay: Option<RelayYaml>,
    pub guard: Option<GuardYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Externally reachable base URL used in TwiML callbacks
    pub public_url: Option<String>,
    pub cors_allowed_origins: Option<String>,
}

/// Streaming STT (RTZR) configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SttYaml {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Pre-issued access token; skips the credential exchange
    pub token: Option<String>,
    pub url: Option<String>,
    pub auth_url: Option<String>,
}

/// Reply generator configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmYaml {
    pub api_key: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub system_prompt: Option<String>,
}

/// TTS (ElevenLabs) configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub api_key: Option<String>,
    pub url: Option<String>,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
}

/// Spoken call script from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CallYaml {
    pub greeting: Option<String>,
    pub goodbye: Option<String>,
    pub say_voice: Option<String>,
    pub say_language: Option<String>,
}

/// Relay queue sizing from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RelayYaml {
    pub audio_queue_capacity: Option<usize>,
    pub response_queue_capacity: Option<usize>,
    pub session_linger_seconds: Option<u64>,
}

/// Blocked-terms guard from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GuardYaml {
    pub blocked_terms: Option<Vec<String>>,
    pub warning: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  public_url: "https://relay.example.com"

stt:
  client_id: "id"
  client_secret: "secret"

llm:
  api_key: "sk-test"
  timeout_seconds: 10

tts:
  api_key: "xi-test"
  voice_id: "voice-1"

call:
  greeting: "Hi!"

relay:
  audio_queue_capacity: 64
  response_queue_capacity: 4
  session_linger_seconds: 5

guard:
  blocked_terms: ["shutdown", "reboot"]
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(8080));
        assert_eq!(
            server.public_url.as_deref(),
            Some("https://relay.example.com")
        );
        assert_eq!(config.stt.unwrap().client_id.as_deref(), Some("id"));
        assert_eq!(config.llm.unwrap().timeout_seconds, Some(10));
        assert_eq!(config.tts.unwrap().voice_id.as_deref(), Some("voice-1"));
        assert_eq!(config.call.unwrap().greeting.as_deref(), Some("Hi!"));
        assert_eq!(config.relay.unwrap().response_queue_capacity, Some(4));
        assert_eq!(
            config.guard.unwrap().blocked_terms,
            Some(vec!["shutdown".to_string(), "reboot".to_string()])
        );
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.relay.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "server:\n  port: 9000\n").unwrap();

        let config = YamlConfig::from_file(&path).unwrap();
        assert_eq!(config.server.unwrap().port, Some(9000));
    }

    #[test]
    fn test_from_file_invalid_type() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "server:\n  port: \"not a number\"\n").unwrap();

        let err = YamlConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }
}
