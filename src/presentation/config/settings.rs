use std::path::PathBuf;
use std::str::FromStr;

use super::Environment;

/// Runtime configuration, read from environment variables with working
/// defaults for local development.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
    pub transcription: TranscriptionSettings,
    pub silence: SilenceSettings,
    pub image: ImageSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// When unset, all requests are admitted (local/dev mode).
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub temp_file_max_age_hours: u64,
}

#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub initial_retry_delay_ms: u64,
    pub concurrent_chunks: usize,
    pub speed_factor: f64,
    pub chunk_time_secs: f64,
    pub max_file_size_mb: u64,
    pub allowed_audio_formats: Vec<String>,
    /// Soft cap on a whole job; unset means no cap.
    pub job_deadline_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SilenceSettings {
    pub enabled: bool,
    pub threshold_db: f64,
    pub min_silence_secs: f64,
    pub window_secs: f64,
    pub min_chunk_secs: f64,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub chat_model: String,
    pub image_model: String,
    pub request_timeout_ms: u64,
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        let environment = std::env::var("APP_ENV")
            .ok()
            .and_then(|v| v.parse::<Environment>().ok())
            .unwrap_or(Environment::Local);

        Self {
            environment,
            server: ServerSettings {
                host: env_string("SERVER_HOST", "0.0.0.0"),
                port: env_parse("SERVER_PORT", 3000),
            },
            auth: AuthSettings {
                api_key: env_optional("API_KEY"),
            },
            storage: StorageSettings {
                temp_dir: PathBuf::from(env_string("TEMP_DIR", "./temp")),
                output_dir: PathBuf::from(env_string("OUTPUT_DIR", "./output")),
                temp_file_max_age_hours: env_parse("TEMP_FILE_MAX_AGE_HOURS", 24),
            },
            transcription: TranscriptionSettings {
                api_key: env_string("OPENAI_API_KEY", ""),
                base_url: env_optional("TRANSCRIPTION_BASE_URL"),
                model: env_string("WHISPER_MODEL", "whisper-1"),
                request_timeout_ms: env_parse("REQUEST_TIMEOUT", 600_000),
                max_retries: env_parse("MAX_RETRIES", 5),
                initial_retry_delay_ms: env_parse("INITIAL_RETRY_DELAY", 1_000),
                concurrent_chunks: env_parse("CONCURRENT_CHUNKS", 4),
                speed_factor: env_parse("SPEED_FACTOR", 2.0),
                chunk_time_secs: env_parse("CHUNK_TIME", 900.0),
                max_file_size_mb: env_parse("MAX_FILE_SIZE_MB", 500),
                allowed_audio_formats: env_string(
                    "ALLOWED_AUDIO_FORMATS",
                    "mp3,wav,m4a,ogg,flac,aac",
                )
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
                job_deadline_secs: env_optional("JOB_DEADLINE_SECS").and_then(|v| v.parse().ok()),
            },
            silence: SilenceSettings {
                enabled: env_string("SILENCE_CHUNKING", "false").to_lowercase() == "true",
                threshold_db: env_parse("SILENCE_THRESHOLD", -40.0),
                min_silence_secs: env_parse("SILENCE_DURATION", 0.5),
                window_secs: env_parse("SILENCE_WINDOW", 5.0),
                min_chunk_secs: env_parse("MIN_CHUNK_DURATION", 30.0),
            },
            image: ImageSettings {
                api_key: env_string("OPENAI_API_KEY", ""),
                base_url: env_optional("IMAGE_BASE_URL"),
                chat_model: env_string("CHAT_MODEL", "gpt-4o-mini"),
                image_model: env_string("IMAGE_MODEL", "gpt-image-1"),
                request_timeout_ms: env_parse("IMAGE_REQUEST_TIMEOUT", 120_000),
            },
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.transcription.max_file_size_mb * 1024 * 1024
    }

    pub fn is_allowed_audio_format(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.transcription
            .allowed_audio_formats
            .iter()
            .any(|allowed| *allowed == extension)
    }

    /// Clamp a caller-supplied speed factor into the supported range.
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        speed.clamp(1.0, 3.0)
    }
}
