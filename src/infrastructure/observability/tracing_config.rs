/// Output options for the tracing subscriber.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}

impl TracingConfig {
    /// JSON output is opted into with `LOG_FORMAT=json`; anything else
    /// keeps the human-readable layer.
    pub fn from_env(environment: String) -> Self {
        Self {
            environment,
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}
