use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- History Store Args ---
    /// Conversation history store type (memory, redis)
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// History store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for Redis history keys.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "history:")]
    pub history_redis_prefix: String,

    /// Number of messages returned by the conversation endpoint when no limit is given.
    #[arg(long, env = "HISTORY_DEFAULT_LIMIT", default_value = "50")]
    pub history_default_limit: usize,

    // --- Persistence Args ---
    /// Record storage type for buddy requests, meetings and check-ins (memory, redis)
    #[arg(long, env = "PERSISTENCE_TYPE", default_value = "memory")]
    pub persistence_type: String,

    /// Record storage host endpoint (e.g., redis://127.0.0.1:6379/2)
    #[arg(long, env = "PERSISTENCE_HOST", default_value = "redis://127.0.0.1:6379/2")] // Use DB 2 to avoid collision
    pub persistence_host: String,

    /// Prefix for Redis record keys.
    #[arg(long, env = "PERSISTENCE_REDIS_PREFIX", default_value = "records:")]
    pub persistence_redis_prefix: String,

    // --- Assistant Args ---
    /// Optional path to a JSON intent rule file. The built-in table is used when unset.
    #[arg(long, env = "RULES_PATH")]
    pub rules_path: Option<String>,

    /// Lower bound of the simulated typing delay in milliseconds.
    #[arg(long, env = "TYPING_DELAY_MIN_MS", default_value = "1000")]
    pub typing_delay_min_ms: u64,

    /// Upper bound of the simulated typing delay in milliseconds. 0 disables the delay.
    #[arg(long, env = "TYPING_DELAY_MAX_MS", default_value = "2000")]
    pub typing_delay_max_ms: u64,

    // --- Sensor Args ---
    /// Do not run the simulated biometric sensor.
    #[arg(long, env = "DISABLE_SENSORS", default_value = "false")]
    pub disable_sensors: bool,

    /// Interval between simulated biometric readings in milliseconds.
    #[arg(long, env = "SENSOR_INTERVAL_MS", default_value = "3000")]
    pub sensor_interval_ms: u64,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional shared secret for signed WebSocket handshakes. If set, clients must send `ts` and `sig` query parameters.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Optional port for the HTTP JSON API.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Optional path to the TLS certificate file (PEM format) for enabling WSS/HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling WSS/HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn tls_enabled(&self) -> bool {
        self.enable_tls && self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }
}
