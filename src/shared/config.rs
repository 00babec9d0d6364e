//! Application configuration. Backend URL, data paths, callback listener.

use serde::Deserialize;

/// Default port for the loopback authorization callback listener.
pub const DEFAULT_CALLBACK_PORT: u16 = 53682;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Backend base URL. Read from DROPSYNC_API_URL.
    pub api_url: Option<String>,

    /// Directory holding the persisted connection record. Read from DROPSYNC_DATA_DIR.
    pub data_dir: Option<String>,

    /// Bind host for the loopback callback listener. Read from DROPSYNC_CALLBACK_HOST.
    #[serde(default)]
    pub callback_host: Option<String>,

    /// Bind port for the loopback callback listener. Read from DROPSYNC_CALLBACK_PORT.
    #[serde(default)]
    pub callback_port: Option<u16>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("DROPSYNC"));
        if let Ok(path) = std::env::var("DROPSYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Backend base URL without a trailing slash. Defaults to the local
    /// development server.
    pub fn api_url_or_default(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Directory for the persisted connection record. Defaults to ./data.
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Bind address for the callback listener.
    pub fn callback_addr(&self) -> String {
        format!(
            "{}:{}",
            self.callback_host.as_deref().unwrap_or("127.0.0.1"),
            self.callback_port.unwrap_or(DEFAULT_CALLBACK_PORT)
        )
    }
}
