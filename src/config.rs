//! config.rs — 啟動時讀一次環境變數，之後只傳 Config
use std::{fmt, time::Duration};

use crate::error::{AppErr, AppResult};

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const REDACTED: &str = "***";

#[derive(Clone)]
pub struct LiveKitConfig {
    /// http(s) base url, ws schemes already mapped
    pub host:       String,
    pub api_key:    String,
    pub api_secret: String,
}

#[derive(Clone)]
pub struct EmqxConfig {
    pub base_url:   String,
    pub api_key:    String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub livekit:         LiveKitConfig,
    pub emqx:            EmqxConfig,
    pub database_url:    String,
    pub concurrency:     usize,
    pub request_timeout: Duration,
    pub report_egress:   bool,
}

/* secret 不進 log */
impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("host", &self.host)
            .field("api_key", &self.api_key)
            .field("api_secret", &REDACTED)
            .finish()
    }
}

impl fmt::Debug for EmqxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmqxConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &REDACTED)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from any key lookup. Every missing required key is
    /// reported in a single error.
    pub fn from_lookup<F>(get: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut need = |key: &'static str| -> String {
            match get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                Some(v) => v,
                None => { missing.push(key); String::new() }
            }
        };

        let lk_host    = need("LIVEKIT_HOST");
        let lk_key     = need("LIVEKIT_API_KEY");
        let lk_secret  = need("LIVEKIT_API_KEY_SECRET");
        let mq_host    = need("EMQX_HOST");
        let mq_port    = need("EMQX_PORT");
        let mq_key     = need("EMQX_API_KEY");
        let mq_secret  = need("EMQX_API_SECRET");
        let db_url     = need("DATABASE_URL");

        if !missing.is_empty() {
            return Err(AppErr::Config(format!("missing {}", missing.join(", "))));
        }

        let port: u16 = mq_port
            .parse()
            .map_err(|_| AppErr::Config(format!("EMQX_PORT is not a port: {mq_port}")))?;

        let concurrency = match get("REPORT_CONCURRENCY") {
            Some(v) => v.trim().parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                AppErr::Config(format!("REPORT_CONCURRENCY must be a positive integer: {v}"))
            })?,
            None => DEFAULT_CONCURRENCY,
        };

        let timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().ok().filter(|n| *n > 0).ok_or_else(|| {
                AppErr::Config(format!("REQUEST_TIMEOUT_SECS must be a positive integer: {v}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let report_egress = match get("REPORT_EGRESS").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(v) => return Err(AppErr::Config(format!("REPORT_EGRESS must be true/false: {v}"))),
        };

        Ok(Config {
            livekit: LiveKitConfig {
                host:       http_base(&lk_host),
                api_key:    lk_key,
                api_secret: lk_secret,
            },
            emqx: EmqxConfig {
                base_url:   emqx_base(&mq_host, port),
                api_key:    mq_key,
                api_secret: mq_secret,
            },
            database_url: db_url,
            concurrency,
            request_timeout: Duration::from_secs(timeout_secs),
            report_egress,
        })
    }
}

/* LiveKit 常給 ws(s)://，Twirp 要走 http(s) */
fn http_base(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if let Some(rest) = host.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = host.strip_prefix("ws://") {
        format!("http://{rest}")
    } else if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn emqx_base(host: &str, port: u16) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}
