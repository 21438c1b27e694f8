//! 測試用：在 127.0.0.1 上跑一個假的上游服務
use axum::Router;

use crate::config::{Config, EmqxConfig, LiveKitConfig};

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

pub fn config(livekit: &str, emqx: &str) -> Config {
    Config {
        livekit: LiveKitConfig {
            host:       livekit.into(),
            api_key:    "lk-key".into(),
            api_secret: "lk-secret".into(),
        },
        emqx: EmqxConfig {
            base_url:   emqx.into(),
            api_key:    "mq-key".into(),
            api_secret: "mq-secret".into(),
        },
        database_url:    "sqlite::memory:".into(),
        concurrency:     2,
        request_timeout: std::time::Duration::from_secs(2),
        report_egress:   false,
    }
}
