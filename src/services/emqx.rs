// src/services/emqx.rs

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::EmqxConfig,
    error::{malformed, status_err, AppResult},
};

#[derive(Deserialize)]
struct Meta {
    #[serde(default)]
    count: u32,
}

#[derive(Deserialize)]
struct SubscriptionsResp {
    meta: Meta,
}

pub fn listener_topic(room: &str) -> String {
    format!("room/{room}/listener")
}

/// Asks the broker how many clients subscribe to a room's listener topic.
pub struct ListenerService {
    http: Client,
    cfg:  EmqxConfig,
}

impl ListenerService {
    pub fn new(cfg: &EmqxConfig, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, cfg: cfg.clone() })
    }

    pub async fn listener_count(&self, room: &str) -> AppResult<u32> {
        let url = format!("{}/api/v5/subscriptions", self.cfg.base_url);
        let topic = listener_topic(room);

        let resp = self
            .http
            .get(&url)
            .query(&[("topic", topic.as_str()), ("limit", "1")])
            .basic_auth(&self.cfg.api_key, Some(&self.cfg.api_secret))
            .send()
            .await?;

        // 非 2xx 就算查詢失敗
        if !resp.status().is_success() {
            return Err(status_err(resp).await);
        }

        let raw = resp.bytes().await?;
        let parsed: SubscriptionsResp = serde_json::from_slice(&raw).map_err(malformed)?;
        Ok(parsed.meta.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppErr, utils::mock};
    use axum::{extract::Query, http::{HeaderMap, StatusCode}, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    // "mq-key:mq-secret"
    const EXPECTED_AUTH: &str = "Basic bXEta2V5Om1xLXNlY3JldA==";

    async fn subscriptions(
        headers: HeaderMap,
        Query(q): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(EXPECTED_AUTH) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "code": "BAD_API_KEY_OR_SECRET" })));
        }
        if q.get("limit").map(String::as_str) != Some("1") {
            return (StatusCode::BAD_REQUEST, Json(json!({})));
        }
        match q.get("topic").map(String::as_str) {
            Some("room/lobby/listener")      => (StatusCode::OK, Json(json!({ "data": [{}], "meta": { "count": 7, "page": 1, "limit": 1 } }))),
            Some("room/quiet room/listener") => (StatusCode::OK, Json(json!({ "data": [], "meta": { "count": 0 } }))),
            Some("room/nocount/listener")    => (StatusCode::OK, Json(json!({ "data": [], "meta": { "page": 1 } }))),
            Some("room/weird/listener")      => (StatusCode::OK, Json(json!({ "data": [] }))),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "code": "INTERNAL_ERROR" }))),
        }
    }

    async fn service() -> ListenerService {
        let app = Router::new().route("/api/v5/subscriptions", get(subscriptions));
        let base = mock::serve(app).await;
        let cfg = mock::config("http://unused", &base);
        ListenerService::new(&cfg.emqx, cfg.request_timeout).unwrap()
    }

    #[test]
    fn topic_layout() {
        assert_eq!(listener_topic("abc"), "room/abc/listener");
    }

    #[tokio::test]
    async fn reads_meta_count() {
        let svc = service().await;
        assert_eq!(svc.listener_count("lobby").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn zero_and_absent_count_are_zero() {
        let svc = service().await;
        assert_eq!(svc.listener_count("quiet room").await.unwrap(), 0);
        assert_eq!(svc.listener_count("nocount").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_meta_is_malformed() {
        let svc = service().await;
        assert!(matches!(svc.listener_count("weird").await, Err(AppErr::Malformed(_))));
    }

    #[tokio::test]
    async fn non_2xx_is_status_error() {
        let svc = service().await;
        match svc.listener_count("broken").await {
            Err(AppErr::Status { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_broker_is_upstream_error() {
        let cfg = mock::config("http://unused", "http://127.0.0.1:1");
        let svc = ListenerService::new(&cfg.emqx, cfg.request_timeout).unwrap();
        assert!(matches!(svc.listener_count("lobby").await, Err(AppErr::Upstream(_))));
    }
}
