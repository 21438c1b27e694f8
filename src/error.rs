use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Config: {0}")]
    Config(String),

    #[error("Collector unavailable: {0}")]
    CollectorUnavailable(#[source] Box<AppErr>),

    #[error("Upstream: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("DB: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/* ── 小助手：把任何 error 轉成 Malformed / Collector ── */
pub fn malformed<E: Display>(e: E) -> AppErr { AppErr::Malformed(e.to_string()) }
pub fn collector(e: AppErr) -> AppErr { AppErr::CollectorUnavailable(Box::new(e)) }

/* 讀完 body 後把非 2xx 包成 Status */
pub async fn status_err(resp: reqwest::Response) -> AppErr {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    AppErr::Status { status, body }
}
