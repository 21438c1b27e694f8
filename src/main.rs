mod config;
mod error;
mod report;
mod services;
mod state;
mod store;
mod utils {
    pub mod jwt;
    #[cfg(test)]
    pub mod mock;
}

use anyhow::Context;
use std::{process::ExitCode, time::Instant};
use tracing::{error, info, warn, Instrument};
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    services::{collect_live_rooms, ListenerService, RoomService},
    state::RunSummary,
    store::Store,
};

/// 有房間對帳失敗時的結束碼
const EXIT_PARTIAL: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env().context("loading configuration")?;

    let run_id = uuid::Uuid::new_v4();
    let summary = run(&cfg).instrument(tracing::info_span!("run", %run_id)).await?;

    if summary.has_failures() {
        warn!(
            listener_failures = summary.listener_failures,
            persist_failures = summary.persist_failures,
            rooms = ?summary.failed_rooms,
            "run finished with room failures"
        );
    }
    Ok(ExitCode::from(exit_status(&summary)))
}

/// 0 when every room went through, `EXIT_PARTIAL` otherwise. Errors that end
/// the run early never get here: `main` returns them and the process exits 1.
fn exit_status(summary: &RunSummary) -> u8 {
    if summary.has_failures() { EXIT_PARTIAL } else { 0 }
}

async fn run(cfg: &Config) -> anyhow::Result<RunSummary> {
    let store = Store::connect(&cfg.database_url).await.context("opening room store")?;
    run_with_store(cfg, &store).await
}

/// Runs the batch and closes `store` whatever the outcome.
async fn run_with_store(cfg: &Config, store: &Store) -> anyhow::Result<RunSummary> {
    let res = build_and_reconcile(cfg, store).await;
    // store 一定要關，不管中間有沒有出錯
    store.close().await;
    res
}

async fn build_and_reconcile(cfg: &Config, store: &Store) -> anyhow::Result<RunSummary> {
    let rooms_api = RoomService::new(&cfg.livekit, cfg.request_timeout)?;
    let listeners = ListenerService::new(&cfg.emqx, cfg.request_timeout)?;
    reconcile_run(cfg, &rooms_api, &listeners, store).await
}

async fn reconcile_run(
    cfg: &Config,
    rooms_api: &RoomService,
    listeners: &ListenerService,
    store: &Store,
) -> anyhow::Result<RunSummary> {
    let started = Instant::now();

    let rooms = collect_live_rooms(rooms_api).await?;
    let outcomes = report::reconcile_all(&rooms, listeners, store, cfg.concurrency).await;

    let mut summary = RunSummary::from_outcomes(&outcomes);
    if cfg.report_egress {
        match rooms_api.list_active_egress().await {
            Ok(n) => summary.active_egress = Some(n),
            Err(e) => error!(error = %e, "listing active egress failed"),
        }
    }
    summary.elapsed = started.elapsed();

    info!(
        rooms = summary.rooms,
        persisted = summary.persisted,
        total_participants = summary.total_participants,
        active_egress = ?summary.active_egress,
        elapsed = ?summary.elapsed,
        "room counts updated"
    );
    Ok(summary)
}
