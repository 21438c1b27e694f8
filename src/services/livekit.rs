// src/services/livekit.rs

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    config::LiveKitConfig,
    error::{collector, malformed, status_err, AppResult},
    state::{order_rooms, total_participants, MediaType, RoomSnapshot},
    utils::jwt::{self, VideoGrant},
};

/// Twirp client for the two LiveKit calls this job needs.
pub struct RoomService {
    http: Client,
    cfg:  LiveKitConfig,
}

#[derive(Deserialize)]
struct ListRoomsResp {
    #[serde(default)]
    rooms: Vec<LkRoom>,
}

#[derive(Deserialize)]
struct LkRoom {
    name: String,
    // protojson 省略 0
    #[serde(default, alias = "numParticipants")]
    num_participants: u32,
}

#[derive(Deserialize)]
struct ListEgressResp {
    #[serde(default)]
    items: Vec<Value>,
}

impl RoomService {
    pub fn new(cfg: &LiveKitConfig, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, cfg: cfg.clone() })
    }

    async fn twirp<T: DeserializeOwned>(
        &self,
        service: &str,
        method: &str,
        grant: VideoGrant,
        body: Value,
    ) -> AppResult<T> {
        let token = jwt::sign(&self.cfg.api_key, &self.cfg.api_secret, grant)?;
        let url = format!("{}/twirp/livekit.{service}/{method}", self.cfg.host);

        let resp = self.http.post(&url).bearer_auth(token).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(status_err(resp).await);
        }
        let raw = resp.bytes().await?;
        serde_json::from_slice(&raw).map_err(malformed)
    }

    /// Raw listing, in whatever order the server returns.
    pub async fn list_rooms(&self) -> AppResult<Vec<RoomSnapshot>> {
        let grant = VideoGrant { room_list: true, ..Default::default() };
        let resp: ListRoomsResp = self.twirp("RoomService", "ListRooms", grant, json!({})).await?;
        Ok(resp
            .rooms
            .into_iter()
            .map(|r| RoomSnapshot {
                name:              r.name,
                participant_count: r.num_participants,
                media_type:        MediaType::AudioOnly,
            })
            .collect())
    }

    pub async fn list_active_egress(&self) -> AppResult<usize> {
        let grant = VideoGrant { room_record: true, ..Default::default() };
        let resp: ListEgressResp = self
            .twirp("Egress", "ListEgress", grant, json!({ "active": true }))
            .await?;
        Ok(resp.items.len())
    }
}

/* ---------------- Collector ---------------- */
pub async fn collect_live_rooms(svc: &RoomService) -> AppResult<Vec<RoomSnapshot>> {
    let rooms = order_rooms(svc.list_rooms().await.map_err(collector)?);
    for r in &rooms {
        info!(room = %r.name, participants = r.participant_count, media = %r.media_type, "live room");
    }
    debug!(rooms = rooms.len(), total = total_participants(&rooms), "collected live rooms");
    Ok(rooms)
}
