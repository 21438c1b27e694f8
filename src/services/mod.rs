pub mod emqx;
pub mod livekit;

pub use emqx::ListenerService;
pub use livekit::{collect_live_rooms, RoomService};
