use std::{collections::HashSet, fmt, time::Duration};

/* ------------ 房間快照 ------------ */
/// Content classification of a room. Only `AudioOnly` is produced today;
/// `Video` and `Screen` stay unconstructed until camera and screen-share
/// detection exist.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    AudioOnly,
    Video,
    Screen,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::AudioOnly => "AudioOnly",
            MediaType::Video     => "Video",
            MediaType::Screen    => "Screen",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub name:              String,
    pub participant_count: u32,
    pub media_type:        MediaType,
}

/// Drops repeated names (first wins) and orders by participant count,
/// largest first. Equal counts fall back to the room name.
pub fn order_rooms(rooms: Vec<RoomSnapshot>) -> Vec<RoomSnapshot> {
    let mut seen = HashSet::new();
    let mut rooms: Vec<_> = rooms
        .into_iter()
        .filter(|r| seen.insert(r.name.clone()))
        .collect();
    rooms.sort_by(|a, b| {
        b.participant_count
            .cmp(&a.participant_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    rooms
}

/// u64 so the sum of any number of u32 counts we will ever see fits.
pub fn total_participants(rooms: &[RoomSnapshot]) -> u64 {
    rooms.iter().map(|r| u64::from(r.participant_count)).sum()
}

/* ------------ 聽眾數 ------------ */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerCount {
    Known(u32),
    Unknown,
}

impl ListenerCount {
    pub fn known(&self) -> Option<u32> {
        match self {
            ListenerCount::Known(n) => Some(*n),
            ListenerCount::Unknown  => None,
        }
    }
}

impl fmt::Display for ListenerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerCount::Known(n) => write!(f, "{n}"),
            ListenerCount::Unknown  => f.write_str("unknown"),
        }
    }
}

/* ------------ 單房結果 / 整批摘要 ------------ */
#[derive(Debug)]
pub struct RoomOutcome {
    pub name:              String,
    pub participant_count: u32,
    pub listeners:         ListenerCount,
    pub persist_error:     Option<String>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub rooms:              usize,
    pub persisted:          usize,
    pub total_participants: u64,
    pub listener_failures:  usize,
    pub persist_failures:   usize,
    pub failed_rooms:       Vec<String>,
    pub active_egress:      Option<usize>,
    pub elapsed:            Duration,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[RoomOutcome]) -> Self {
        let mut s = RunSummary { rooms: outcomes.len(), ..Default::default() };
        for o in outcomes {
            s.total_participants += u64::from(o.participant_count);
            if o.listeners == ListenerCount::Unknown { s.listener_failures += 1; }
            match o.persist_error {
                Some(_) => s.persist_failures += 1,
                None    => s.persisted += 1,
            }
            if o.listeners == ListenerCount::Unknown || o.persist_error.is_some() {
                s.failed_rooms.push(o.name.clone());
            }
        }
        s
    }

    pub fn has_failures(&self) -> bool {
        self.listener_failures > 0 || self.persist_failures > 0
    }
}
