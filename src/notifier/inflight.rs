use std::collections::HashSet;
use std::sync::Mutex;

/// Tracks subscriptions currently being processed so overlapping polling
/// passes never double-handle the same record.
pub struct InFlight {
    active: Mutex<HashSet<(String, String)>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(HashSet::new()),
        }
    }

    /// False when the subscription is already being processed.
    pub fn begin(&self, guild_id: &str, youtube_channel_id: &str) -> bool {
        let mut active = self.active.lock().unwrap();
        active.insert((guild_id.to_string(), youtube_channel_id.to_string()))
    }

    pub fn end(&self, guild_id: &str, youtube_channel_id: &str) {
        let mut active = self.active.lock().unwrap();
        active.remove(&(guild_id.to_string(), youtube_channel_id.to_string()));
    }
}
