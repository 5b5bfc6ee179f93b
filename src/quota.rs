use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::Mutex;

/// Gate armed when the YouTube API reports daily quota exhaustion.
/// While armed, lookups skip the API entirely instead of burning calls.
pub struct QuotaGate {
    blocked_until: Mutex<Option<DateTime<Utc>>>,
}

impl QuotaGate {
    pub fn new() -> Self {
        Self {
            blocked_until: Mutex::new(None),
        }
    }

    pub fn is_blocked(&self) -> bool {
        let mut blocked_until = self.blocked_until.lock().unwrap();
        match *blocked_until {
            Some(deadline) if Utc::now() >= deadline => {
                *blocked_until = None;
                tracing::info!("[quota] Quota reset");
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn block_until_reset(&self) {
        let deadline = next_pacific_midnight();
        let mut blocked_until = self.blocked_until.lock().unwrap();
        *blocked_until = Some(deadline);
        tracing::warn!("[quota] Quota exceeded. Lookups paused until {}", deadline);
    }
}

// The YouTube Data API quota resets at midnight Pacific Time.
// A fixed UTC-8 offset is close enough for a resume point.
fn next_pacific_midnight() -> DateTime<Utc> {
    let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
    let tomorrow = Utc::now().with_timezone(&pacific).date_naive() + Duration::days(1);
    tomorrow
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_local_timezone(pacific)
        .unwrap()
        .with_timezone(&Utc)
}
