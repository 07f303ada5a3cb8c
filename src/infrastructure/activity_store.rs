use crate::domain::models::Activity;
use crate::infrastructure::error::RemoteError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const ACTIVITY_ID_PREFIX: &str = "00U";
const ACTIVITY_ID_MODULUS: u64 = 1_000_000_000_000_000;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// 18-character alphanumeric id in the backend's record id shape.
pub fn next_activity_id() -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let stamp = u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default();
    let value = stamp.wrapping_mul(1000).wrapping_add(sequence % 1000) % ACTIVITY_ID_MODULUS;
    format!("{ACTIVITY_ID_PREFIX}{value:015}")
}

/// The authoritative record store behind the calendar.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Activity>, RemoteError>;

    /// Upsert: an activity with an id updates that record, one without is
    /// created. Returns the id of the persisted record.
    async fn save(&self, activity: &Activity) -> Result<String, RemoteError>;
}

#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    activities: Mutex<HashMap<String, Activity>>,
}

impl InMemoryActivityStore {
    pub fn with_activities(activities: impl IntoIterator<Item = Activity>) -> Self {
        let store = Self::default();
        if let Ok(mut guard) = store.activities.lock() {
            for mut activity in activities {
                let id = activity.id.clone().unwrap_or_else(next_activity_id);
                activity.id = Some(id.clone());
                guard.insert(id, activity);
            }
        }
        store
    }

    fn lock_error(error: impl std::fmt::Display) -> RemoteError {
        RemoteError::Transport {
            message: format!("activity store lock poisoned: {error}"),
        }
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn fetch_all(&self) -> Result<Vec<Activity>, RemoteError> {
        let activities = self.activities.lock().map_err(Self::lock_error)?;
        let mut listed: Vec<Activity> = activities.values().cloned().collect();
        listed.sort_by(|left, right| left.start_at.cmp(&right.start_at).then(left.id.cmp(&right.id)));
        Ok(listed)
    }

    async fn save(&self, activity: &Activity) -> Result<String, RemoteError> {
        let mut activities = self.activities.lock().map_err(Self::lock_error)?;
        let id = match activity.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if activities.contains_key(id) => id.to_string(),
            Some(id) => {
                return Err(RemoteError::rejected(format!("activity {id} does not exist")));
            }
            None => next_activity_id(),
        };

        let mut stored = activity.clone();
        stored.id = Some(id.clone());
        activities.insert(id.clone(), stored);
        Ok(id)
    }
}
