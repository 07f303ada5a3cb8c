use crate::domain::models::Activity;
use crate::infrastructure::activity_store::ActivityStore;
use crate::infrastructure::error::InfraError;
use std::sync::Arc;
use tracing::{info, warn};

/// Single seam between the calendar and the activity store. One round trip
/// per call and no retries.
pub struct ActivityPersistenceGateway<S>
where
    S: ActivityStore + ?Sized,
{
    store: Arc<S>,
}

impl<S> Clone for ActivityPersistenceGateway<S>
where
    S: ActivityStore + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ActivityPersistenceGateway<S>
where
    S: ActivityStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Activity>, InfraError> {
        match self.store.fetch_all().await {
            Ok(activities) => {
                info!(count = activities.len(), "fetched activities");
                Ok(activities)
            }
            Err(error) => {
                warn!(error = %error, "activity fetch failed");
                Err(InfraError::FetchFailed(error))
            }
        }
    }

    /// Rejects an activity that breaks the model invariants before it
    /// reaches the store.
    pub async fn save(&self, activity: &Activity) -> Result<String, InfraError> {
        let is_update = activity.is_persisted();
        if let Err(error) = activity.validate() {
            warn!(error = %error, update = is_update, "refused to save invalid activity");
            return Err(error.into());
        }
        match self.store.save(activity).await {
            Ok(id) => {
                info!(id = %id, update = is_update, "saved activity");
                Ok(id)
            }
            Err(error) => {
                warn!(error = %error, update = is_update, "activity save failed");
                Err(InfraError::SaveFailed(error))
            }
        }
    }
}
