use crate::domain::models::{Activity, ActivityCategory, CostType};
use crate::infrastructure::activity_store::{next_activity_id, ActivityStore};
use crate::infrastructure::error::{InfraError, RemoteError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use tracing::debug;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
const SELECT_ACTIVITIES_SQL: &str = "SELECT id, subject, start_at, end_at, location,
        primary_relation_id, person_relation_id, cost_type, cost_amount, category
     FROM activities
     ORDER BY start_at, id";

#[derive(Debug, Clone)]
pub struct SqliteActivityStore {
    db_path: PathBuf,
}

impl SqliteActivityStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Creates the activities table if it does not exist yet.
    pub fn initialize(&self) -> Result<(), InfraError> {
        let connection = Connection::open(&self.db_path)?;
        connection.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn connect(db_path: &Path) -> Result<Connection, RemoteError> {
        Connection::open(db_path).map_err(Self::sqlite_error)
    }

    fn sqlite_error(error: rusqlite::Error) -> RemoteError {
        RemoteError::Transport {
            message: format!("sqlite error: {error}"),
        }
    }

    fn load_all(db_path: &Path) -> Result<Vec<Activity>, RemoteError> {
        let connection = Self::connect(db_path)?;
        let mut statement = connection
            .prepare(SELECT_ACTIVITIES_SQL)
            .map_err(Self::sqlite_error)?;
        let rows = statement
            .query_map([], read_row)
            .map_err(Self::sqlite_error)?;

        let mut activities = Vec::new();
        for row in rows {
            let raw = row.map_err(Self::sqlite_error)?;
            activities.push(raw.into_activity()?);
        }
        Ok(activities)
    }

    fn upsert(db_path: &Path, activity: &Activity) -> Result<String, RemoteError> {
        let connection = Self::connect(db_path)?;
        let existing_id = activity
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let start_at = activity.start_at.to_rfc3339();
        let end_at = activity.end_at.to_rfc3339();
        let cost_type = activity.cost_type.as_ref().map(CostType::as_str);
        let category = activity.category.as_ref().map(ActivityCategory::as_str);

        match existing_id {
            Some(id) => {
                let updated = connection
                    .execute(
                        "UPDATE activities SET
                           subject = ?2,
                           start_at = ?3,
                           end_at = ?4,
                           location = ?5,
                           primary_relation_id = ?6,
                           person_relation_id = ?7,
                           cost_type = ?8,
                           cost_amount = ?9,
                           category = ?10
                         WHERE id = ?1",
                        params![
                            id,
                            activity.subject,
                            start_at,
                            end_at,
                            activity.location,
                            activity.primary_relation_id,
                            activity.person_relation_id,
                            cost_type,
                            activity.cost_amount,
                            category
                        ],
                    )
                    .map_err(Self::sqlite_error)?;
                if updated == 0 {
                    return Err(RemoteError::rejected(format!("activity {id} does not exist")));
                }
                Ok(id.to_string())
            }
            None => {
                let id = next_activity_id();
                connection
                    .execute(
                        "INSERT INTO activities (
                           id, subject, start_at, end_at, location,
                           primary_relation_id, person_relation_id, cost_type, cost_amount, category
                         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                        params![
                            id,
                            activity.subject,
                            start_at,
                            end_at,
                            activity.location,
                            activity.primary_relation_id,
                            activity.person_relation_id,
                            cost_type,
                            activity.cost_amount,
                            category
                        ],
                    )
                    .map_err(Self::sqlite_error)?;
                Ok(id)
            }
        }
    }
}

struct ActivityRow {
    id: String,
    subject: String,
    start_at: String,
    end_at: String,
    location: Option<String>,
    primary_relation_id: Option<String>,
    person_relation_id: Option<String>,
    cost_type: Option<String>,
    cost_amount: Option<f64>,
    category: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ActivityRow> {
    Ok(ActivityRow {
        id: row.get(0)?,
        subject: row.get(1)?,
        start_at: row.get(2)?,
        end_at: row.get(3)?,
        location: row.get(4)?,
        primary_relation_id: row.get(5)?,
        person_relation_id: row.get(6)?,
        cost_type: row.get(7)?,
        cost_amount: row.get(8)?,
        category: row.get(9)?,
    })
}

impl ActivityRow {
    fn into_activity(self) -> Result<Activity, RemoteError> {
        let start_at = parse_stored_instant(&self.start_at, "start_at")?;
        let end_at = parse_stored_instant(&self.end_at, "end_at")?;
        Ok(Activity {
            id: Some(self.id),
            subject: self.subject,
            start_at,
            end_at,
            location: self.location,
            primary_relation_id: self.primary_relation_id,
            person_relation_id: self.person_relation_id,
            cost_type: self.cost_type.map(CostType::from),
            cost_amount: self.cost_amount,
            category: self.category.map(ActivityCategory::from),
        })
    }
}

fn parse_stored_instant(value: &str, field_name: &str) -> Result<DateTime<Utc>, RemoteError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RemoteError::Malformed {
            message: format!("invalid activities.{field_name} '{value}': {error}"),
        })
}

#[async_trait]
impl ActivityStore for SqliteActivityStore {
    async fn fetch_all(&self) -> Result<Vec<Activity>, RemoteError> {
        let db_path = self.db_path.clone();
        let activities = tokio::task::spawn_blocking(move || Self::load_all(&db_path))
            .await
            .map_err(|error| RemoteError::Transport {
                message: format!("sqlite worker failed: {error}"),
            })??;
        debug!(count = activities.len(), "loaded activities from sqlite");
        Ok(activities)
    }

    async fn save(&self, activity: &Activity) -> Result<String, RemoteError> {
        let db_path = self.db_path.clone();
        let activity = activity.clone();
        tokio::task::spawn_blocking(move || Self::upsert(&db_path, &activity))
            .await
            .map_err(|error| RemoteError::Transport {
                message: format!("sqlite worker failed: {error}"),
            })?
    }
}
