use crate::domain::models::{Activity, ActivityCategory, CostType};
use crate::infrastructure::activity_store::ActivityStore;
use crate::infrastructure::error::{InfraError, RemoteError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

const ACTIVITIES_SEGMENT: &str = "activities";
const REMOTE_INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Activity record as the backend controller exchanges it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ActivityRecordDto {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "StartDateTime")]
    start_date_time: String,
    #[serde(rename = "EndDateTime")]
    end_date_time: String,
    #[serde(rename = "Location", default)]
    location: Option<String>,
    #[serde(rename = "WhatId", default)]
    what_id: Option<String>,
    #[serde(rename = "WhoId", default)]
    who_id: Option<String>,
    #[serde(rename = "Cost_Type__c", default)]
    cost_type: Option<String>,
    #[serde(rename = "Cost_Amount__c", default)]
    cost_amount: Option<f64>,
    #[serde(rename = "IconType__c", default)]
    icon_type: Option<String>,
}

impl ActivityRecordDto {
    fn from_activity(activity: &Activity) -> Self {
        Self {
            id: activity.id.clone(),
            subject: activity.subject.clone(),
            start_date_time: activity.start_at.to_rfc3339(),
            end_date_time: activity.end_at.to_rfc3339(),
            location: activity.location.clone(),
            what_id: activity.primary_relation_id.clone(),
            who_id: activity.person_relation_id.clone(),
            cost_type: activity.cost_type.clone().map(String::from),
            cost_amount: activity.cost_amount,
            icon_type: activity.category.clone().map(String::from),
        }
    }

    fn into_activity(self) -> Result<Activity, RemoteError> {
        let start_at = parse_remote_instant(&self.start_date_time, "StartDateTime")?;
        let end_at = parse_remote_instant(&self.end_date_time, "EndDateTime")?;
        Ok(Activity {
            id: self.id.filter(|id| !id.trim().is_empty()),
            subject: self.subject,
            start_at,
            end_at,
            location: self.location,
            primary_relation_id: self.what_id,
            person_relation_id: self.who_id,
            cost_type: self.cost_type.map(CostType::from),
            cost_amount: self.cost_amount,
            category: self
                .icon_type
                .filter(|value| !value.trim().is_empty())
                .map(ActivityCategory::from),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    id: Option<String>,
}

// The backend may send compact offsets such as `+0000`.
fn parse_remote_instant(value: &str, field_name: &str) -> Result<DateTime<Utc>, RemoteError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, REMOTE_INSTANT_FORMAT))
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RemoteError::Malformed {
            message: format!("invalid {field_name} '{value}': {error}"),
        })
}

/// Pulls the human-readable message out of the error bodies the backend
/// returns: `{"message"}`, `[{"message"}]` or `{"body": {"message"}}`.
fn extract_body_message(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    let candidate = match &parsed {
        serde_json::Value::Array(items) => items.first().and_then(|item| item.get("message")),
        serde_json::Value::Object(_) => parsed
            .get("message")
            .or_else(|| parsed.get("body").and_then(|inner| inner.get("message"))),
        _ => None,
    };
    candidate
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[derive(Debug, Clone)]
pub struct RestActivityStore {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl RestActivityStore {
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self, InfraError> {
        Ok(Self {
            client: Client::new(),
            endpoint: Self::activities_endpoint(base_url)?,
            access_token: access_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn activities_endpoint(base_url: &str) -> Result<Url, InfraError> {
        let mut url = Url::parse(base_url.trim()).map_err(|error| {
            InfraError::InvalidConfig(format!("invalid activity store url '{base_url}': {error}"))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                InfraError::InvalidConfig(format!(
                    "activity store url '{base_url}' cannot be a base"
                ))
            })?;
            segments.pop_if_empty();
            segments.push(ACTIVITIES_SEGMENT);
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.access_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn http_error(status: StatusCode, body: &str) -> RemoteError {
        let message = extract_body_message(body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return RemoteError::Unauthorized { message };
        }
        RemoteError::Rejected {
            status: Some(status.as_u16()),
            message,
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), RemoteError> {
        let status = response.status();
        let body = response.text().await.map_err(|error| RemoteError::Transport {
            message: format!("failed reading activity store response: {error}"),
        })?;
        Ok((status, body))
    }
}

#[async_trait]
impl ActivityStore for RestActivityStore {
    async fn fetch_all(&self) -> Result<Vec<Activity>, RemoteError> {
        let response = self
            .authorize(self.client.get(self.endpoint.clone()))
            .send()
            .await
            .map_err(|error| RemoteError::Transport {
                message: format!("network error while listing activities: {error}"),
            })?;

        let (status, body) = Self::read_body(response).await?;
        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        let records: Vec<ActivityRecordDto> =
            serde_json::from_str(&body).map_err(|error| RemoteError::Malformed {
                message: format!("invalid activity list payload: {error}"),
            })?;
        records
            .into_iter()
            .map(ActivityRecordDto::into_activity)
            .collect()
    }

    async fn save(&self, activity: &Activity) -> Result<String, RemoteError> {
        let record = ActivityRecordDto::from_activity(activity);
        let response = self
            .authorize(self.client.post(self.endpoint.clone()))
            .json(&record)
            .send()
            .await
            .map_err(|error| RemoteError::Transport {
                message: format!("network error while saving activity: {error}"),
            })?;

        let (status, body) = Self::read_body(response).await?;
        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        let parsed: SaveResponse = serde_json::from_str(&body).map_err(|error| {
            RemoteError::Malformed {
                message: format!("invalid activity save payload: {error}"),
            }
        })?;
        parsed
            .id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| RemoteError::Malformed {
                message: "activity save response did not include id".to_string(),
            })
    }
}
