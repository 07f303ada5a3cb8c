use crate::domain::datetime_codec::DateTimeCodec;
use crate::domain::error::ValidationError;
use crate::domain::models::{Activity, ActivityCategory, CostType};
use crate::domain::relation_id::validate_relation_id;
use serde::{Deserialize, Serialize};

/// Business fields carried by a display event so that a later edit can be
/// turned back into an [`Activity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEventExtension {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_relation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_relation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_type: Option<CostType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ActivityCategory>,
}

/// Event in the shape the calendar widget consumes and hands back in its
/// gesture callbacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDisplayEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, rename = "extendedProps")]
    pub extended_props: DisplayEventExtension,
}

impl CalendarDisplayEvent {
    /// Category used for icon selection: the stored one, or a guess from the
    /// title when none was stored.
    pub fn display_category(&self) -> Option<ActivityCategory> {
        self.extended_props
            .category
            .clone()
            .or_else(|| ActivityCategory::infer_from_title(&self.title))
    }

    pub fn to_payload(&self) -> ActivityPayload {
        let extension = &self.extended_props;
        ActivityPayload {
            id: self.id.clone(),
            subject: self.title.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            location: extension.location.clone(),
            primary_relation_id: extension.primary_relation_id.clone(),
            person_relation_id: extension.person_relation_id.clone(),
            cost_type: extension.cost_type.clone(),
            cost_amount: extension.cost_amount.map(|amount| amount.to_string()),
            category: extension.category.clone(),
        }
    }
}

/// Loosely-typed record built from a widget payload or a form draft:
/// instants are widget strings and the cost amount is raw text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivityPayload {
    pub id: Option<String>,
    pub subject: String,
    pub start: String,
    pub end: String,
    pub location: Option<String>,
    pub primary_relation_id: Option<String>,
    pub person_relation_id: Option<String>,
    pub cost_type: Option<CostType>,
    pub cost_amount: Option<String>,
    pub category: Option<ActivityCategory>,
}

/// Empty input means "no cost"; anything else must be a finite,
/// non-negative number.
pub fn coerce_cost_amount(raw: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let amount = raw
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidCost(raw.to_string()))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::InvalidCost(raw.to_string()));
    }
    Ok(Some(amount))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventRecordNormalizer {
    codec: DateTimeCodec,
}

impl EventRecordNormalizer {
    pub fn new(codec: DateTimeCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &DateTimeCodec {
        &self.codec
    }

    pub fn to_display(&self, activity: &Activity) -> CalendarDisplayEvent {
        CalendarDisplayEvent {
            id: activity.id.clone(),
            title: activity.subject.clone(),
            start: self.codec.format_widget_instant(activity.start_at),
            end: self.codec.format_widget_instant(activity.end_at),
            all_day: false,
            extended_props: DisplayEventExtension {
                location: activity.location.clone(),
                primary_relation_id: validate_relation_id(activity.primary_relation_id.as_deref()),
                person_relation_id: validate_relation_id(activity.person_relation_id.as_deref()),
                cost_type: activity.cost_type.clone(),
                cost_amount: activity.cost_amount,
                category: activity.category.clone(),
            },
        }
    }

    pub fn to_activity(&self, payload: &ActivityPayload) -> Result<Activity, ValidationError> {
        if payload.subject.trim().is_empty() {
            return Err(ValidationError::MissingSubject);
        }

        let start_at = self.codec.parse_widget_instant(&payload.start)?;
        let end_at = self.codec.parse_widget_instant(&payload.end)?;
        let cost_amount = coerce_cost_amount(payload.cost_amount.as_deref())?;
        if end_at <= start_at {
            return Err(ValidationError::InvalidRange {
                start: payload.start.clone(),
                end: payload.end.clone(),
            });
        }

        let id = payload
            .id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);

        Ok(Activity {
            id,
            subject: payload.subject.clone(),
            start_at,
            end_at,
            location: payload.location.clone(),
            primary_relation_id: validate_relation_id(payload.primary_relation_id.as_deref()),
            person_relation_id: validate_relation_id(payload.person_relation_id.as_deref()),
            cost_type: payload.cost_type.clone(),
            cost_amount,
            category: payload.category.clone(),
        })
    }
}
