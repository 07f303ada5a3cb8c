use crate::domain::datetime_codec::{DateTimeCodec, DateTimeParts};
use crate::domain::error::ValidationError;
use crate::domain::models::{Activity, ActivityCategory, CostType, PaletteItem, RecordKind};
use crate::domain::relation_id::{parse_relation_id, validate_relation_id};
use crate::infrastructure::event_mapper::{
    coerce_cost_amount, ActivityPayload, CalendarDisplayEvent, EventRecordNormalizer,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

pub const RANGE_DEFAULT_SUBJECT: &str = "New event";

static COST_INPUT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]*$").expect("COST_INPUT_REGEX should compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Form-shaped projection of an activity: split date/time fields and raw
/// text for everything the user types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFormDraft {
    pub id: Option<String>,
    pub subject: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub location: String,
    pub primary_relation_id: String,
    pub person_relation_id: String,
    pub cost_type: Option<CostType>,
    pub cost_amount: String,
    pub category: Option<ActivityCategory>,
    /// Instants the draft was built from. A wall time that occurs twice
    /// around a DST fall-back resolves to the occurrence nearest these.
    pub start_reference: Option<DateTime<Utc>>,
    pub end_reference: Option<DateTime<Utc>>,
}

impl EventFormDraft {
    fn with_range(codec: &DateTimeCodec, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let DateTimeParts {
            date: start_date,
            time: start_time,
        } = codec.split_instant(start);
        let DateTimeParts {
            date: end_date,
            time: end_time,
        } = codec.split_instant(end);
        Self {
            start_date,
            start_time,
            end_date,
            end_time,
            start_reference: Some(start),
            end_reference: Some(end),
            ..Self::default()
        }
    }

    /// Draft for a palette item dropped at `instant`; start and end coincide.
    pub fn for_drop(codec: &DateTimeCodec, item: &PaletteItem, instant: DateTime<Utc>) -> Self {
        let mut draft = Self::with_range(codec, instant, instant);
        match item {
            PaletteItem::Category { category } => {
                draft.subject = format!("{category} event");
                draft.category = Some(category.clone());
            }
            PaletteItem::Record { kind, id, name } => {
                draft.subject = name.trim().to_string();
                let relation_id = validate_relation_id(Some(id.as_str())).unwrap_or_default();
                match kind {
                    RecordKind::Account | RecordKind::Opportunity => {
                        draft.primary_relation_id = relation_id;
                    }
                    RecordKind::Contact => draft.person_relation_id = relation_id,
                }
            }
        }
        draft
    }

    pub fn for_range(codec: &DateTimeCodec, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            subject: RANGE_DEFAULT_SUBJECT.to_string(),
            ..Self::with_range(codec, start, end)
        }
    }

    /// Edit draft for a clicked event. Relation ids that fail validation and
    /// instants the codec cannot read come through blank.
    pub fn from_display(codec: &DateTimeCodec, event: &CalendarDisplayEvent) -> Self {
        let split = |instant: Option<DateTime<Utc>>| {
            instant
                .map(|instant| codec.split_instant(instant))
                .unwrap_or(DateTimeParts {
                    date: String::new(),
                    time: String::new(),
                })
        };
        let start_reference = codec.parse_widget_instant(&event.start).ok();
        let end_reference = codec.parse_widget_instant(&event.end).ok();
        let start = split(start_reference);
        let end = split(end_reference);
        let extension = &event.extended_props;

        Self {
            id: event.id.clone(),
            subject: event.title.clone(),
            start_date: start.date,
            start_time: start.time,
            end_date: end.date,
            end_time: end.time,
            location: extension.location.clone().unwrap_or_default(),
            primary_relation_id: validate_relation_id(extension.primary_relation_id.as_deref())
                .unwrap_or_default(),
            person_relation_id: validate_relation_id(extension.person_relation_id.as_deref())
                .unwrap_or_default(),
            cost_type: extension.cost_type.clone(),
            cost_amount: extension
                .cost_amount
                .map(|amount| amount.to_string())
                .unwrap_or_default(),
            category: extension.category.clone(),
            start_reference,
            end_reference,
        }
    }
}

/// One edit coming from a form input.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Subject(String),
    StartDate(String),
    StartTime(String),
    EndDate(String),
    EndTime(String),
    Location(String),
    PrimaryRelationId(String),
    PersonRelationId(String),
    CostType(Option<CostType>),
    CostAmount(String),
    Category(Option<ActivityCategory>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Closed,
    Open {
        mode: FormMode,
        draft: EventFormDraft,
    },
    Saving {
        mode: FormMode,
        draft: EventFormDraft,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationField {
    Primary,
    Person,
}

impl fmt::Display for RelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("related record"),
            Self::Person => f.write_str("related person"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormWarning {
    #[error("{field} id '{value}' is not a valid record id and was cleared")]
    RelationIdDiscarded { field: RelationField, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("event form is not open")]
    NotOpen,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A validated draft, ready to hand to the persistence gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub activity: Activity,
    pub mode: FormMode,
    pub warnings: Vec<FormWarning>,
}

#[derive(Debug, Default)]
pub struct EventFormController {
    state: FormState,
    normalizer: EventRecordNormalizer,
    cost_amount_invalid: bool,
}

impl EventFormController {
    pub fn new(normalizer: EventRecordNormalizer) -> Self {
        Self {
            state: FormState::Closed,
            normalizer,
            cost_amount_invalid: false,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, FormState::Open { .. })
    }

    pub fn mode(&self) -> Option<FormMode> {
        match &self.state {
            FormState::Closed => None,
            FormState::Open { mode, .. } | FormState::Saving { mode, .. } => Some(*mode),
        }
    }

    pub fn draft(&self) -> Option<&EventFormDraft> {
        match &self.state {
            FormState::Closed => None,
            FormState::Open { draft, .. } | FormState::Saving { draft, .. } => Some(draft),
        }
    }

    pub fn cost_amount_invalid(&self) -> bool {
        self.cost_amount_invalid
    }

    /// Opens the modal with `draft`, replacing whatever was open before.
    /// The cost guard only reacts to typed input, so a stored decimal amount
    /// opens unflagged.
    pub fn open(&mut self, mode: FormMode, draft: EventFormDraft) {
        self.cost_amount_invalid = false;
        self.state = FormState::Open { mode, draft };
    }

    /// Applies one input edit. Returns false when no draft is editable.
    pub fn update(&mut self, field: FormField) -> bool {
        let FormState::Open { draft, .. } = &mut self.state else {
            return false;
        };
        match field {
            FormField::Subject(value) => draft.subject = value,
            FormField::StartDate(value) => draft.start_date = value,
            FormField::StartTime(value) => draft.start_time = value,
            FormField::EndDate(value) => draft.end_date = value,
            FormField::EndTime(value) => draft.end_time = value,
            FormField::Location(value) => draft.location = value,
            FormField::PrimaryRelationId(value) => draft.primary_relation_id = value,
            FormField::PersonRelationId(value) => draft.person_relation_id = value,
            FormField::CostType(value) => draft.cost_type = value,
            FormField::CostAmount(value) => {
                self.cost_amount_invalid = !COST_INPUT_REGEX.is_match(&value);
                draft.cost_amount = value;
            }
            FormField::Category(value) => draft.category = value,
        }
        true
    }

    /// Validates the open draft and moves the form to `Saving`. On a
    /// validation failure the form stays open with the draft untouched.
    pub fn submit(&mut self) -> Result<SaveRequest, FormError> {
        let FormState::Open { mode, draft } = &self.state else {
            return Err(FormError::NotOpen);
        };
        let mode = *mode;
        let (activity, warnings) = self.build_activity(draft)?;

        if let FormState::Open { draft, .. } = std::mem::take(&mut self.state) {
            self.state = FormState::Saving { mode, draft };
        }
        Ok(SaveRequest {
            activity,
            mode,
            warnings,
        })
    }

    pub fn complete_save(&mut self) {
        if matches!(self.state, FormState::Saving { .. }) {
            self.close();
        }
    }

    pub fn fail_save(&mut self) {
        if let FormState::Saving { mode, draft } = std::mem::take(&mut self.state) {
            self.state = FormState::Open { mode, draft };
        }
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.state = FormState::Closed;
        self.cost_amount_invalid = false;
    }

    fn build_activity(
        &self,
        draft: &EventFormDraft,
    ) -> Result<(Activity, Vec<FormWarning>), ValidationError> {
        if draft.subject.trim().is_empty() {
            return Err(ValidationError::MissingSubject);
        }
        let codec = self.normalizer.codec();
        let start_at =
            codec.join_parts_near(&draft.start_date, &draft.start_time, draft.start_reference)?;
        let end_at = codec.join_parts_near(&draft.end_date, &draft.end_time, draft.end_reference)?;
        coerce_cost_amount(Some(draft.cost_amount.as_str()))?;
        if end_at <= start_at {
            return Err(ValidationError::InvalidRange {
                start: format!("{} {}", draft.start_date.trim(), draft.start_time.trim()),
                end: format!("{} {}", draft.end_date.trim(), draft.end_time.trim()),
            });
        }

        let mut warnings = Vec::new();
        let mut checked_relation = |field: RelationField, raw: &str| {
            let value = raw.trim();
            if value.is_empty() {
                return None;
            }
            match parse_relation_id(value) {
                Ok(id) => Some(id),
                Err(ValidationError::InvalidRelationId(value)) => {
                    warnings.push(FormWarning::RelationIdDiscarded { field, value });
                    None
                }
                Err(_) => None,
            }
        };
        let primary_relation_id = checked_relation(RelationField::Primary, &draft.primary_relation_id);
        let person_relation_id = checked_relation(RelationField::Person, &draft.person_relation_id);

        let payload = ActivityPayload {
            id: draft.id.clone(),
            subject: draft.subject.clone(),
            start: codec.format_widget_instant(start_at),
            end: codec.format_widget_instant(end_at),
            location: Some(draft.location.trim())
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned),
            primary_relation_id,
            person_relation_id,
            cost_type: draft.cost_type.clone(),
            cost_amount: Some(draft.cost_amount.clone()),
            category: draft.category.clone(),
        };
        let activity = self.normalizer.to_activity(&payload)?;
        Ok((activity, warnings))
    }
}
