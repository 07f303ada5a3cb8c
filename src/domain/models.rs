use crate::domain::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(from = "String", into = "String")]
pub enum CostType {
    Transportation,
    Meals,
    Accommodation,
    Other,
    Custom(String),
}

impl CostType {
    pub const STANDARD: [CostType; 4] = [
        CostType::Transportation,
        CostType::Meals,
        CostType::Accommodation,
        CostType::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Transportation => "Transportation",
            Self::Meals => "Meals",
            Self::Accommodation => "Accommodation",
            Self::Other => "Other",
            Self::Custom(value) => value,
        }
    }
}

impl From<String> for CostType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Transportation" => Self::Transportation,
            "Meals" => Self::Meals,
            "Accommodation" => Self::Accommodation,
            "Other" => Self::Other,
            _ => Self::Custom(value),
        }
    }
}

impl From<CostType> for String {
    fn from(value: CostType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Palette category of an activity; selects the icon shown on the calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ActivityCategory {
    Vacation,
    Sick,
    Education,
    Business,
    Custom(String),
}

impl ActivityCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Vacation => "vacation",
            Self::Sick => "sick",
            Self::Education => "education",
            Self::Business => "business",
            Self::Custom(value) => value,
        }
    }

    /// Guesses a category from a free-text title. Korean and English
    /// keywords are both recognised.
    pub fn infer_from_title(title: &str) -> Option<Self> {
        let lowered = title.to_lowercase();
        let keyword_map: [(&[&str], ActivityCategory); 4] = [
            (&["휴가", "vacation"], Self::Vacation),
            (&["병가", "sick"], Self::Sick),
            (&["교육", "education"], Self::Education),
            (&["출장", "business"], Self::Business),
        ];
        keyword_map
            .into_iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(_, category)| category)
    }
}

impl From<String> for ActivityCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "vacation" => Self::Vacation,
            "sick" => Self::Sick,
            "education" => Self::Education,
            "business" => Self::Business,
            _ => Self::Custom(value),
        }
    }
}

impl From<ActivityCategory> for String {
    fn from(value: ActivityCategory) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted calendar record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: Option<String>,
    pub subject: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: Option<String>,
    pub primary_relation_id: Option<String>,
    pub person_relation_id: Option<String>,
    pub cost_type: Option<CostType>,
    pub cost_amount: Option<f64>,
    pub category: Option<ActivityCategory>,
}

impl Activity {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ValidationError::MissingSubject);
        }
        if self.end_at <= self.start_at {
            return Err(ValidationError::InvalidRange {
                start: self.start_at.to_rfc3339(),
                end: self.end_at.to_rfc3339(),
            });
        }
        if let Some(amount) = self.cost_amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ValidationError::InvalidCost(amount.to_string()));
            }
        }
        Ok(())
    }

    pub fn is_persisted(&self) -> bool {
        self.id
            .as_deref()
            .map(str::trim)
            .is_some_and(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Account,
    Contact,
    Opportunity,
}

/// Something dragged onto the calendar from outside of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaletteItem {
    Category {
        category: ActivityCategory,
    },
    Record {
        kind: RecordKind,
        id: String,
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_activity() -> Activity {
        Activity {
            id: Some("00U000000000001AAA".to_string()),
            subject: "Client visit".to_string(),
            start_at: fixed_time("2024-06-10T09:00:00Z"),
            end_at: fixed_time("2024-06-10T10:00:00Z"),
            location: Some("Seoul".to_string()),
            primary_relation_id: Some("001A000001abcde".to_string()),
            person_relation_id: None,
            cost_type: Some(CostType::Transportation),
            cost_amount: Some(12500.0),
            category: Some(ActivityCategory::Business),
        }
    }

    #[test]
    fn activity_validate_accepts_valid_activity() {
        assert!(sample_activity().validate().is_ok());
    }

    #[test]
    fn activity_validate_rejects_equal_instants() {
        let mut activity = sample_activity();
        activity.end_at = activity.start_at;
        assert!(matches!(
            activity.validate(),
            Err(ValidationError::InvalidRange { .. })
        ));
    }

    #[test]
    fn activity_validate_rejects_blank_subject_and_negative_cost() {
        let mut activity = sample_activity();
        activity.subject = "  ".to_string();
        assert_eq!(activity.validate(), Err(ValidationError::MissingSubject));

        let mut activity = sample_activity();
        activity.cost_amount = Some(-1.0);
        assert!(matches!(
            activity.validate(),
            Err(ValidationError::InvalidCost(_))
        ));
    }

    #[test]
    fn open_enums_keep_unknown_values() {
        assert_eq!(CostType::from("Parking".to_string()).as_str(), "Parking");
        assert_eq!(CostType::from("Meals".to_string()), CostType::Meals);
        assert_eq!(
            ActivityCategory::from("Vacation".to_string()),
            ActivityCategory::Custom("Vacation".to_string())
        );
    }

    #[test]
    fn category_is_inferred_from_korean_and_english_titles() {
        assert_eq!(
            ActivityCategory::infer_from_title("여름 휴가"),
            Some(ActivityCategory::Vacation)
        );
        assert_eq!(
            ActivityCategory::infer_from_title("Business trip to Busan"),
            Some(ActivityCategory::Business)
        );
        assert_eq!(
            ActivityCategory::infer_from_title("신입 교육"),
            Some(ActivityCategory::Education)
        );
        assert_eq!(ActivityCategory::infer_from_title("Lunch"), None);
    }

    #[test]
    fn domain_models_support_serde_roundtrip() {
        let activity = sample_activity();
        let item = PaletteItem::Record {
            kind: RecordKind::Contact,
            id: "003A000001abcde".to_string(),
            name: "Kim".to_string(),
        };

        let activity_roundtrip: Activity =
            serde_json::from_str(&serde_json::to_string(&activity).expect("serialize activity"))
                .expect("deserialize activity");
        let item_roundtrip: PaletteItem =
            serde_json::from_str(&serde_json::to_string(&item).expect("serialize item"))
                .expect("deserialize item");

        assert_eq!(activity_roundtrip, activity);
        assert_eq!(item_roundtrip, item);
    }
}
