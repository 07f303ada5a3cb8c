pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::bootstrap::{
    bootstrap_workspace, calendar_normalizer, init_logging, open_store, BootstrapResult,
};
pub use application::calendar_sync::{
    CalendarGestureEvent, CalendarSyncController, CostSummary, GestureOutcome, SubmitError,
};
pub use application::event_form::{
    EventFormController, EventFormDraft, FormError, FormField, FormMode, FormState, FormWarning,
    SaveRequest,
};
pub use application::gateway::ActivityPersistenceGateway;
pub use domain::datetime_codec::{DateTimeCodec, DateTimeParts};
pub use domain::error::ValidationError;
pub use domain::models::{Activity, ActivityCategory, CostType, PaletteItem, RecordKind};
pub use domain::relation_id::{parse_relation_id, validate_relation_id};
pub use infrastructure::activity_store::{ActivityStore, InMemoryActivityStore};
pub use infrastructure::error::{extract_error_message, InfraError, RemoteError};
pub use infrastructure::event_mapper::{
    ActivityPayload, CalendarDisplayEvent, DisplayEventExtension, EventRecordNormalizer,
};
pub use infrastructure::notifier::{Notification, Notifier, Severity, TracingNotifier};
pub use infrastructure::widget::CalendarWidget;
