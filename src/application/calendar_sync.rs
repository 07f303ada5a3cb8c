use crate::application::event_form::{
    EventFormController, EventFormDraft, FormError, FormMode,
};
use crate::application::gateway::ActivityPersistenceGateway;
use crate::domain::error::ValidationError;
use crate::domain::models::{CostType, PaletteItem};
use crate::infrastructure::activity_store::ActivityStore;
use crate::infrastructure::error::{extract_error_message, InfraError};
use crate::infrastructure::event_mapper::{CalendarDisplayEvent, EventRecordNormalizer};
use crate::infrastructure::notifier::{Notifier, Severity};
use crate::infrastructure::widget::CalendarWidget;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

const TITLE_SUCCESS: &str = "Success";
const TITLE_WARNING: &str = "Warning";
const TITLE_ERROR: &str = "Error";

/// Interaction reported by the calendar widget.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarGestureEvent {
    /// A palette item dropped on a day cell; `date` is the widget's date string.
    ExternalDrop { item: PaletteItem, date: String },
    RangeSelect { start: String, end: String },
    Click { event: CalendarDisplayEvent },
    /// `event` carries the post-move state.
    Move { event: CalendarDisplayEvent },
    Resize { event: CalendarDisplayEvent },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    FormOpened(FormMode),
    Persisted { id: String },
    Failed,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Store(#[from] InfraError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub by_type: BTreeMap<CostType, f64>,
    pub total: f64,
    pub counted_events: usize,
}

/// Keeps the widget, the form and the store consistent with each other.
pub struct CalendarSyncController<S, W, N>
where
    S: ActivityStore + ?Sized,
    W: CalendarWidget,
    N: Notifier + ?Sized,
{
    gateway: ActivityPersistenceGateway<S>,
    widget: W,
    notifier: Arc<N>,
    normalizer: EventRecordNormalizer,
    form: EventFormController,
    events: Vec<CalendarDisplayEvent>,
    loaded: bool,
}

impl<S, W, N> CalendarSyncController<S, W, N>
where
    S: ActivityStore + ?Sized,
    W: CalendarWidget,
    N: Notifier + ?Sized,
{
    pub fn new(
        gateway: ActivityPersistenceGateway<S>,
        widget: W,
        notifier: Arc<N>,
        normalizer: EventRecordNormalizer,
    ) -> Self {
        Self {
            gateway,
            widget,
            notifier,
            normalizer,
            form: EventFormController::new(normalizer),
            events: Vec::new(),
            loaded: false,
        }
    }

    pub fn events(&self) -> &[CalendarDisplayEvent] {
        &self.events
    }

    /// What the widget's event source callback hands back.
    pub fn event_source(&self) -> Vec<CalendarDisplayEvent> {
        self.events.clone()
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn form(&self) -> &EventFormController {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EventFormController {
        &mut self.form
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// First fetch. Runs once; a failure leaves an empty calendar and is not
    /// retried. Errors are reported through the notifier before returning.
    pub async fn initial_load(&mut self) -> Result<usize, InfraError> {
        if self.loaded {
            return Ok(self.events.len());
        }
        self.loaded = true;
        let result = self.fetch_into_mirror().await;
        if result.is_err() {
            self.events.clear();
            self.widget.render(&self.events);
        }
        result
    }

    /// Fresh fetch that replaces the mirror. On failure the current mirror is
    /// kept.
    pub async fn reload(&mut self) -> Result<usize, InfraError> {
        self.loaded = true;
        self.fetch_into_mirror().await
    }

    async fn fetch_into_mirror(&mut self) -> Result<usize, InfraError> {
        match self.gateway.fetch_all().await {
            Ok(activities) => {
                self.events = activities
                    .iter()
                    .map(|activity| self.normalizer.to_display(activity))
                    .collect();
                self.widget.render(&self.events);
                Ok(self.events.len())
            }
            Err(error) => {
                self.report_infra_error(&error);
                Err(error)
            }
        }
    }

    pub async fn handle_gesture(&mut self, gesture: CalendarGestureEvent) -> GestureOutcome {
        match gesture {
            CalendarGestureEvent::ExternalDrop { item, date } => self.open_for_drop(&item, &date),
            CalendarGestureEvent::RangeSelect { start, end } => self.open_for_range(&start, &end),
            CalendarGestureEvent::Click { event } => self.open_for_click(&event),
            CalendarGestureEvent::Move { event } | CalendarGestureEvent::Resize { event } => {
                self.persist_gesture(event).await
            }
        }
    }

    fn open_for_drop(&mut self, item: &PaletteItem, date: &str) -> GestureOutcome {
        self.widget.unselect();
        let codec = *self.normalizer.codec();
        match codec.parse_widget_instant(date) {
            Ok(instant) => {
                let draft = EventFormDraft::for_drop(&codec, item, instant);
                self.form.open(FormMode::Create, draft);
                GestureOutcome::FormOpened(FormMode::Create)
            }
            Err(error) => {
                self.report_validation_error(&error);
                GestureOutcome::Failed
            }
        }
    }

    fn open_for_range(&mut self, start: &str, end: &str) -> GestureOutcome {
        self.widget.unselect();
        let codec = *self.normalizer.codec();
        let range = codec
            .parse_widget_instant(start)
            .and_then(|start_at| {
                codec
                    .parse_widget_instant(end)
                    .map(|end_at| (start_at, end_at))
            });
        match range {
            Ok((start_at, end_at)) => {
                let draft = EventFormDraft::for_range(&codec, start_at, end_at);
                self.form.open(FormMode::Create, draft);
                GestureOutcome::FormOpened(FormMode::Create)
            }
            Err(error) => {
                self.report_validation_error(&error);
                GestureOutcome::Failed
            }
        }
    }

    fn open_for_click(&mut self, event: &CalendarDisplayEvent) -> GestureOutcome {
        let draft = EventFormDraft::from_display(self.normalizer.codec(), event);
        let mode = if draft.id.is_some() {
            FormMode::Edit
        } else {
            FormMode::Create
        };
        self.form.open(mode, draft);
        GestureOutcome::FormOpened(mode)
    }

    /// Move and resize save straight away. The widget already shows the new
    /// state; when the save fails the widget is told to refetch.
    async fn persist_gesture(&mut self, event: CalendarDisplayEvent) -> GestureOutcome {
        self.replace_in_mirror(event.clone());

        let activity = match self.normalizer.to_activity(&event.to_payload()) {
            Ok(activity) => activity,
            Err(error) => {
                self.report_validation_error(&error);
                self.widget.refetch();
                return GestureOutcome::Failed;
            }
        };

        match self.gateway.save(&activity).await {
            Ok(id) => {
                let mut saved = activity;
                saved.id = Some(id.clone());
                let display = self.normalizer.to_display(&saved);
                if !self.replace_in_mirror(display.clone()) {
                    self.events.push(display);
                }
                self.notifier
                    .notify(TITLE_SUCCESS, "Activity updated", Severity::Success);
                GestureOutcome::Persisted { id }
            }
            Err(error) => {
                self.report_infra_error(&error);
                self.widget.refetch();
                GestureOutcome::Failed
            }
        }
    }

    /// Validates and saves the open form. On success the widget gets the
    /// saved event and the form closes; on a store failure the form reopens
    /// with its draft.
    pub async fn submit_form(&mut self) -> Result<String, SubmitError> {
        let request = match self.form.submit() {
            Ok(request) => request,
            Err(FormError::Invalid(error)) => {
                self.notifier
                    .notify(TITLE_WARNING, &error.to_string(), Severity::Warning);
                return Err(FormError::Invalid(error).into());
            }
            Err(error) => return Err(error.into()),
        };
        for warning in &request.warnings {
            self.notifier
                .notify(TITLE_WARNING, &warning.to_string(), Severity::Warning);
        }

        let is_update = request.activity.is_persisted();
        match self.gateway.save(&request.activity).await {
            Ok(id) => {
                let mut saved = request.activity;
                saved.id = Some(id.clone());
                let display = self.normalizer.to_display(&saved);
                if is_update && self.replace_in_mirror(display.clone()) {
                    self.widget.patch_event(&display);
                } else {
                    self.events.push(display.clone());
                    self.widget.add_event(&display);
                }
                self.form.complete_save();
                self.notifier
                    .notify(TITLE_SUCCESS, "Activity saved", Severity::Success);
                Ok(id)
            }
            Err(error) => {
                self.report_infra_error(&error);
                self.form.fail_save();
                Err(error.into())
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.form.cancel();
    }

    pub fn cost_summary(&self) -> CostSummary {
        let mut summary = CostSummary::default();
        for event in &self.events {
            let Some(amount) = event.extended_props.cost_amount else {
                continue;
            };
            let cost_type = event
                .extended_props
                .cost_type
                .clone()
                .unwrap_or(CostType::Other);
            *summary.by_type.entry(cost_type).or_insert(0.0) += amount;
            summary.total += amount;
            summary.counted_events += 1;
        }
        summary
    }

    fn replace_in_mirror(&mut self, event: CalendarDisplayEvent) -> bool {
        let Some(id) = event.id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return false;
        };
        match self
            .events
            .iter_mut()
            .find(|existing| existing.id.as_deref() == Some(id))
        {
            Some(existing) => {
                debug!(id, "patched mirrored event");
                *existing = event;
                true
            }
            None => false,
        }
    }

    fn report_infra_error(&self, error: &InfraError) {
        let message = error
            .remote()
            .map(extract_error_message)
            .unwrap_or_else(|| error.to_string());
        warn!(error = %error, "calendar operation failed");
        self.notifier.notify(TITLE_ERROR, &message, Severity::Error);
    }

    fn report_validation_error(&self, error: &ValidationError) {
        warn!(error = %error, "rejected calendar input");
        self.notifier
            .notify(TITLE_ERROR, &error.to_string(), Severity::Error);
    }
}
