use crate::infrastructure::event_mapper::CalendarDisplayEvent;

/// Imperative surface of the calendar widget the controller drives.
pub trait CalendarWidget: Send {
    /// Replaces everything the widget shows.
    fn render(&mut self, events: &[CalendarDisplayEvent]);
    fn add_event(&mut self, event: &CalendarDisplayEvent);
    /// Updates the shown event with the same id in place.
    fn patch_event(&mut self, event: &CalendarDisplayEvent);
    /// Clears a pending range selection.
    fn unselect(&mut self);
    /// Asks the host to reload events from the store.
    fn refetch(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    Render(Vec<CalendarDisplayEvent>),
    AddEvent(CalendarDisplayEvent),
    PatchEvent(CalendarDisplayEvent),
    Unselect,
    Refetch,
}

/// Widget that only remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingCalendarWidget {
    calls: Vec<WidgetCall>,
}

impl RecordingCalendarWidget {
    pub fn calls(&self) -> &[WidgetCall] {
        &self.calls
    }

    pub fn refetch_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, WidgetCall::Refetch))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl CalendarWidget for RecordingCalendarWidget {
    fn render(&mut self, events: &[CalendarDisplayEvent]) {
        self.calls.push(WidgetCall::Render(events.to_vec()));
    }

    fn add_event(&mut self, event: &CalendarDisplayEvent) {
        self.calls.push(WidgetCall::AddEvent(event.clone()));
    }

    fn patch_event(&mut self, event: &CalendarDisplayEvent) {
        self.calls.push(WidgetCall::PatchEvent(event.clone()));
    }

    fn unselect(&mut self) {
        self.calls.push(WidgetCall::Unselect);
    }

    fn refetch(&mut self) {
        self.calls.push(WidgetCall::Refetch);
    }
}
