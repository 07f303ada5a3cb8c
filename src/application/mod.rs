pub mod bootstrap;
pub mod calendar_sync;
pub mod event_form;
pub mod gateway;
