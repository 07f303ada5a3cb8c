pub mod activity_store;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod event_mapper;
pub mod notifier;
pub mod rest_activity_store;
pub mod sqlite_activity_store;
pub mod widget;
