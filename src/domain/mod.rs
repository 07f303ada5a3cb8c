pub mod datetime_codec;
pub mod error;
pub mod models;
pub mod relation_id;
