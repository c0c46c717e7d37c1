//! Database models and schema for the `traffic_stops` store

pub mod init;
pub mod models;

pub use models::{flag_value, TrafficStopRecord, TRAFFIC_STOPS_TABLE, TRAFFIC_STOP_COLUMNS};
