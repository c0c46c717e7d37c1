//! Traffic stop table model

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

/// Backing table for all records
pub const TRAFFIC_STOPS_TABLE: &str = "traffic_stops";

/// Column order of `traffic_stops`, also the insert column order
pub const TRAFFIC_STOP_COLUMNS: [&str; 13] = [
    "stop_date",
    "stop_time",
    "country_name",
    "driver_gender",
    "driver_age",
    "driver_race",
    "search_conducted",
    "search_type",
    "is_arrested",
    "violation",
    "stop_duration",
    "drugs_related_stop",
    "vehicle_number",
];

const INSERT_TRAFFIC_STOP_SQL: &str = "INSERT INTO traffic_stops \
     (stop_date, stop_time, country_name, driver_gender, driver_age, driver_race, search_conducted, search_type, \
     is_arrested, violation, stop_duration, drugs_related_stop, vehicle_number) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// One traffic stop, as written by the ingestion form
///
/// Records are append-only: nothing in SecureCheck updates or deletes rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStopRecord {
    pub stop_date: NaiveDate,
    pub stop_time: NaiveTime,
    pub country_name: String,
    pub driver_gender: String,
    pub driver_age: i32,
    pub driver_race: String,
    pub search_conducted: bool,
    pub search_type: String,
    pub is_arrested: bool,
    pub violation: String,
    /// Minutes
    pub stop_duration: u32,
    pub drugs_related_stop: bool,
    pub vehicle_number: String,
}

/// Stored encoding of a yes/no flag
pub fn flag_value(flag: bool) -> i32 {
    if flag {
        1
    } else {
        0
    }
}

impl TrafficStopRecord {
    /// Parameterized insert for this record
    ///
    /// Every value is bound; free text never becomes part of the SQL text.
    pub fn insert_query(&self) -> Query<'static, MySql, MySqlArguments> {
        sqlx::query(INSERT_TRAFFIC_STOP_SQL)
            .bind(self.stop_date)
            .bind(self.stop_time)
            .bind(self.country_name.clone())
            .bind(self.driver_gender.clone())
            .bind(self.driver_age)
            .bind(self.driver_race.clone())
            .bind(flag_value(self.search_conducted))
            .bind(self.search_type.clone())
            .bind(flag_value(self.is_arrested))
            .bind(self.violation.clone())
            .bind(self.stop_duration)
            .bind(flag_value(self.drugs_related_stop))
            .bind(self.vehicle_number.clone())
    }
}
