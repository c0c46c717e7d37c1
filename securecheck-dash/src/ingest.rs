//! New traffic stop ingestion
//!
//! Validates one submitted form, derives the stored 1/0 flags from its
//! Yes/No answers, inserts the row, and renders the summary sentence shown
//! to the operator.

use chrono::{NaiveDate, NaiveTime};
use securecheck_common::db::TrafficStopRecord;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::db::Store;
use crate::error::DashboardError;

/// Youngest driver age the form accepts
pub const MIN_DRIVER_AGE: i64 = 10;
/// Oldest driver age the form accepts
pub const MAX_DRIVER_AGE: i64 = 100;

/// Radio answer for the boolean-like fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Submitted form body
///
/// Free-text fields are kept verbatim (no trimming); a missing one is the
/// same as an empty text box.
#[derive(Debug, Clone, Deserialize)]
pub struct StopForm {
    pub stop_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_stop_time")]
    pub stop_time: NaiveTime,
    #[serde(default)]
    pub country_name: String,
    pub driver_gender: Gender,
    pub driver_age: i64,
    #[serde(default)]
    pub driver_race: String,
    pub search_conducted: YesNo,
    #[serde(default)]
    pub search_type: String,
    pub is_arrested: YesNo,
    #[serde(default)]
    pub violation: String,
    pub stop_duration: i64,
    pub drugs_related_stop: YesNo,
    #[serde(default)]
    pub vehicle_number: String,
}

/// Accepts `HH:MM:SS` or the `HH:MM` a browser time input sends
fn deserialize_stop_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M"))
        .map_err(|e| serde::de::Error::custom(format!("invalid stop_time '{}': {}", text, e)))
}

impl StopForm {
    /// Validate ranges and derive the stored record
    pub fn into_record(self) -> Result<TrafficStopRecord, DashboardError> {
        if !(MIN_DRIVER_AGE..=MAX_DRIVER_AGE).contains(&self.driver_age) {
            return Err(DashboardError::InvalidField {
                field: "driver_age",
                reason: format!(
                    "{} is outside {}-{}",
                    self.driver_age, MIN_DRIVER_AGE, MAX_DRIVER_AGE
                ),
            });
        }

        let stop_duration = u32::try_from(self.stop_duration).map_err(|_| {
            DashboardError::InvalidField {
                field: "stop_duration",
                reason: format!("{} is not a non-negative number of minutes", self.stop_duration),
            }
        })?;

        Ok(TrafficStopRecord {
            stop_date: self.stop_date,
            stop_time: self.stop_time,
            country_name: self.country_name,
            driver_gender: self.driver_gender.as_str().to_string(),
            // Range checked above
            driver_age: self.driver_age as i32,
            driver_race: self.driver_race,
            search_conducted: self.search_conducted.is_yes(),
            search_type: self.search_type,
            is_arrested: self.is_arrested.is_yes(),
            violation: self.violation,
            stop_duration,
            drugs_related_stop: self.drugs_related_stop.is_yes(),
            vehicle_number: self.vehicle_number,
        })
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct InsertedRecord {
    pub record: TrafficStopRecord,
    pub summary: String,
}

/// Validate, insert, and summarize one form submission
///
/// Validation failures never reach the store. The insert is atomic and
/// must affect exactly one row.
pub async fn submit(store: &Store, form: StopForm) -> Result<InsertedRecord, DashboardError> {
    let record = form.into_record()?;

    let affected = store.execute_write(record.insert_query()).await?;
    if affected != 1 {
        return Err(DashboardError::NotInserted(affected));
    }

    info!(
        "Added traffic stop: {} {} vehicle {}",
        record.stop_date, record.stop_time, record.vehicle_number
    );

    let summary = render_summary(&record);
    Ok(InsertedRecord { record, summary })
}

/// One-sentence description of a stored stop
pub fn render_summary(record: &TrafficStopRecord) -> String {
    let search_text = if record.search_conducted {
        "a search was conducted"
    } else {
        "no search was conducted"
    };
    let arrest_text = if record.is_arrested {
        "the driver was arrested"
    } else {
        "the driver was not arrested"
    };
    let drug_text = if record.drugs_related_stop {
        "it was drug-related"
    } else {
        "it was not drug-related"
    };

    format!(
        "A {}-year-old {} from {} was stopped for {} at {} on {}. \
         During the stop, {}, {}, and {}. Duration: {} min. Vehicle: {}.",
        record.driver_age,
        record.driver_gender,
        record.country_name,
        record.violation,
        record.stop_time.format("%I:%M %p"),
        record.stop_date,
        search_text,
        arrest_text,
        drug_text,
        record.stop_duration,
        record.vehicle_number,
    )
}
