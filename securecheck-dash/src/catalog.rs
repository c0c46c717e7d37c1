//! Canned analytical query catalog
//!
//! A fixed, process-wide table of operator-facing labels and the exact
//! statement each one runs. Statement text is executed verbatim: every
//! grouping key, rate formula, threshold and ordering lives in the SQL,
//! and no result rows are post-processed here.
//!
//! Boolean-like columns are compared against whatever encodings each
//! statement names (`'TRUE'` in most, `'Yes'`/`'1'`/`'arrested'` in a
//! few). The comparison sets differ per entry on purpose; they must not
//! be unified.

use serde::Serialize;
use tracing::{debug, info};

use crate::db::{Store, TableResult};
use crate::error::DashboardError;

/// Thematic group of a catalog entry, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Vehicle,
    Demographic,
    TimeDuration,
    Violation,
    Location,
    Composite,
}

impl QueryCategory {
    /// Heading shown above the group in the selector
    pub fn title(&self) -> &'static str {
        match self {
            QueryCategory::Vehicle => "Vehicle-Based",
            QueryCategory::Demographic => "Demographic-Based",
            QueryCategory::TimeDuration => "Time & Duration Based",
            QueryCategory::Violation => "Violation-Based",
            QueryCategory::Location => "Location-Based",
            QueryCategory::Composite => "Complex Queries",
        }
    }
}

/// One label → statement binding
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogEntry {
    pub label: &'static str,
    pub category: QueryCategory,
    #[serde(skip)]
    pub statement: &'static str,
}

static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        label: "Top 10 vehicles in drug-related stops",
        category: QueryCategory::Vehicle,
        statement: r#"SELECT vehicle_number, COUNT(*) AS stop_count FROM traffic_stops WHERE drugs_related_stop = 'TRUE' GROUP BY vehicle_number ORDER BY stop_count DESC LIMIT 10"#,
    },
    CatalogEntry {
        label: "Most frequently searched vehicles",
        category: QueryCategory::Vehicle,
        statement: r#"SELECT vehicle_number, COUNT(*) AS search_count FROM traffic_stops WHERE search_conducted = 'TRUE' GROUP BY vehicle_number ORDER BY search_count DESC LIMIT 10"#,
    },
    CatalogEntry {
        label: "Driver age group with highest arrest rate",
        category: QueryCategory::Demographic,
        statement: r#"SELECT CASE WHEN driver_age < 25 THEN '<25' WHEN driver_age BETWEEN 25 AND 40 THEN '25-40' ELSE '>40' END AS age_group, COUNT(*) AS total_stops, SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) AS arrests, (SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) * 100.0 / COUNT(*)) AS arrest_rate_percent FROM traffic_stops GROUP BY age_group ORDER BY arrest_rate_percent DESC"#,
    },
    CatalogEntry {
        label: "Gender distribution of drivers by country",
        category: QueryCategory::Demographic,
        statement: r#"SELECT country_name, driver_gender, COUNT(*) AS count FROM traffic_stops GROUP BY country_name, driver_gender ORDER BY country_name"#,
    },
    CatalogEntry {
        label: "Race and gender with highest search rate",
        category: QueryCategory::Demographic,
        statement: r#"SELECT 
    driver_race,
    driver_gender,
    COUNT(*) AS total_stops,
    SUM(CASE 
        WHEN search_conducted IN ('Yes', 'yes', 'TRUE', 'true', '1') THEN 1 
        ELSE 0 
    END) AS total_searches,
    ROUND(100.0 * SUM(CASE 
        WHEN search_conducted IN ('Yes', 'yes', 'TRUE', 'true', '1') THEN 1 
        ELSE 0 
    END) / COUNT(*), 2) AS search_rate
FROM traffic_stops
WHERE driver_race IS NOT NULL AND driver_gender IS NOT NULL
GROUP BY driver_race, driver_gender
ORDER BY search_rate DESC
LIMIT 1;
"#,
    },
    CatalogEntry {
        label: "Hour of day with most traffic stops",
        category: QueryCategory::TimeDuration,
        statement: r#"SELECT HOUR(STR_TO_DATE(CONCAT(stop_date, ' ', stop_time), '%Y-%m-%d %H:%i:%s')) AS hour, COUNT(*) AS stops FROM traffic_stops WHERE stop_date IS NOT NULL AND stop_time IS NOT NULL GROUP BY hour ORDER BY stops DESC"#,
    },
    CatalogEntry {
        label: "Average stop duration per violation",
        category: QueryCategory::TimeDuration,
        statement: r#"SELECT violation, ROUND(AVG(stop_duration), 2) AS avg_duration FROM traffic_stops GROUP BY violation ORDER BY avg_duration DESC"#,
    },
    CatalogEntry {
        label: "Are night stops more likely to lead to arrest?",
        category: QueryCategory::TimeDuration,
        statement: r#"SELECT CASE WHEN HOUR(STR_TO_DATE(stop_time, '%H:%i:%s')) BETWEEN 20 AND 23 OR HOUR(STR_TO_DATE(stop_time, '%H:%i:%s')) <= 5 THEN 'Night' ELSE 'Day' END AS time_period, COUNT(*) AS total, SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) AS arrests, ROUND(SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2) AS arrest_rate FROM traffic_stops GROUP BY time_period"#,
    },
    CatalogEntry {
        label: "Violations most associated with searches or arrests",
        category: QueryCategory::Violation,
        statement: r#"
SELECT
    violation,
    COUNT(*) AS total,
    SUM(CASE WHEN search_conducted = 'TRUE' THEN 1 ELSE 0 END) AS searches,
    SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) AS arrests,
    ROUND(
        SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) * 100.0 / COUNT(*),
        2
    ) AS arrest_rate
FROM traffic_stops
GROUP BY violation
ORDER BY arrest_rate DESC
"#,
    },
    CatalogEntry {
        label: "Most common violations among drivers under 25",
        category: QueryCategory::Violation,
        statement: r#"SELECT violation, COUNT(*) AS count FROM traffic_stops WHERE driver_age < 25 GROUP BY violation ORDER BY count DESC LIMIT 5"#,
    },
    CatalogEntry {
        label: "Violations that rarely result in search or arrest",
        category: QueryCategory::Violation,
        statement: r#"SELECT  
    violation,  
    COUNT(*) AS total,  
    SUM(CASE WHEN search_conducted = 'TRUE' THEN 1 ELSE 0 END) AS searches,  
    SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) AS arrests,
    ROUND(SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END)*100.0 / COUNT(*), 2) AS arrest_rate  
FROM traffic_stops  
GROUP BY violation  
ORDER BY searches ASC, arrests ASC"#,
    },
    CatalogEntry {
        label: "Countries with highest rate of drug-related stops",
        category: QueryCategory::Location,
        statement: r#"SELECT country_name, 
       COUNT(*) AS total_stops, 
       SUM(CASE WHEN drugs_related_stop = 'TRUE' THEN 1 ELSE 0 END) AS drug_related, 
       ROUND(SUM(CASE WHEN drugs_related_stop = 'TRUE' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2) AS drug_related_rate 
FROM traffic_stops 
GROUP BY country_name 
ORDER BY drug_related_rate DESC;"#,
    },
    CatalogEntry {
        label: "Arrest rate by country and violation",
        category: QueryCategory::Location,
        statement: r#"SELECT country_name, violation, 
       COUNT(*) AS total, 
       SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) AS arrests, 
       ROUND(SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2) AS arrest_rate 
FROM traffic_stops 
GROUP BY country_name, violation 
ORDER BY arrest_rate DESC;"#,
    },
    CatalogEntry {
        label: "Country with most stops where search was conducted",
        category: QueryCategory::Location,
        statement: r#"SELECT country_name, COUNT(*) AS search_count 
FROM traffic_stops 
WHERE search_conducted = 'TRUE' 
GROUP BY country_name 
ORDER BY search_count DESC
LIMIT 1;"#,
    },
    CatalogEntry {
        label: "Yearly breakdown of stops and arrests by country",
        category: QueryCategory::Composite,
        statement: r#"SELECT 
    country_name, 
    YEAR(stop_date) AS year, 
    COUNT(*) AS total_stops, 
    SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) AS total_arrests,
    ROUND(SUM(CASE WHEN is_arrested = 'TRUE' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2) AS arrest_rate
FROM traffic_stops 
WHERE stop_date IS NOT NULL 
GROUP BY country_name, year 
ORDER BY country_name, year;"#,
    },
    CatalogEntry {
        label: "Driver violation trends by age and race",
        category: QueryCategory::Composite,
        statement: r#"SELECT driver_race, CASE WHEN driver_age < 25 THEN '<25' WHEN driver_age <= 40 THEN '25-40' ELSE '>40' END AS age_group, violation, COUNT(*) AS count FROM traffic_stops GROUP BY driver_race, age_group, violation ORDER BY count DESC"#,
    },
    CatalogEntry {
        label: "Stops by year, month, and hour of the day",
        category: QueryCategory::Composite,
        statement: r#"SELECT YEAR(stop_date) AS year, MONTH(stop_date) AS month, HOUR(STR_TO_DATE(stop_time, '%H:%i:%s')) AS hour, COUNT(*) AS stops FROM traffic_stops WHERE stop_date IS NOT NULL AND stop_time IS NOT NULL GROUP BY year, month, hour ORDER BY year, month, hour"#,
    },
    CatalogEntry {
        label: "Top violations with high search and arrest rates",
        category: QueryCategory::Composite,
        statement: r#"SELECT 
    violation,
    COUNT(*) AS total_stops,
    SUM(CASE WHEN search_conducted IN ('Yes', 'yes', 'TRUE', 'true', '1') THEN 1 ELSE 0 END) AS total_searches,
    SUM(CASE WHEN is_arrested IN ('Yes', 'yes', 'TRUE', 'true', '1', 'arrested') THEN 1 ELSE 0 END) AS total_arrests,
    ROUND(100 * SUM(CASE WHEN search_conducted IN ('Yes', 'yes', 'TRUE', 'true', '1') THEN 1 ELSE 0 END) / COUNT(*), 2) AS search_rate,
    ROUND(100 * SUM(CASE WHEN is_arrested IN ('Yes', 'yes', 'TRUE', 'true', '1', 'arrested') THEN 1 ELSE 0 END) / COUNT(*), 2) AS arrest_rate
FROM traffic_stops
GROUP BY violation
HAVING total_stops > 10
ORDER BY search_rate DESC, arrest_rate DESC
LIMIT 5;
"#,
    },
    CatalogEntry {
        label: "Driver demographics by country",
        category: QueryCategory::Composite,
        statement: r#"SELECT country_name, AVG(driver_age) AS avg_age, SUM(CASE WHEN driver_gender = 'M' THEN 1 ELSE 0 END) AS male, SUM(CASE WHEN driver_gender = 'F' THEN 1 ELSE 0 END) AS female, COUNT(DISTINCT driver_race) AS unique_races FROM traffic_stops GROUP BY country_name"#,
    },
    CatalogEntry {
        label: "Top 5 violations with highest arrest rates",
        category: QueryCategory::Composite,
        statement: r#"SELECT 
    violation,
    COUNT(*) AS total_stops,
    SUM(CASE WHEN is_arrested IN ('Yes', 'yes', 'TRUE', 'true', '1', 'arrested') THEN 1 ELSE 0 END) AS total_arrests,
    ROUND(
        100 * SUM(CASE WHEN is_arrested IN ('Yes', 'yes', 'TRUE', 'true', '1', 'arrested') THEN 1 ELSE 0 END) / COUNT(*),
        2
    ) AS arrest_rate_percent
FROM traffic_stops
GROUP BY violation
HAVING total_stops > 10
ORDER BY arrest_rate_percent DESC
LIMIT 5;"#,
    },
];

/// Every catalog entry, in definition order
pub fn entries() -> &'static [CatalogEntry] {
    CATALOG
}

/// Labels in definition order (grouped by category)
pub fn list_labels() -> Vec<&'static str> {
    CATALOG.iter().map(|entry| entry.label).collect()
}

/// Exact-match label lookup
pub fn lookup(label: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.label == label)
}

/// Run the statement bound to `label`
///
/// Zero rows is a successful, empty result.
pub async fn run(store: &Store, label: &str) -> Result<TableResult, DashboardError> {
    let entry = lookup(label).ok_or_else(|| DashboardError::UnknownLabel(label.to_string()))?;

    debug!("Running catalog query: {}", entry.label);
    let table = store.execute_query(sqlx::query(entry.statement)).await?;
    info!("Query '{}' returned {} rows", entry.label, table.row_count());

    Ok(table)
}
