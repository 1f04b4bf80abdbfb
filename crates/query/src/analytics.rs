//! Canned occupancy analytics statements.
//!
//! Statements are built against the partitioned events table and executed
//! through the runner like any other query job.

use pipeline_core::Result;

use crate::runner::{QueryResult, QueryRunner};

/// Hourly occupancy rates over the most recent 24 hours of data.
pub fn hourly_occupancy(table: &str) -> String {
    format!(
        "SELECT \
           date_trunc('hour', from_iso8601_timestamp(timestamp)) AS hour, \
           count(*) AS total_events, \
           sum(CASE WHEN status = 'occupied' THEN 1 ELSE 0 END) AS occupied_spots, \
           round(sum(CASE WHEN status = 'occupied' THEN 1 ELSE 0 END) * 100.0 / count(*), 2) AS occupancy_rate \
         FROM {table} \
         GROUP BY date_trunc('hour', from_iso8601_timestamp(timestamp)) \
         ORDER BY hour DESC \
         LIMIT 24"
    )
}

/// Hours ranked by occupancy rate.
pub fn peak_hours(table: &str) -> String {
    format!(
        "SELECT \
           date_trunc('hour', from_iso8601_timestamp(timestamp)) AS hour, \
           count(*) AS total_events, \
           sum(CASE WHEN status = 'occupied' THEN 1 ELSE 0 END) AS occupied_spots, \
           round(sum(CASE WHEN status = 'occupied' THEN 1 ELSE 0 END) * 100.0 / count(*), 2) AS occupancy_rate \
         FROM {table} \
         GROUP BY date_trunc('hour', from_iso8601_timestamp(timestamp)) \
         ORDER BY occupancy_rate DESC \
         LIMIT 10"
    )
}

/// Occupancy rate by day of week.
pub fn day_of_week_occupancy(table: &str) -> String {
    format!(
        "SELECT \
           day_of_week(from_iso8601_timestamp(timestamp)) AS day, \
           count(*) AS total_events, \
           sum(CASE WHEN status = 'occupied' THEN 1 ELSE 0 END) AS occupied_spots, \
           round(sum(CASE WHEN status = 'occupied' THEN 1 ELSE 0 END) * 100.0 / count(*), 2) AS occupancy_rate \
         FROM {table} \
         GROUP BY day_of_week(from_iso8601_timestamp(timestamp)) \
         ORDER BY day"
    )
}

/// Most recent events with their partition columns.
pub fn latest_events(table: &str, limit: usize) -> String {
    format!(
        "SELECT spot_id, status, timestamp, year, month, day, hour \
         FROM {table} \
         ORDER BY timestamp DESC \
         LIMIT {limit}"
    )
}

/// Runs the standard occupancy report suite, returning one result per
/// statement in order.
pub async fn run_occupancy_report(runner: &QueryRunner, table: &str) -> Result<Vec<QueryResult>> {
    let statements = [
        hourly_occupancy(table),
        peak_hours(table),
        day_of_week_occupancy(table),
    ];

    let mut results = Vec::with_capacity(statements.len());
    for statement in &statements {
        results.push(runner.submit_and_wait(statement).await?);
    }
    Ok(results)
}
