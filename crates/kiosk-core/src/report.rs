//! Attendance statistics for the admin screen.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceRecord, Gender};
use crate::store::local_today;

/// Counts over a set of attendance records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub total_attendees: usize,
    pub gender_stats: HashMap<Gender, usize>,
    pub group_stats: HashMap<String, usize>,
    pub service_date: NaiveDate,
}

impl AttendanceReport {
    /// Build a report. `service_date` is taken from the first record, or is
    /// today's date when `records` is empty.
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut gender_stats = HashMap::new();
        let mut group_stats = HashMap::new();

        for record in records {
            *gender_stats.entry(record.gender).or_insert(0) += 1;
            *group_stats.entry(record.group_name.clone()).or_insert(0) += 1;
        }

        Self {
            total_attendees: records.len(),
            gender_stats,
            group_stats,
            service_date: records
                .first()
                .map(|r| r.service_date)
                .unwrap_or_else(local_today),
        }
    }

    pub fn gender_count(&self, gender: Gender) -> usize {
        self.gender_stats.get(&gender).copied().unwrap_or(0)
    }

    /// Group counts ordered by count (descending), then group name.
    pub fn sorted_group_stats(&self) -> Vec<(&str, usize)> {
        let mut stats: Vec<(&str, usize)> = self
            .group_stats
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        stats
    }
}
