//! CSV export of attendance records.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, TimeZone, Timelike};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::error::StoreError;
use crate::models::AttendanceRecord;

/// Header row, written unquoted.
pub const EXPORT_HEADER: &str = "ID,Name,Gender,Group,Subgroup,Check-In Time,Service ID,Status";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Service slot derived from the local check-in hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLabel {
    Morning,
    Afternoon,
    Evening,
}

impl ServiceLabel {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => ServiceLabel::Morning,
            12..=16 => ServiceLabel::Afternoon,
            _ => ServiceLabel::Evening,
        }
    }
}

impl fmt::Display for ServiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceLabel::Morning => "Morning",
            ServiceLabel::Afternoon => "Afternoon",
            ServiceLabel::Evening => "Evening",
        };
        write!(f, "{} Service", name)
    }
}

/// Render `records` as CSV with check-in times in the kiosk's local zone.
pub fn export_csv(records: &[AttendanceRecord]) -> Result<String, StoreError> {
    export_csv_in(records, &Local)
}

/// Render `records` as CSV with check-in times in `tz`.
///
/// Every data field is double-quoted and rows are separated by `\n` with no
/// trailing newline.
pub fn export_csv_in<Tz: TimeZone>(records: &[AttendanceRecord], tz: &Tz) -> Result<String, StoreError>
where
    Tz::Offset: fmt::Display,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for (index, record) in records.iter().enumerate() {
        let local = record.check_in_time.with_timezone(tz);
        writer
            .write_record([
                format!("{:03}", index + 1),
                record.member_name.clone(),
                record.gender.to_string(),
                record.group_name.clone(),
                record.subgroup_name.clone(),
                local.format(TIME_FORMAT).to_string(),
                ServiceLabel::from_hour(local.hour()).to_string(),
                record.status.to_string(),
            ])
            .map_err(|e| StoreError::Storage(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Storage(format!("Failed to flush CSV: {}", e)))?;
    let rows = String::from_utf8(bytes)
        .map_err(|e| StoreError::Storage(format!("CSV is not valid UTF-8: {}", e)))?;

    let mut out = String::from(EXPORT_HEADER);
    let rows = rows.trim_end_matches('\n');
    if !rows.is_empty() {
        out.push('\n');
        out.push_str(rows);
    }
    Ok(out)
}

/// `attendance_YYYY-MM-DD.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("attendance_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the export for `date` into `dir`, returning the file path.
pub fn write_export(
    dir: &Path,
    records: &[AttendanceRecord],
    date: NaiveDate,
) -> Result<PathBuf, StoreError> {
    let csv = export_csv(records)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(date));
    fs::write(&path, csv)?;
    info!(path = %path.display(), rows = records.len(), "Exported attendance");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, Gender};
    use chrono::{FixedOffset, Utc};

    fn record_at(name: &str, hour: u32) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("a-{}", name),
            member_id: format!("m-{}", name),
            member_name: name.to_string(),
            gender: Gender::Female,
            group_name: "Group-1".to_string(),
            subgroup_name: "1-1".to_string(),
            check_in_time: Utc.with_ymd_and_hms(2024, 3, 10, hour, 5, 30).unwrap(),
            service_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            status: AttendanceStatus::Present,
        }
    }

    #[test]
    fn test_service_label_boundaries() {
        assert_eq!(ServiceLabel::from_hour(0), ServiceLabel::Morning);
        assert_eq!(ServiceLabel::from_hour(11), ServiceLabel::Morning);
        assert_eq!(ServiceLabel::from_hour(12), ServiceLabel::Afternoon);
        assert_eq!(ServiceLabel::from_hour(16), ServiceLabel::Afternoon);
        assert_eq!(ServiceLabel::from_hour(17), ServiceLabel::Evening);
        assert_eq!(ServiceLabel::from_hour(23), ServiceLabel::Evening);
        assert_eq!(ServiceLabel::Afternoon.to_string(), "Afternoon Service");
    }

    #[test]
    fn test_export_rows() {
        let records = vec![
            record_at("Jane Smith", 9),
            record_at("Mary Ann", 14),
            record_at("Ruth", 20),
        ];
        let csv = export_csv_in(&records, &Utc).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], EXPORT_HEADER);
        assert_eq!(
            lines[1],
            r#""001","Jane Smith","Female","Group-1","1-1","2024-03-10 09:05:30","Morning Service","Present""#
        );
        assert!(lines[2].contains(r#""Afternoon Service""#));
        assert!(lines[3].starts_with(r#""003","Ruth""#));
        assert!(lines[3].contains(r#""Evening Service""#));
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_export_uses_given_zone() {
        let records = vec![record_at("Jane", 10)];
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let csv = export_csv_in(&records, &offset).unwrap();

        assert!(csv.contains(r#""2024-03-10 18:05:30","Evening Service""#));
    }

    #[test]
    fn test_export_empty_is_header_only() {
        assert_eq!(export_csv_in(&[], &Utc).unwrap(), EXPORT_HEADER);
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let path = write_export(dir.path(), &[record_at("Jane", 9)], date).unwrap();

        assert_eq!(path.file_name().unwrap(), "attendance_2024-03-10.csv");
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with(EXPORT_HEADER));
    }
}
