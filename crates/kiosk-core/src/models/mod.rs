//! Record schemas for the kiosk.
//!
//! This module contains the four stored record types and the inputs used to
//! create them:
//!
//! - `Group`, `Subgroup`: the two-level organization hierarchy
//! - `Member`, `Gender`: people belonging to one group/subgroup pair
//! - `AttendanceRecord`, `AttendanceStatus`: denormalized check-in events
//!
//! Field names serialize in camelCase so the same shapes are used on disk and
//! on the wire to the spreadsheet proxy.

pub mod attendance;
pub mod group;
pub mod member;

pub use attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
pub use group::{Group, NewGroup, NewSubgroup, Subgroup};
pub use member::{Gender, Member, NewMember};

use crate::error::StoreError;

/// Reject a name that is blank after trimming. The value is kept as given.
pub(crate) fn require_name(field: &str, value: &str) -> Result<String, StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Reject an empty reference id.
pub(crate) fn require_id(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Generate a fresh record identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
