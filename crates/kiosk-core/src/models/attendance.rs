use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{require_name, require_id, Gender, Group, Member, Subgroup};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A check-in event.
///
/// Member, group and subgroup names are copied when the record is created and
/// are never re-derived, so renaming a group later leaves history untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub member_id: String,
    pub member_name: String,
    pub gender: Gender,
    pub group_name: String,
    pub subgroup_name: String,
    pub check_in_time: DateTime<Utc>,
    pub service_date: NaiveDate,
    pub status: AttendanceStatus,
}

/// Already-denormalized fields for an attendance row; the store only stamps
/// `id` and `checkInTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendance {
    pub member_id: String,
    pub member_name: String,
    pub gender: Gender,
    pub group_name: String,
    pub subgroup_name: String,
    pub service_date: NaiveDate,
    pub status: AttendanceStatus,
}

impl NewAttendance {
    /// Snapshot a member's current names as a `Present` row for `service_date`.
    pub fn snapshot(
        member: &Member,
        group: &Group,
        subgroup: &Subgroup,
        service_date: NaiveDate,
    ) -> Self {
        Self {
            member_id: member.id.clone(),
            member_name: member.name.clone(),
            gender: member.gender,
            group_name: group.name.clone(),
            subgroup_name: subgroup.name.clone(),
            service_date,
            status: AttendanceStatus::Present,
        }
    }

    /// Resolve `member_id` against the given lists and snapshot the result.
    ///
    /// Fails with `NotFound` when the member, its group or its subgroup is missing.
    pub fn resolve(
        member_id: &str,
        members: &[Member],
        groups: &[Group],
        subgroups: &[Subgroup],
        service_date: NaiveDate,
    ) -> Result<Self, StoreError> {
        let member = members
            .iter()
            .find(|m| m.id == member_id)
            .ok_or_else(|| StoreError::NotFound(format!("member {}", member_id)))?;
        let group = groups
            .iter()
            .find(|g| g.id == member.group_id)
            .ok_or_else(|| StoreError::NotFound(format!("group {}", member.group_id)))?;
        let subgroup = subgroups
            .iter()
            .find(|s| s.id == member.subgroup_id)
            .ok_or_else(|| StoreError::NotFound(format!("subgroup {}", member.subgroup_id)))?;
        Ok(Self::snapshot(member, group, subgroup, service_date))
    }

    pub fn validated(&self) -> Result<Self, StoreError> {
        require_id("Member", &self.member_id)?;
        Ok(Self {
            member_id: self.member_id.clone(),
            member_name: require_name("Member name", &self.member_name)?,
            gender: self.gender,
            group_name: require_name("Group name", &self.group_name)?,
            subgroup_name: require_name("Subgroup name", &self.subgroup_name)?,
            service_date: self.service_date,
            status: self.status,
        })
    }

    pub(crate) fn into_record(self, id: String, check_in_time: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            id,
            member_id: self.member_id,
            member_name: self.member_name,
            gender: self.gender,
            group_name: self.group_name,
            subgroup_name: self.subgroup_name,
            check_in_time,
            service_date: self.service_date,
            status: self.status,
        }
    }
}
