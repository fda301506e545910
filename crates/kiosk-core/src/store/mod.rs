//! Data access layer.
//!
//! `AttendanceStore` is the single interface the kiosk talks to. Two
//! implementations exist and are chosen by configuration:
//!
//! - `LocalStore`: embedded tables with secondary indexes, optionally
//!   persisted as JSON files in a data directory
//! - `RemoteStore`: client for the spreadsheet proxy endpoints
//!
//! Both backends perform the member → group → subgroup join for
//! `mark_attendance` themselves, so callers never assemble attendance names.

pub mod clock;
pub mod local;
pub mod remote;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;
use crate::models::{
    AttendanceRecord, Gender, Group, Member, NewAttendance, NewGroup, NewMember, NewSubgroup,
    Subgroup,
};

pub use clock::local_today;
pub use local::LocalStore;
pub use remote::RemoteStore;

/// Application name used for the default data directory
const APP_NAME: &str = "checkin-kiosk";

/// Which members `list_members` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberFilter {
    All,
    Subgroup(String),
}

impl MemberFilter {
    pub fn matches(&self, member: &Member) -> bool {
        match self {
            MemberFilter::All => true,
            MemberFilter::Subgroup(id) => member.subgroup_id == *id,
        }
    }
}

/// Which attendance rows `list_attendance` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceFilter {
    All,
    ServiceDate(NaiveDate),
}

impl AttendanceFilter {
    /// Rows for the kiosk's current calendar date.
    pub fn today() -> Self {
        AttendanceFilter::ServiceDate(local_today())
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        match self {
            AttendanceFilter::All => true,
            AttendanceFilter::ServiceDate(date) => record.service_date == *date,
        }
    }
}

/// Create/list operations over the four record types.
///
/// Every operation is a single request/response; failures are returned to
/// the caller as-is and never retried.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Short backend name for logs and the status bar.
    fn backend_name(&self) -> &'static str;

    // ───────────────────────────── Groups ─────────────────────────────

    async fn add_group(&self, group: NewGroup) -> Result<Group, StoreError>;

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    /// Remove a group. Its subgroups and members are left in place.
    async fn delete_group(&self, group_id: &str) -> Result<(), StoreError>;

    // ──────────────────────────── Subgroups ───────────────────────────

    async fn add_subgroup(&self, subgroup: NewSubgroup) -> Result<Subgroup, StoreError>;

    async fn list_subgroups(&self, group_id: &str) -> Result<Vec<Subgroup>, StoreError>;

    // ───────────────────────────── Members ────────────────────────────

    async fn add_member(&self, member: NewMember) -> Result<Member, StoreError>;

    async fn list_members(&self, filter: MemberFilter) -> Result<Vec<Member>, StoreError>;

    // ──────────────────────────── Attendance ──────────────────────────

    /// Persist an already-denormalized row, stamping `id` and `checkInTime`.
    async fn add_attendance(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    async fn list_attendance(
        &self,
        filter: AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Check a member in for today.
    ///
    /// Looks up the member, its group and its subgroup, snapshots their names
    /// into a `Present` row and persists it. Nothing is written when any
    /// lookup misses.
    async fn mark_attendance(&self, member_id: &str) -> Result<AttendanceRecord, StoreError> {
        let (members, groups) = futures::try_join!(
            self.list_members(MemberFilter::All),
            self.list_groups()
        )?;
        let member = members
            .iter()
            .find(|m| m.id == member_id)
            .ok_or_else(|| StoreError::NotFound(format!("member {}", member_id)))?;
        let subgroups = self.list_subgroups(&member.group_id).await?;
        let snapshot =
            NewAttendance::resolve(member_id, &members, &groups, &subgroups, local_today())?;
        self.add_attendance(snapshot).await
    }
}

/// Backend selection as it appears in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreBackend {
    Local {
        #[serde(default, rename = "dataDir", skip_serializing_if = "Option::is_none")]
        data_dir: Option<PathBuf>,
    },
    Remote {
        #[serde(rename = "baseUrl")]
        base_url: String,
    },
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Local { data_dir: None }
    }
}

impl StoreBackend {
    /// Default location for the local tables.
    pub fn default_data_dir() -> Result<PathBuf, StoreError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| StoreError::Storage("Could not find data directory".to_string()))?;
        Ok(data_dir.join(APP_NAME))
    }
}

/// Construct the configured backend. Called once at startup; the returned
/// handle is passed to everything that needs storage.
pub fn open_store(backend: &StoreBackend) -> Result<Arc<dyn AttendanceStore>, StoreError> {
    match backend {
        StoreBackend::Local { data_dir } => {
            let dir = match data_dir {
                Some(dir) => dir.clone(),
                None => StoreBackend::default_data_dir()?,
            };
            info!(dir = %dir.display(), "Opening local store");
            Ok(Arc::new(LocalStore::open(dir)?))
        }
        StoreBackend::Remote { base_url } => {
            info!(base_url = %base_url, "Using remote store");
            Ok(Arc::new(RemoteStore::new(base_url)?))
        }
    }
}

/// Number of default groups created on first run.
const DEFAULT_GROUP_COUNT: usize = 7;

/// Populate an empty store with `Group-1` … `Group-7`, two subgroups each and
/// two sample members. Returns `false` without writing when groups exist.
pub async fn seed_defaults(store: &dyn AttendanceStore) -> Result<bool, StoreError> {
    if !store.list_groups().await?.is_empty() {
        return Ok(false);
    }

    info!(backend = store.backend_name(), "Seeding default groups");

    let mut first: Option<(Group, Subgroup)> = None;
    for i in 1..=DEFAULT_GROUP_COUNT {
        let group = store.add_group(NewGroup::new(format!("Group-{}", i))).await?;
        let sub1 = store
            .add_subgroup(NewSubgroup::new(format!("{}-1", i), group.id.clone()))
            .await?;
        store
            .add_subgroup(NewSubgroup::new(format!("{}-2", i), group.id.clone()))
            .await?;
        if first.is_none() {
            first = Some((group, sub1));
        }
    }

    if let Some((group, subgroup)) = first {
        for (name, gender) in [("John Doe", Gender::Male), ("Jane Smith", Gender::Female)] {
            store
                .add_member(NewMember::new(name, gender, group.id.clone(), subgroup.id.clone()))
                .await?;
        }
    }

    Ok(true)
}
