//! Embedded storage backend.
//!
//! Each record type lives in its own table: rows in insertion order, a
//! primary index on `id` and secondary indexes on the fields the kiosk filters
//! by. When opened with a directory, every table is written to
//! `<dir>/<table>.json` after each mutation and read back on open.
//!
//! All tables sit behind one mutex, so every operation (including the
//! multi-table read in `mark_attendance`) runs as a single critical section.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::{local_today, MonotonicClock};
use super::{AttendanceFilter, AttendanceStore, MemberFilter};
use crate::error::StoreError;
use crate::models::{
    new_id, AttendanceRecord, Group, Member, NewAttendance, NewGroup, NewMember, NewSubgroup,
    Subgroup,
};

const IDX_GROUP_ID: &str = "groupId";
const IDX_SUBGROUP_ID: &str = "subgroupId";
const IDX_MEMBER_ID: &str = "memberId";
const IDX_SERVICE_DATE: &str = "serviceDate";

/// A row type that can live in a `Table`.
trait Record: Clone + Serialize + DeserializeOwned {
    const TABLE: &'static str;

    fn id(&self) -> &str;

    /// (index name, key) pairs this row is reachable under.
    fn index_keys(&self) -> Vec<(&'static str, String)>;

    fn stamp(&self) -> DateTime<Utc>;
}

impl Record for Group {
    const TABLE: &'static str = "groups";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Subgroup {
    const TABLE: &'static str = "subgroups";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_keys(&self) -> Vec<(&'static str, String)> {
        vec![(IDX_GROUP_ID, self.group_id.clone())]
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Member {
    const TABLE: &'static str = "members";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            (IDX_GROUP_ID, self.group_id.clone()),
            (IDX_SUBGROUP_ID, self.subgroup_id.clone()),
        ]
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for AttendanceRecord {
    const TABLE: &'static str = "attendance";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            (IDX_MEMBER_ID, self.member_id.clone()),
            (IDX_SERVICE_DATE, self.service_date.to_string()),
        ]
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.check_in_time
    }
}

/// On-disk shape of one table.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableFile<R> {
    records: R,
    saved_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Table<T> {
    rows: Vec<T>,
    by_id: HashMap<String, usize>,
    indexes: HashMap<&'static str, HashMap<String, Vec<usize>>>,
}

impl<T: Record> Table<T> {
    fn new() -> Self {
        Self::from_rows(Vec::new())
    }

    fn from_rows(rows: Vec<T>) -> Self {
        let mut table = Self {
            rows,
            by_id: HashMap::new(),
            indexes: HashMap::new(),
        };
        table.reindex();
        table
    }

    fn reindex(&mut self) {
        self.by_id.clear();
        self.indexes.clear();
        for pos in 0..self.rows.len() {
            self.index_row(pos);
        }
    }

    fn index_row(&mut self, pos: usize) {
        let row = &self.rows[pos];
        self.by_id.insert(row.id().to_string(), pos);
        for (index, key) in row.index_keys() {
            self.indexes
                .entry(index)
                .or_default()
                .entry(key)
                .or_default()
                .push(pos);
        }
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id).map(|&pos| &self.rows[pos])
    }

    fn all(&self) -> Vec<T> {
        self.rows.clone()
    }

    fn lookup(&self, index: &str, key: &str) -> Vec<T> {
        self.indexes
            .get(index)
            .and_then(|keys| keys.get(key))
            .map(|positions| positions.iter().map(|&pos| self.rows[pos].clone()).collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, row: T) -> Result<(), StoreError> {
        if self.by_id.contains_key(row.id()) {
            return Err(StoreError::Storage(format!(
                "duplicate id {} in {}",
                row.id(),
                T::TABLE
            )));
        }
        self.rows.push(row);
        self.index_row(self.rows.len() - 1);
        Ok(())
    }

    /// Remove a row, returning its former position so it can be restored.
    fn remove(&mut self, id: &str) -> Option<(usize, T)> {
        let pos = *self.by_id.get(id)?;
        let row = self.rows.remove(pos);
        self.reindex();
        Some((pos, row))
    }

    fn restore(&mut self, pos: usize, row: T) {
        self.rows.insert(pos.min(self.rows.len()), row);
        self.reindex();
    }

    fn newest_stamp(&self) -> Option<DateTime<Utc>> {
        self.rows.iter().map(T::stamp).max()
    }
}

struct Tables {
    groups: Table<Group>,
    subgroups: Table<Subgroup>,
    members: Table<Member>,
    attendance: Table<AttendanceRecord>,
}

/// Embedded store. Construct once and share as `Arc<dyn AttendanceStore>`.
pub struct LocalStore {
    dir: Option<PathBuf>,
    tables: Mutex<Tables>,
    clock: MonotonicClock,
}

impl LocalStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            tables: Mutex::new(Tables {
                groups: Table::new(),
                subgroups: Table::new(),
                members: Table::new(),
                attendance: Table::new(),
            }),
            clock: MonotonicClock::new(),
        }
    }

    /// Open (or create) a store persisted under `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let tables = Tables {
            groups: Self::load_table(&dir)?,
            subgroups: Self::load_table(&dir)?,
            members: Self::load_table(&dir)?,
            attendance: Self::load_table(&dir)?,
        };

        let clock = MonotonicClock::new();
        let newest = [
            tables.groups.newest_stamp(),
            tables.subgroups.newest_stamp(),
            tables.members.newest_stamp(),
            tables.attendance.newest_stamp(),
        ];
        if let Some(stamp) = newest.into_iter().flatten().max() {
            clock.observe(stamp);
        }

        debug!(
            dir = %dir.display(),
            groups = tables.groups.rows.len(),
            subgroups = tables.subgroups.rows.len(),
            members = tables.members.rows.len(),
            attendance = tables.attendance.rows.len(),
            "Local store opened"
        );

        Ok(Self {
            dir: Some(dir),
            tables: Mutex::new(tables),
            clock,
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn table_path(dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{}.json", table))
    }

    fn load_table<T: Record>(dir: &Path) -> Result<Table<T>, StoreError> {
        let path = Self::table_path(dir, T::TABLE);
        if !path.exists() {
            return Ok(Table::new());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            StoreError::Storage(format!("Failed to read table {}: {}", T::TABLE, e))
        })?;
        let file: TableFile<Vec<T>> = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Storage(format!("Failed to parse table {}: {}", T::TABLE, e))
        })?;

        Ok(Table::from_rows(file.records))
    }

    /// Write one table to disk. The file is replaced by rename so a crash
    /// mid-write leaves the previous version intact.
    fn persist<T: Record>(&self, table: &Table<T>) -> Result<(), StoreError> {
        let Some(ref dir) = self.dir else {
            return Ok(());
        };

        let file = TableFile {
            records: &table.rows,
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&file)?;

        let path = Self::table_path(dir, T::TABLE);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| StoreError::Storage(format!("Failed to write table {}: {}", T::TABLE, e)))
    }

    /// Insert and persist, undoing the insert if the write fails.
    fn insert_row<T: Record>(&self, table: &mut Table<T>, row: T) -> Result<T, StoreError> {
        table.insert(row.clone())?;
        if let Err(e) = self.persist(table) {
            warn!(table = T::TABLE, id = row.id(), error = %e, "Write failed, rolling back insert");
            table.remove(row.id());
            return Err(e);
        }
        Ok(row)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Storage("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AttendanceStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn add_group(&self, group: NewGroup) -> Result<Group, StoreError> {
        let group = group.validated()?.into_group(new_id(), self.clock.now());
        let mut tables = self.lock()?;
        self.insert_row(&mut tables.groups, group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self.lock()?.groups.all())
    }

    async fn delete_group(&self, group_id: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let (pos, row) = tables
            .groups
            .remove(group_id)
            .ok_or_else(|| StoreError::NotFound(format!("group {}", group_id)))?;

        if let Err(e) = self.persist(&tables.groups) {
            warn!(id = group_id, error = %e, "Write failed, restoring group");
            tables.groups.restore(pos, row);
            return Err(e);
        }
        debug!(id = group_id, name = %row.name, "Group deleted");
        Ok(())
    }

    async fn add_subgroup(&self, subgroup: NewSubgroup) -> Result<Subgroup, StoreError> {
        let subgroup = subgroup.validated()?;
        let mut tables = self.lock()?;
        if tables.groups.get(&subgroup.group_id).is_none() {
            return Err(StoreError::NotFound(format!("group {}", subgroup.group_id)));
        }
        let subgroup = subgroup.into_subgroup(new_id(), self.clock.now());
        self.insert_row(&mut tables.subgroups, subgroup)
    }

    async fn list_subgroups(&self, group_id: &str) -> Result<Vec<Subgroup>, StoreError> {
        Ok(self.lock()?.subgroups.lookup(IDX_GROUP_ID, group_id))
    }

    async fn add_member(&self, member: NewMember) -> Result<Member, StoreError> {
        let member = member.validated()?;
        let mut tables = self.lock()?;
        if tables.groups.get(&member.group_id).is_none() {
            return Err(StoreError::NotFound(format!("group {}", member.group_id)));
        }
        let subgroup = tables
            .subgroups
            .get(&member.subgroup_id)
            .ok_or_else(|| StoreError::NotFound(format!("subgroup {}", member.subgroup_id)))?;
        if subgroup.group_id != member.group_id {
            return Err(StoreError::Validation(format!(
                "Subgroup {} does not belong to group {}",
                subgroup.name, member.group_id
            )));
        }
        let member = member.into_member(new_id(), self.clock.now());
        self.insert_row(&mut tables.members, member)
    }

    async fn list_members(&self, filter: MemberFilter) -> Result<Vec<Member>, StoreError> {
        let tables = self.lock()?;
        Ok(match filter {
            MemberFilter::All => tables.members.all(),
            MemberFilter::Subgroup(id) => tables.members.lookup(IDX_SUBGROUP_ID, &id),
        })
    }

    async fn add_attendance(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let record = record.validated()?.into_record(new_id(), self.clock.now());
        let mut tables = self.lock()?;
        self.insert_row(&mut tables.attendance, record)
    }

    async fn list_attendance(
        &self,
        filter: AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let tables = self.lock()?;
        Ok(match filter {
            AttendanceFilter::All => tables.attendance.all(),
            AttendanceFilter::ServiceDate(date) => {
                tables.attendance.lookup(IDX_SERVICE_DATE, &date.to_string())
            }
        })
    }

    async fn mark_attendance(&self, member_id: &str) -> Result<AttendanceRecord, StoreError> {
        let mut tables = self.lock()?;

        let member = tables
            .members
            .get(member_id)
            .ok_or_else(|| StoreError::NotFound(format!("member {}", member_id)))?;
        let group = tables
            .groups
            .get(&member.group_id)
            .ok_or_else(|| StoreError::NotFound(format!("group {}", member.group_id)))?;
        let subgroup = tables
            .subgroups
            .get(&member.subgroup_id)
            .ok_or_else(|| StoreError::NotFound(format!("subgroup {}", member.subgroup_id)))?;

        let record = NewAttendance::snapshot(member, group, subgroup, local_today())
            .into_record(new_id(), self.clock.now());

        let record = self.insert_row(&mut tables.attendance, record)?;
        debug!(member = %record.member_name, group = %record.group_name, "Member checked in");
        Ok(record)
    }
}
