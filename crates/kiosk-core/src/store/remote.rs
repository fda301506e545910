//! Client for the spreadsheet proxy endpoints.
//!
//! Each operation maps to one serverless function under the configured base
//! URL. Successful responses wrap the payload in a single-key envelope
//! (`{"groups": [...]}`, `{"member": {...}}`); failures carry
//! `{"error": "message"}` with a 4xx/5xx status.
//!
//! The spreadsheet behind the proxy has no isolation: two adds can race and
//! both succeed with distinct ids.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AttendanceFilter, AttendanceStore, MemberFilter};
use crate::error::StoreError;
use crate::models::{
    AttendanceRecord, Group, Member, NewAttendance, NewGroup, NewMember, NewSubgroup, Subgroup,
};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Row ceiling of the proxy's list endpoints.
pub const REMOTE_ROW_LIMIT: usize = 1000;

const ADD_GROUP: &str = "add-group";
const ADD_SUBGROUP: &str = "add-subgroup";
const ADD_MEMBER: &str = "add-member";
const MARK_ATTENDANCE: &str = "mark-attendance";
const DELETE_GROUP: &str = "delete-group";
const GET_GROUPS: &str = "get-groups";
const GET_SUBGROUPS: &str = "get-subgroups";
const GET_MEMBERS: &str = "get-members";
const GET_ALL_ATTENDANCE: &str = "get-all-attendance";

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Debug, Deserialize)]
struct GroupEnvelope {
    group: Group,
}

#[derive(Debug, Deserialize)]
struct GroupsEnvelope {
    #[serde(default)]
    groups: Vec<Group>,
}

#[derive(Debug, Deserialize)]
struct SubgroupEnvelope {
    subgroup: Subgroup,
}

#[derive(Debug, Deserialize)]
struct SubgroupsEnvelope {
    #[serde(default)]
    subgroups: Vec<Subgroup>,
}

#[derive(Debug, Deserialize)]
struct MemberEnvelope {
    member: Member,
}

#[derive(Debug, Deserialize)]
struct MembersEnvelope {
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct AttendanceEnvelope {
    attendance: AttendanceRecord,
}

#[derive(Debug, Deserialize)]
struct AttendanceListEnvelope {
    #[serde(default)]
    attendance: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteGroupBody<'a> {
    group_id: &'a str,
}

/// Remote backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: String,
}

impl RemoteStore {
    /// Create a client for the proxy rooted at `base_url`
    /// (e.g. `https://kiosk.example.org/.netlify/functions`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Check if response is successful, turning the error envelope into a
    /// `StoreError` if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error)
            .unwrap_or(body);
        Err(StoreError::from_status(status, &message))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, StoreError> {
        let url = self.endpoint(endpoint);
        debug!(url = %url, ?query, "GET");

        let response = self.client.get(&url).query(query).send().await?;
        let response = Self::check_response(response).await?;
        response.json().await.map_err(|e| {
            StoreError::Network(format!("Failed to parse JSON response from {}: {}", endpoint, e))
        })
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let url = self.endpoint(endpoint);
        debug!(url = %url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        let response = Self::check_response(response).await?;
        response.json().await.map_err(|e| {
            StoreError::Network(format!("Failed to parse JSON response from {}: {}", endpoint, e))
        })
    }

    fn warn_if_capped(endpoint: &str, rows: usize) {
        if rows >= REMOTE_ROW_LIMIT {
            warn!(endpoint, rows, limit = REMOTE_ROW_LIMIT, "Row ceiling reached, results may be incomplete");
        }
    }

    async fn fetch_subgroups(&self, group_id: Option<&str>) -> Result<Vec<Subgroup>, StoreError> {
        let query: Vec<(&str, &str)> = group_id.map(|id| ("groupId", id)).into_iter().collect();
        let envelope: SubgroupsEnvelope = self.get(GET_SUBGROUPS, &query).await?;
        Self::warn_if_capped(GET_SUBGROUPS, envelope.subgroups.len());
        // The proxy may ignore the filter; apply it here as well.
        Ok(envelope
            .subgroups
            .into_iter()
            .filter(|s| group_id.map_or(true, |id| s.group_id == id))
            .collect())
    }
}

#[async_trait]
impl AttendanceStore for RemoteStore {
    fn backend_name(&self) -> &'static str {
        "remote"
    }

    async fn add_group(&self, group: NewGroup) -> Result<Group, StoreError> {
        let group = group.validated()?;
        let envelope: GroupEnvelope = self.post(ADD_GROUP, &group).await?;
        Ok(envelope.group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        let envelope: GroupsEnvelope = self.get(GET_GROUPS, &[]).await?;
        Self::warn_if_capped(GET_GROUPS, envelope.groups.len());
        Ok(envelope.groups)
    }

    async fn delete_group(&self, group_id: &str) -> Result<(), StoreError> {
        let _: serde_json::Value = self.post(DELETE_GROUP, &DeleteGroupBody { group_id }).await?;
        Ok(())
    }

    async fn add_subgroup(&self, subgroup: NewSubgroup) -> Result<Subgroup, StoreError> {
        let subgroup = subgroup.validated()?;
        let groups = self.list_groups().await?;
        if !groups.iter().any(|g| g.id == subgroup.group_id) {
            return Err(StoreError::NotFound(format!("group {}", subgroup.group_id)));
        }
        let envelope: SubgroupEnvelope = self.post(ADD_SUBGROUP, &subgroup).await?;
        Ok(envelope.subgroup)
    }

    async fn list_subgroups(&self, group_id: &str) -> Result<Vec<Subgroup>, StoreError> {
        self.fetch_subgroups(Some(group_id)).await
    }

    async fn add_member(&self, member: NewMember) -> Result<Member, StoreError> {
        let member = member.validated()?;
        let (groups, subgroups) =
            futures::try_join!(self.list_groups(), self.fetch_subgroups(None))?;

        if !groups.iter().any(|g| g.id == member.group_id) {
            return Err(StoreError::NotFound(format!("group {}", member.group_id)));
        }
        let subgroup = subgroups
            .iter()
            .find(|s| s.id == member.subgroup_id)
            .ok_or_else(|| StoreError::NotFound(format!("subgroup {}", member.subgroup_id)))?;
        if subgroup.group_id != member.group_id {
            return Err(StoreError::Validation(format!(
                "Subgroup {} does not belong to group {}",
                subgroup.name, member.group_id
            )));
        }

        let envelope: MemberEnvelope = self.post(ADD_MEMBER, &member).await?;
        Ok(envelope.member)
    }

    async fn list_members(&self, filter: MemberFilter) -> Result<Vec<Member>, StoreError> {
        let envelope: MembersEnvelope = match &filter {
            MemberFilter::All => self.get(GET_MEMBERS, &[]).await?,
            MemberFilter::Subgroup(id) => self.get(GET_MEMBERS, &[("subgroupId", id.as_str())]).await?,
        };
        Self::warn_if_capped(GET_MEMBERS, envelope.members.len());
        Ok(envelope
            .members
            .into_iter()
            .filter(|m| filter.matches(m))
            .collect())
    }

    async fn add_attendance(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let record = record.validated()?;
        let envelope: AttendanceEnvelope = self.post(MARK_ATTENDANCE, &record).await?;
        debug!(member = %envelope.attendance.member_name, "Attendance posted");
        Ok(envelope.attendance)
    }

    async fn list_attendance(
        &self,
        filter: AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        // The proxy's today endpoint uses its own UTC date, while service dates
        // are the kiosk's local date, so date filters always run client-side.
        let envelope: AttendanceListEnvelope = self.get(GET_ALL_ATTENDANCE, &[]).await?;
        Self::warn_if_capped(GET_ALL_ATTENDANCE, envelope.attendance.len());
        Ok(envelope
            .attendance
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }
}
