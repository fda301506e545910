use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_name, require_id};
use crate::error::StoreError;

/// Top-level organizational unit (e.g. a ministry team).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Subdivision of a `Group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgroup {
    pub id: String,
    pub name: String,
    pub group_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields a caller supplies to create a `Group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
}

impl NewGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns an unchanged copy, or a validation error for a blank name.
    pub fn validated(&self) -> Result<Self, StoreError> {
        Ok(Self {
            name: require_name("Group name", &self.name)?,
        })
    }

    pub(crate) fn into_group(self, id: String, created_at: DateTime<Utc>) -> Group {
        Group {
            id,
            name: self.name,
            created_at,
        }
    }
}

/// Fields a caller supplies to create a `Subgroup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubgroup {
    pub name: String,
    pub group_id: String,
}

impl NewSubgroup {
    pub fn new(name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group_id: group_id.into(),
        }
    }

    pub fn validated(&self) -> Result<Self, StoreError> {
        require_id("Group", &self.group_id)?;
        Ok(Self {
            name: require_name("Subgroup name", &self.name)?,
            group_id: self.group_id.clone(),
        })
    }

    pub(crate) fn into_subgroup(self, id: String, created_at: DateTime<Utc>) -> Subgroup {
        Subgroup {
            id,
            name: self.name,
            group_id: self.group_id,
            created_at,
        }
    }
}
