use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_name, require_id};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person belonging to exactly one group/subgroup pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub group_id: String,
    pub subgroup_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields a caller supplies to create a `Member`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub name: String,
    pub gender: Gender,
    pub group_id: String,
    pub subgroup_id: String,
}

impl NewMember {
    pub fn new(
        name: impl Into<String>,
        gender: Gender,
        group_id: impl Into<String>,
        subgroup_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            gender,
            group_id: group_id.into(),
            subgroup_id: subgroup_id.into(),
        }
    }

    pub fn validated(&self) -> Result<Self, StoreError> {
        require_id("Group", &self.group_id)?;
        require_id("Subgroup", &self.subgroup_id)?;
        Ok(Self {
            name: require_name("Member name", &self.name)?,
            gender: self.gender,
            group_id: self.group_id.clone(),
            subgroup_id: self.subgroup_id.clone(),
        })
    }

    pub(crate) fn into_member(self, id: String, created_at: DateTime<Utc>) -> Member {
        Member {
            id,
            name: self.name,
            gender: self.gender,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
            created_at,
        }
    }
}
