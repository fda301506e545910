//! Kiosk navigation state machine.
//!
//! ```text
//! Welcome -> Groups -> Subgroups -> Members -> Confirmation
//!    ^                                              |
//!    +------------- (AfterCheckIn policy) ----------+
//! ```
//!
//! `Admin` is reachable from every screen and leads back to `Welcome`.
//! Each forward step needs the selection made on the previous screen.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AttendanceRecord, Gender, Group, Subgroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Welcome,
    Groups,
    Subgroups,
    Members,
    Confirmation,
    Admin,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Welcome => "Welcome",
            Screen::Groups => "Groups",
            Screen::Subgroups => "Subgroups",
            Screen::Members => "Members",
            Screen::Confirmation => "Checked In",
            Screen::Admin => "Admin",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// What happens once the confirmation screen is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AfterCheckIn {
    /// Stay on the member list of the same subgroup.
    ReturnToMembers,
    /// Clear every selection and start over.
    #[default]
    ResetToWelcome,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Cannot {action} from the {from} screen")]
    InvalidTransition { from: Screen, action: &'static str },
}

#[derive(Debug, Clone)]
pub struct Flow {
    screen: Screen,
    gender: Option<Gender>,
    group: Option<Group>,
    subgroup: Option<Subgroup>,
    last_check_in: Option<AttendanceRecord>,
    after_check_in: AfterCheckIn,
}

impl Default for Flow {
    fn default() -> Self {
        Self::new(AfterCheckIn::default())
    }
}

impl Flow {
    pub fn new(after_check_in: AfterCheckIn) -> Self {
        Self {
            screen: Screen::Welcome,
            gender: None,
            group: None,
            subgroup: None,
            last_check_in: None,
            after_check_in,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    pub fn subgroup(&self) -> Option<&Subgroup> {
        self.subgroup.as_ref()
    }

    pub fn last_check_in(&self) -> Option<&AttendanceRecord> {
        self.last_check_in.as_ref()
    }

    pub fn after_check_in(&self) -> AfterCheckIn {
        self.after_check_in
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            from: self.screen,
            action,
        }
    }

    pub fn select_gender(&mut self, gender: Gender) -> Result<(), FlowError> {
        if self.screen != Screen::Welcome {
            return Err(self.invalid("select a gender"));
        }
        self.gender = Some(gender);
        self.screen = Screen::Groups;
        Ok(())
    }

    pub fn select_group(&mut self, group: Group) -> Result<(), FlowError> {
        if self.screen != Screen::Groups || self.gender.is_none() {
            return Err(self.invalid("select a group"));
        }
        self.group = Some(group);
        self.screen = Screen::Subgroups;
        Ok(())
    }

    /// The subgroup must belong to the selected group.
    pub fn select_subgroup(&mut self, subgroup: Subgroup) -> Result<(), FlowError> {
        let belongs = self
            .group
            .as_ref()
            .is_some_and(|g| g.id == subgroup.group_id);
        if self.screen != Screen::Subgroups || !belongs {
            return Err(self.invalid("select a subgroup"));
        }
        self.subgroup = Some(subgroup);
        self.screen = Screen::Members;
        Ok(())
    }

    pub fn complete_check_in(&mut self, record: AttendanceRecord) -> Result<(), FlowError> {
        if self.screen != Screen::Members || self.subgroup.is_none() {
            return Err(self.invalid("check in"));
        }
        self.last_check_in = Some(record);
        self.screen = Screen::Confirmation;
        Ok(())
    }

    pub fn dismiss_confirmation(&mut self) -> Result<(), FlowError> {
        if self.screen != Screen::Confirmation {
            return Err(self.invalid("dismiss the confirmation"));
        }
        match self.after_check_in {
            AfterCheckIn::ReturnToMembers => {
                self.last_check_in = None;
                self.screen = Screen::Members;
            }
            AfterCheckIn::ResetToWelcome => self.reset(),
        }
        Ok(())
    }

    /// Step one level up, clearing the selection made on the level being left.
    /// Returns the new screen. `Welcome` has no parent and stays put.
    pub fn back(&mut self) -> Screen {
        self.screen = match self.screen {
            Screen::Welcome => Screen::Welcome,
            Screen::Groups => {
                self.gender = None;
                Screen::Welcome
            }
            Screen::Subgroups => {
                self.group = None;
                Screen::Groups
            }
            Screen::Members => {
                self.subgroup = None;
                Screen::Subgroups
            }
            Screen::Confirmation => {
                self.last_check_in = None;
                Screen::Members
            }
            Screen::Admin => {
                self.reset();
                Screen::Welcome
            }
        };
        self.screen
    }

    pub fn open_admin(&mut self) {
        self.screen = Screen::Admin;
    }

    pub fn reset(&mut self) {
        self.screen = Screen::Welcome;
        self.gender = None;
        self.group = None;
        self.subgroup = None;
        self.last_check_in = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use chrono::{NaiveDate, Utc};

    fn group() -> Group {
        Group {
            id: "g1".to_string(),
            name: "Group-1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn subgroup(group_id: &str) -> Subgroup {
        Subgroup {
            id: "s1".to_string(),
            name: "1-1".to_string(),
            group_id: group_id.to_string(),
            created_at: Utc::now(),
        }
    }

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            id: "a1".to_string(),
            member_id: "m1".to_string(),
            member_name: "Jane Smith".to_string(),
            gender: Gender::Female,
            group_name: "Group-1".to_string(),
            subgroup_name: "1-1".to_string(),
            check_in_time: Utc::now(),
            service_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            status: AttendanceStatus::Present,
        }
    }

    fn at_members(policy: AfterCheckIn) -> Flow {
        let mut flow = Flow::new(policy);
        flow.select_gender(Gender::Female).unwrap();
        flow.select_group(group()).unwrap();
        flow.select_subgroup(subgroup("g1")).unwrap();
        flow
    }

    #[test]
    fn test_forward_path() {
        let mut flow = at_members(AfterCheckIn::ResetToWelcome);
        assert_eq!(flow.screen(), Screen::Members);
        assert_eq!(flow.gender(), Some(Gender::Female));
        assert_eq!(flow.subgroup().map(|s| s.name.as_str()), Some("1-1"));

        flow.complete_check_in(record()).unwrap();
        assert_eq!(flow.screen(), Screen::Confirmation);
        assert_eq!(flow.last_check_in().map(|r| r.id.as_str()), Some("a1"));
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let mut flow = Flow::default();
        let err = flow.select_group(group()).unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidTransition {
                from: Screen::Welcome,
                action: "select a group"
            }
        );
        assert_eq!(flow.screen(), Screen::Welcome);
        assert!(flow.group().is_none());

        assert!(flow.complete_check_in(record()).is_err());
        assert!(flow.dismiss_confirmation().is_err());
    }

    #[test]
    fn test_subgroup_must_belong_to_group() {
        let mut flow = Flow::default();
        flow.select_gender(Gender::Male).unwrap();
        flow.select_group(group()).unwrap();

        assert!(flow.select_subgroup(subgroup("other")).is_err());
        assert_eq!(flow.screen(), Screen::Subgroups);
    }

    #[test]
    fn test_back_clears_one_level() {
        let mut flow = at_members(AfterCheckIn::ResetToWelcome);

        assert_eq!(flow.back(), Screen::Subgroups);
        assert!(flow.subgroup().is_none());
        assert!(flow.group().is_some());

        assert_eq!(flow.back(), Screen::Groups);
        assert!(flow.group().is_none());
        assert_eq!(flow.gender(), Some(Gender::Female));

        assert_eq!(flow.back(), Screen::Welcome);
        assert!(flow.gender().is_none());
        assert_eq!(flow.back(), Screen::Welcome);
    }

    #[test]
    fn test_after_check_in_policies() {
        let mut flow = at_members(AfterCheckIn::ReturnToMembers);
        flow.complete_check_in(record()).unwrap();
        flow.dismiss_confirmation().unwrap();
        assert_eq!(flow.screen(), Screen::Members);
        assert!(flow.subgroup().is_some());
        assert!(flow.last_check_in().is_none());

        let mut flow = at_members(AfterCheckIn::ResetToWelcome);
        flow.complete_check_in(record()).unwrap();
        flow.dismiss_confirmation().unwrap();
        assert_eq!(flow.screen(), Screen::Welcome);
        assert!(flow.gender().is_none());
        assert!(flow.group().is_none());
    }

    #[test]
    fn test_admin_from_anywhere_returns_to_welcome() {
        let mut flow = at_members(AfterCheckIn::ReturnToMembers);
        flow.open_admin();
        assert_eq!(flow.screen(), Screen::Admin);
        assert_eq!(flow.back(), Screen::Welcome);
        assert!(flow.subgroup().is_none());
    }

    #[test]
    fn test_after_check_in_serde() {
        let json = serde_json::to_string(&AfterCheckIn::ReturnToMembers).unwrap();
        assert_eq!(json, "\"returnToMembers\"");
        assert_eq!(AfterCheckIn::default(), AfterCheckIn::ResetToWelcome);
    }
}
