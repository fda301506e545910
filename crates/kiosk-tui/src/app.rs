//! Application state management for the kiosk.
//!
//! `App` owns the store handle, the navigation `Flow` and everything the
//! screens draw from. Store calls run on spawned tasks; their results come
//! back through a channel and are applied in `check_background_tasks`. While
//! one is in flight `pending` is set and no further store action is started.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kiosk_core::store::local_today;
use kiosk_core::{
    write_export, AttendanceFilter, AttendanceRecord, AttendanceReport, AttendanceStore, Flow,
    Gender, Group, Member, MemberFilter, NewGroup, NewMember, NewSubgroup, Screen, StoreError,
    Subgroup,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::utils::contains_ignore_case;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// How long the confirmation screen stays up before dismissing itself.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a toast stays in the status bar.
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Number of records shown in the admin history list.
pub const HISTORY_LIMIT: usize = 50;

/// Maximum length of a name typed into a form.
const MAX_NAME_LENGTH: usize = 60;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    EditingForm,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// What an add form creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Group,
    Subgroup,
    Member,
}

impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::Group => "Add Group",
            FormKind::Subgroup => "Add Subgroup",
            FormKind::Member => "Add Member",
        }
    }

    fn field(&self) -> &'static str {
        match self {
            FormKind::Group => "Group name",
            FormKind::Subgroup => "Subgroup name",
            FormKind::Member => "Member name",
        }
    }
}

/// Single-field add form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub name: String,
    pub error: Option<String>,
}

impl Form {
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            name: String::new(),
            error: None,
        }
    }

    pub fn push(&mut self, c: char) {
        if self.name.chars().count() < MAX_NAME_LENGTH && !c.is_control() {
            self.name.push(c);
            self.error = None;
        }
    }

    pub fn pop(&mut self) {
        self.name.pop();
    }

    /// The trimmed name, or the message to show under the field.
    pub fn validated_name(&self) -> Result<String, String> {
        let name = self.name.trim();
        if name.is_empty() {
            Err(format!("{} is required", self.kind.field()))
        } else {
            Ok(name.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// Short-lived status bar message.
#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

impl Toast {
    fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_DURATION
    }
}

/// Which records an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    Today,
    All,
}

/// Data behind the admin screen.
#[derive(Debug, Clone)]
pub struct AdminData {
    pub today: Vec<AttendanceRecord>,
    pub all: Vec<AttendanceRecord>,
    pub report: AttendanceReport,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned store calls.
#[derive(Debug)]
enum TaskResult {
    Groups(Vec<Group>),
    Subgroups(Vec<Subgroup>),
    Members(Vec<Member>),
    CheckedIn(AttendanceRecord),
    /// A write succeeded; `then` carries the refreshed list.
    Saved {
        message: String,
        then: Box<TaskResult>,
    },
    Admin {
        today: Vec<AttendanceRecord>,
        all: Vec<AttendanceRecord>,
    },
    /// `None` when there was nothing to export.
    Exported(Option<PathBuf>),
    Failed(StoreError),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    store: Arc<dyn AttendanceStore>,
    pub flow: Flow,

    // UI State
    pub state: AppState,
    pub search_query: String,
    pub selection: usize,
    pub gender_selection: usize,
    pub history_scroll: usize,
    pub form: Option<Form>,
    pub toast: Option<Toast>,
    confirmed_at: Option<Instant>,

    // Loaded data
    pub groups: Vec<Group>,
    pub subgroups: Vec<Subgroup>,
    pub members: Vec<Member>,
    pub admin: Option<AdminData>,

    // Background task channel
    pub pending: bool,
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn AttendanceStore>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let flow = Flow::new(config.after_check_in);

        Self {
            config,
            store,
            flow,

            state: AppState::Normal,
            search_query: String::new(),
            selection: 0,
            gender_selection: 0,
            history_scroll: 0,
            form: None,
            toast: None,
            confirmed_at: None,

            groups: Vec::new(),
            subgroups: Vec::new(),
            members: Vec::new(),
            admin: None,

            pending: false,
            task_rx: rx,
            task_tx: tx,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn screen(&self) -> Screen {
        self.flow.screen()
    }

    // =========================================================================
    // Toasts
    // =========================================================================

    pub fn show_toast(&mut self, kind: ToastKind, title: &str, message: impl Into<String>) {
        self.toast = Some(Toast {
            title: title.to_string(),
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    fn show_error(&mut self, err: &StoreError) {
        warn!(error = %err, screen = %self.screen(), "Store operation failed");
        self.show_toast(ToastKind::Error, "Error", err.to_string());
    }

    /// Expire toasts and auto-dismiss the confirmation screen.
    pub fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
        if self.screen() == Screen::Confirmation
            && self
                .confirmed_at
                .is_some_and(|at| at.elapsed() >= CONFIRMATION_TIMEOUT)
        {
            self.dismiss_confirmation();
        }
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Run `task` on the runtime unless another store call is in flight.
    /// Returns whether the task was started.
    fn spawn_task<F>(&mut self, label: &'static str, task: F) -> bool
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        if self.pending {
            debug!(label, "Ignoring action while another is pending");
            return false;
        }
        self.pending = true;
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = task.await;
            if tx.send(result).await.is_err() {
                warn!(label, "App dropped before task finished");
            }
        });
        true
    }

    /// Apply any results that have arrived.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.pending = false;
            self.process_task_result(result);
        }
    }

    /// Wait for the in-flight task, if any, and apply its result.
    #[cfg(test)]
    pub async fn wait_for_task(&mut self) {
        if !self.pending {
            return;
        }
        if let Some(result) = self.task_rx.recv().await {
            self.pending = false;
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Groups(groups) => {
                self.groups = groups;
                self.clamp_selection();
            }
            TaskResult::Subgroups(subgroups) => {
                self.subgroups = subgroups;
                self.clamp_selection();
            }
            TaskResult::Members(members) => {
                self.members = members;
                self.clamp_selection();
            }
            TaskResult::CheckedIn(record) => {
                info!(member = %record.member_name, subgroup = %record.subgroup_name, "Checked in");
                match self.flow.complete_check_in(record) {
                    Ok(()) => self.confirmed_at = Some(Instant::now()),
                    Err(e) => warn!(error = %e, "Check-in finished after leaving the member list"),
                }
            }
            TaskResult::Saved { message, then } => {
                self.show_toast(ToastKind::Success, "Saved", message);
                self.process_task_result(*then);
            }
            TaskResult::Admin { today, all } => {
                let report = AttendanceReport::from_records(&today);
                self.admin = Some(AdminData { today, all, report });
            }
            TaskResult::Exported(Some(path)) => {
                self.show_toast(ToastKind::Success, "Exported", path.display().to_string());
            }
            TaskResult::Exported(None) => {
                self.show_toast(ToastKind::Info, "No Data", "There is no attendance data to export");
            }
            TaskResult::Failed(err) => self.show_error(&err),
        }
    }

    fn finish<T>(result: Result<T, StoreError>, done: impl FnOnce(T) -> TaskResult) -> TaskResult {
        match result {
            Ok(value) => done(value),
            Err(e) => TaskResult::Failed(e),
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    pub fn load_groups(&mut self) {
        let store = Arc::clone(&self.store);
        self.spawn_task("load groups", async move {
            Self::finish(store.list_groups().await, TaskResult::Groups)
        });
    }

    fn load_subgroups(&mut self, group_id: String) {
        let store = Arc::clone(&self.store);
        self.spawn_task("load subgroups", async move {
            Self::finish(store.list_subgroups(&group_id).await, TaskResult::Subgroups)
        });
    }

    fn load_members(&mut self, subgroup_id: String) {
        let store = Arc::clone(&self.store);
        self.spawn_task("load members", async move {
            Self::finish(
                store.list_members(MemberFilter::Subgroup(subgroup_id)).await,
                TaskResult::Members,
            )
        });
    }

    pub fn load_admin(&mut self) {
        let store = Arc::clone(&self.store);
        self.spawn_task("load admin", async move {
            let loaded = futures::try_join!(
                store.list_attendance(AttendanceFilter::today()),
                store.list_attendance(AttendanceFilter::All)
            );
            Self::finish(loaded, |(today, all)| TaskResult::Admin { today, all })
        });
    }

    // =========================================================================
    // Filtered views
    // =========================================================================

    pub fn visible_groups(&self) -> Vec<&Group> {
        self.groups
            .iter()
            .filter(|g| contains_ignore_case(&g.name, &self.search_query))
            .collect()
    }

    pub fn visible_subgroups(&self) -> Vec<&Subgroup> {
        self.subgroups
            .iter()
            .filter(|s| contains_ignore_case(&s.name, &self.search_query))
            .collect()
    }

    /// Members of the selected subgroup with the selected gender.
    pub fn visible_members(&self) -> Vec<&Member> {
        let gender = self.flow.gender();
        self.members
            .iter()
            .filter(|m| gender.map_or(true, |g| m.gender == g))
            .filter(|m| contains_ignore_case(&m.name, &self.search_query))
            .collect()
    }

    /// Most recent check-ins, newest first.
    pub fn history(&self) -> Vec<&AttendanceRecord> {
        let Some(admin) = &self.admin else {
            return Vec::new();
        };
        let mut records: Vec<&AttendanceRecord> = admin.all.iter().collect();
        records.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        records.truncate(HISTORY_LIMIT);
        records
    }

    fn visible_len(&self) -> usize {
        match self.screen() {
            Screen::Welcome => Gender::ALL.len(),
            Screen::Groups => self.visible_groups().len(),
            Screen::Subgroups => self.visible_subgroups().len(),
            Screen::Members => self.visible_members().len(),
            Screen::Admin => self.history().len(),
            Screen::Confirmation => 0,
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if self.selection >= len {
            self.selection = len.saturating_sub(1);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn move_selection(&mut self, down: bool) {
        match self.screen() {
            Screen::Welcome => {
                self.gender_selection = if down { 1 } else { 0 };
            }
            Screen::Admin => {
                let max = self.history().len().saturating_sub(1);
                self.history_scroll = if down {
                    (self.history_scroll + 1).min(max)
                } else {
                    self.history_scroll.saturating_sub(1)
                };
            }
            _ => {
                let max = self.visible_len().saturating_sub(1);
                self.selection = if down {
                    (self.selection + 1).min(max)
                } else {
                    self.selection.saturating_sub(1)
                };
            }
        }
    }

    fn reset_list_state(&mut self) {
        self.search_query.clear();
        self.selection = 0;
    }

    pub fn select_gender(&mut self, gender: Gender) {
        if self.pending {
            return;
        }
        if let Err(e) = self.flow.select_gender(gender) {
            warn!(error = %e, "Gender selection rejected");
            return;
        }
        debug!(gender = %gender, "Gender selected");
        self.reset_list_state();
        self.load_groups();
    }

    /// Enter on the current screen.
    pub fn activate(&mut self) {
        if self.pending {
            return;
        }
        match self.screen() {
            Screen::Welcome => {
                if let Some(gender) = Gender::ALL.get(self.gender_selection).copied() {
                    self.select_gender(gender);
                }
            }
            Screen::Groups => {
                let Some(group) = self.visible_groups().get(self.selection).map(|g| (*g).clone())
                else {
                    return;
                };
                let group_id = group.id.clone();
                if let Err(e) = self.flow.select_group(group) {
                    warn!(error = %e, "Group selection rejected");
                    return;
                }
                self.reset_list_state();
                self.subgroups.clear();
                self.load_subgroups(group_id);
            }
            Screen::Subgroups => {
                let Some(subgroup) = self
                    .visible_subgroups()
                    .get(self.selection)
                    .map(|s| (*s).clone())
                else {
                    return;
                };
                let subgroup_id = subgroup.id.clone();
                if let Err(e) = self.flow.select_subgroup(subgroup) {
                    warn!(error = %e, "Subgroup selection rejected");
                    return;
                }
                self.reset_list_state();
                self.members.clear();
                self.load_members(subgroup_id);
            }
            Screen::Members => self.check_in_selected(),
            Screen::Confirmation => self.dismiss_confirmation(),
            Screen::Admin => {}
        }
    }

    pub fn go_back(&mut self) {
        if self.pending {
            return;
        }
        let screen = self.flow.back();
        self.reset_list_state();
        self.confirmed_at = None;
        if screen == Screen::Welcome {
            self.admin = None;
        }
    }

    pub fn open_admin(&mut self) {
        if self.pending {
            return;
        }
        self.flow.open_admin();
        self.reset_list_state();
        self.history_scroll = 0;
        self.confirmed_at = None;
        self.load_admin();
    }

    pub fn dismiss_confirmation(&mut self) {
        if let Err(e) = self.flow.dismiss_confirmation() {
            debug!(error = %e, "Nothing to dismiss");
            return;
        }
        self.confirmed_at = None;
        self.search_query.clear();
        if self.screen() == Screen::Welcome {
            self.selection = 0;
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    fn check_in_selected(&mut self) {
        let Some(member_id) = self
            .visible_members()
            .get(self.selection)
            .map(|m| m.id.clone())
        else {
            return;
        };
        let store = Arc::clone(&self.store);
        self.spawn_task("check in", async move {
            Self::finish(store.mark_attendance(&member_id).await, TaskResult::CheckedIn)
        });
    }

    /// Open the add form that fits the current screen.
    pub fn open_form(&mut self) {
        let kind = match self.screen() {
            Screen::Groups => FormKind::Group,
            Screen::Subgroups => FormKind::Subgroup,
            Screen::Members => FormKind::Member,
            _ => return,
        };
        self.form = Some(Form::new(kind));
        self.state = AppState::EditingForm;
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    /// Validate and submit the open form. The form stays open with an error
    /// message when validation fails.
    pub fn submit_form(&mut self) {
        if self.pending {
            return;
        }
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let name = match form.validated_name() {
            Ok(name) => name,
            Err(message) => {
                form.error = Some(message);
                return;
            }
        };
        let kind = form.kind;
        let store = Arc::clone(&self.store);

        let started = match kind {
            FormKind::Group => self.spawn_task("add group", async move {
                match store.add_group(NewGroup::new(name)).await {
                    Ok(group) => Self::finish(store.list_groups().await, |groups| {
                        TaskResult::Saved {
                            message: format!("Added group {}", group.name),
                            then: Box::new(TaskResult::Groups(groups)),
                        }
                    }),
                    Err(e) => TaskResult::Failed(e),
                }
            }),
            FormKind::Subgroup => {
                let Some(group_id) = self.flow.group().map(|g| g.id.clone()) else {
                    return;
                };
                self.spawn_task("add subgroup", async move {
                    match store.add_subgroup(NewSubgroup::new(name, group_id.clone())).await {
                        Ok(subgroup) => Self::finish(store.list_subgroups(&group_id).await, |subgroups| {
                            TaskResult::Saved {
                                message: format!("Added subgroup {}", subgroup.name),
                                then: Box::new(TaskResult::Subgroups(subgroups)),
                            }
                        }),
                        Err(e) => TaskResult::Failed(e),
                    }
                })
            }
            FormKind::Member => {
                let (Some(gender), Some(group), Some(subgroup)) =
                    (self.flow.gender(), self.flow.group(), self.flow.subgroup())
                else {
                    return;
                };
                let new = NewMember::new(name, gender, group.id.clone(), subgroup.id.clone());
                let subgroup_id = subgroup.id.clone();
                self.spawn_task("add member", async move {
                    match store.add_member(new).await {
                        Ok(member) => Self::finish(
                            store.list_members(MemberFilter::Subgroup(subgroup_id)).await,
                            |members| TaskResult::Saved {
                                message: format!("Added member {}", member.name),
                                then: Box::new(TaskResult::Members(members)),
                            },
                        ),
                        Err(e) => TaskResult::Failed(e),
                    }
                })
            }
        };

        if started {
            self.cancel_form();
        }
    }

    /// The group the delete confirmation refers to.
    pub fn selected_group(&self) -> Option<&Group> {
        if self.screen() != Screen::Groups {
            return None;
        }
        self.visible_groups().get(self.selection).copied()
    }

    pub fn request_delete(&mut self) {
        if self.selected_group().is_some() {
            self.state = AppState::ConfirmingDelete;
        }
    }

    /// Confirm the pending delete. While another store call is in flight the
    /// dialog stays open so the confirmation is not lost.
    pub fn delete_selected_group(&mut self) {
        if self.pending {
            self.show_toast(ToastKind::Info, "Busy", "Still working, confirm again in a moment");
            return;
        }
        self.state = AppState::Normal;
        let Some(group) = self.selected_group().cloned() else {
            return;
        };
        let store = Arc::clone(&self.store);
        self.spawn_task("delete group", async move {
            match store.delete_group(&group.id).await {
                Ok(()) => Self::finish(store.list_groups().await, |groups| TaskResult::Saved {
                    message: format!("Deleted group {}", group.name),
                    then: Box::new(TaskResult::Groups(groups)),
                }),
                Err(e) => TaskResult::Failed(e),
            }
        });
    }

    /// Write today's or all records to the export directory.
    pub fn export(&mut self, scope: ExportScope) {
        let store = Arc::clone(&self.store);
        let dir = self.config.export_dir();
        self.spawn_task("export", async move {
            let filter = match scope {
                ExportScope::Today => AttendanceFilter::today(),
                ExportScope::All => AttendanceFilter::All,
            };
            let records = match store.list_attendance(filter).await {
                Ok(records) => records,
                Err(e) => return TaskResult::Failed(e),
            };
            if records.is_empty() {
                return TaskResult::Exported(None);
            }
            Self::finish(write_export(&dir, &records, local_today()), |path| {
                TaskResult::Exported(Some(path))
            })
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::{seed_defaults, AfterCheckIn, LocalStore};

    async fn seeded_app(config: Config) -> App {
        let store = LocalStore::in_memory();
        seed_defaults(&store).await.unwrap();
        App::new(config, Arc::new(store))
    }

    /// Walk Female → Group-1 → 1-1.
    async fn to_members(app: &mut App) {
        app.select_gender(Gender::Female);
        app.wait_for_task().await;
        app.activate();
        app.wait_for_task().await;
        app.selection = app
            .visible_subgroups()
            .iter()
            .position(|s| s.name == "1-1")
            .unwrap();
        app.activate();
        app.wait_for_task().await;
    }

    // -------------------------------------------------------------------------
    // Form Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_form_validation() {
        let mut form = Form::new(FormKind::Group);
        form.push(' ');
        assert_eq!(form.validated_name(), Err("Group name is required".to_string()));

        for c in "Ushers ".chars() {
            form.push(c);
        }
        form.push('\n');
        assert_eq!(form.validated_name(), Ok("Ushers".to_string()));
    }

    #[test]
    fn test_form_length_limit() {
        let mut form = Form::new(FormKind::Member);
        for _ in 0..(MAX_NAME_LENGTH + 10) {
            form.push('a');
        }
        assert_eq!(form.name.len(), MAX_NAME_LENGTH);
    }

    // -------------------------------------------------------------------------
    // Flow Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_members_filtered_by_gender() {
        let mut app = seeded_app(Config::default()).await;
        to_members(&mut app).await;

        assert_eq!(app.screen(), Screen::Members);
        let names: Vec<&str> = app.visible_members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Smith"]);
    }

    #[tokio::test]
    async fn test_search_filters_groups() {
        let mut app = seeded_app(Config::default()).await;
        app.select_gender(Gender::Male);
        app.wait_for_task().await;
        assert_eq!(app.visible_groups().len(), 7);

        app.search_query = "group-3".to_string();
        let names: Vec<&str> = app.visible_groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Group-3"]);
    }

    #[tokio::test]
    async fn test_check_in_and_reset() {
        let mut app = seeded_app(Config::default()).await;
        to_members(&mut app).await;

        app.activate();
        app.wait_for_task().await;
        assert_eq!(app.screen(), Screen::Confirmation);
        let record = app.flow.last_check_in().unwrap();
        assert_eq!(record.member_name, "Jane Smith");
        assert_eq!(record.group_name, "Group-1");

        app.dismiss_confirmation();
        assert_eq!(app.screen(), Screen::Welcome);
        assert!(app.flow.gender().is_none());
    }

    #[tokio::test]
    async fn test_check_in_returns_to_members() {
        let config = Config {
            after_check_in: AfterCheckIn::ReturnToMembers,
            ..Config::default()
        };
        let mut app = seeded_app(config).await;
        to_members(&mut app).await;

        app.activate();
        app.wait_for_task().await;
        app.dismiss_confirmation();
        assert_eq!(app.screen(), Screen::Members);
        assert_eq!(app.visible_members().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_blocks_second_action() {
        let mut app = seeded_app(Config::default()).await;
        app.select_gender(Gender::Male);
        assert!(app.pending);

        app.load_admin();
        app.wait_for_task().await;
        assert!(!app.pending);
        assert!(app.admin.is_none());
        assert_eq!(app.groups.len(), 7);
    }

    // -------------------------------------------------------------------------
    // Action Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_group_form() {
        let mut app = seeded_app(Config::default()).await;
        app.select_gender(Gender::Male);
        app.wait_for_task().await;

        app.open_form();
        assert_eq!(app.state, AppState::EditingForm);
        app.submit_form();
        assert!(app.form.as_ref().unwrap().error.is_some());

        for c in "Choir".chars() {
            app.form.as_mut().unwrap().push(c);
        }
        app.submit_form();
        assert!(app.form.is_none());
        app.wait_for_task().await;

        assert_eq!(app.groups.len(), 8);
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Success);
    }

    #[tokio::test]
    async fn test_add_member_uses_context() {
        let mut app = seeded_app(Config::default()).await;
        to_members(&mut app).await;

        app.open_form();
        for c in "Ruth".chars() {
            app.form.as_mut().unwrap().push(c);
        }
        app.submit_form();
        app.wait_for_task().await;

        let ruth = app.members.iter().find(|m| m.name == "Ruth").unwrap();
        assert_eq!(ruth.gender, Gender::Female);
        assert_eq!(Some(&ruth.subgroup_id), app.flow.subgroup().map(|s| &s.id));
        assert_eq!(app.visible_members().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_group() {
        let mut app = seeded_app(Config::default()).await;
        app.select_gender(Gender::Male);
        app.wait_for_task().await;

        app.request_delete();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        app.delete_selected_group();
        app.wait_for_task().await;

        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.groups.len(), 6);
    }

    #[tokio::test]
    async fn test_delete_confirm_while_pending_keeps_dialog() {
        let mut app = seeded_app(Config::default()).await;
        app.select_gender(Gender::Male);
        app.wait_for_task().await;

        app.request_delete();
        app.load_groups();
        assert!(app.pending);
        app.delete_selected_group();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Info);

        app.wait_for_task().await;
        assert_eq!(app.groups.len(), 7);
        app.delete_selected_group();
        app.wait_for_task().await;
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.groups.len(), 6);
    }

    #[tokio::test]
    async fn test_admin_report_and_history() {
        let mut app = seeded_app(Config::default()).await;
        to_members(&mut app).await;
        app.activate();
        app.wait_for_task().await;

        app.open_admin();
        app.wait_for_task().await;

        let admin = app.admin.as_ref().unwrap();
        assert_eq!(admin.report.total_attendees, 1);
        assert_eq!(admin.report.gender_count(Gender::Female), 1);
        assert_eq!(app.history().len(), 1);

        assert_eq!(app.flow.back(), Screen::Welcome);
    }

    #[tokio::test]
    async fn test_export_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            export_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let mut app = seeded_app(config).await;

        app.export(ExportScope::All);
        app.wait_for_task().await;

        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.title, "No Data");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            export_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let mut app = seeded_app(config).await;
        to_members(&mut app).await;
        app.activate();
        app.wait_for_task().await;

        app.export(ExportScope::Today);
        app.wait_for_task().await;

        let path = dir.path().join(kiosk_core::export_filename(local_today()));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("\"Jane Smith\""));
    }

    #[tokio::test]
    async fn test_store_errors_show_toast() {
        let mut app = seeded_app(Config::default()).await;
        app.select_gender(Gender::Male);
        app.wait_for_task().await;
        app.groups.push(Group {
            id: "stale".to_string(),
            name: "ZZZ Stale".to_string(),
            created_at: chrono::Utc::now(),
        });
        app.selection = app.visible_groups().len() - 1;

        app.delete_selected_group();
        app.wait_for_task().await;

        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(app.screen(), Screen::Groups);
    }
}
