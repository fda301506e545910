//! RemoteStore against an in-process fake of the spreadsheet proxy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use kiosk_core::store::local_today;
use kiosk_core::{
    seed_defaults, AttendanceFilter, AttendanceRecord, AttendanceStatus, AttendanceStore, Gender, Group, Member,
    MemberFilter, NewAttendance, NewGroup, NewMember, NewSubgroup, RemoteStore, StoreError,
    Subgroup,
};

#[derive(Default)]
struct Sheet {
    next_id: usize,
    groups: Vec<Group>,
    subgroups: Vec<Subgroup>,
    members: Vec<Member>,
    attendance: Vec<AttendanceRecord>,
    today_requests: usize,
}

impl Sheet {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

type Shared = Arc<Mutex<Sheet>>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn add_group(State(sheet): State<Shared>, Json(body): Json<NewGroup>) -> Response {
    let mut sheet = sheet.lock().unwrap();
    if sheet.groups.iter().any(|g| g.name == body.name) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Group name already exists");
    }
    let group = Group {
        id: sheet.id("g"),
        name: body.name,
        created_at: Utc::now(),
    };
    sheet.groups.push(group.clone());
    Json(json!({ "group": group })).into_response()
}

async fn get_groups(State(sheet): State<Shared>) -> Response {
    let sheet = sheet.lock().unwrap();
    Json(json!({ "groups": sheet.groups })).into_response()
}

async fn delete_group(State(sheet): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut sheet = sheet.lock().unwrap();
    let id = body["groupId"].as_str().unwrap_or_default().to_string();
    let before = sheet.groups.len();
    sheet.groups.retain(|g| g.id != id);
    if sheet.groups.len() == before {
        return error(StatusCode::NOT_FOUND, "Group not found");
    }
    Json(json!({ "message": "Group deleted successfully" })).into_response()
}

async fn add_subgroup(State(sheet): State<Shared>, Json(body): Json<NewSubgroup>) -> Response {
    let mut sheet = sheet.lock().unwrap();
    let subgroup = Subgroup {
        id: sheet.id("s"),
        name: body.name,
        group_id: body.group_id,
        created_at: Utc::now(),
    };
    sheet.subgroups.push(subgroup.clone());
    Json(json!({ "subgroup": subgroup })).into_response()
}

// Like the real proxy, the list endpoints ignore their filter parameters.
async fn get_subgroups(
    State(sheet): State<Shared>,
    Query(_params): Query<HashMap<String, String>>,
) -> Response {
    let sheet = sheet.lock().unwrap();
    Json(json!({ "subgroups": sheet.subgroups })).into_response()
}

async fn add_member(State(sheet): State<Shared>, Json(body): Json<NewMember>) -> Response {
    let mut sheet = sheet.lock().unwrap();
    let member = Member {
        id: sheet.id("m"),
        name: body.name,
        gender: body.gender,
        group_id: body.group_id,
        subgroup_id: body.subgroup_id,
        created_at: Utc::now(),
    };
    sheet.members.push(member.clone());
    Json(json!({ "member": member })).into_response()
}

async fn get_members(
    State(sheet): State<Shared>,
    Query(_params): Query<HashMap<String, String>>,
) -> Response {
    let sheet = sheet.lock().unwrap();
    Json(json!({ "members": sheet.members })).into_response()
}

async fn mark_attendance(State(sheet): State<Shared>, Json(body): Json<NewAttendance>) -> Response {
    let mut sheet = sheet.lock().unwrap();
    let record = AttendanceRecord {
        id: sheet.id("a"),
        member_id: body.member_id,
        member_name: body.member_name,
        gender: body.gender,
        group_name: body.group_name,
        subgroup_name: body.subgroup_name,
        check_in_time: Utc::now(),
        service_date: body.service_date,
        status: body.status,
    };
    sheet.attendance.push(record.clone());
    Json(json!({ "attendance": record })).into_response()
}

// The real proxy compares against its own UTC date.
async fn get_today_attendance(State(sheet): State<Shared>) -> Response {
    let mut sheet = sheet.lock().unwrap();
    sheet.today_requests += 1;
    let utc_today = Utc::now().date_naive();
    let today: Vec<&AttendanceRecord> = sheet
        .attendance
        .iter()
        .filter(|r| r.service_date == utc_today)
        .collect();
    Json(json!({ "attendance": today })).into_response()
}

async fn get_all_attendance(State(sheet): State<Shared>) -> Response {
    let sheet = sheet.lock().unwrap();
    Json(json!({ "attendance": sheet.attendance })).into_response()
}

async fn spawn_proxy() -> (RemoteStore, Shared) {
    let sheet = Shared::default();
    let app = Router::new()
        .route("/add-group", post(add_group))
        .route("/get-groups", get(get_groups))
        .route("/delete-group", post(delete_group))
        .route("/add-subgroup", post(add_subgroup))
        .route("/get-subgroups", get(get_subgroups))
        .route("/add-member", post(add_member))
        .route("/get-members", get(get_members))
        .route("/mark-attendance", post(mark_attendance))
        .route("/get-today-attendance", get(get_today_attendance))
        .route("/get-all-attendance", get(get_all_attendance))
        .with_state(sheet.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let store = RemoteStore::new(format!("http://{}/", addr)).unwrap();
    (store, sheet)
}

#[tokio::test]
async fn test_seed_and_list() {
    let (store, _sheet) = spawn_proxy().await;
    assert!(seed_defaults(&store).await.unwrap());

    let groups = store.list_groups().await.unwrap();
    assert_eq!(groups.len(), 7);

    let group_2 = groups.iter().find(|g| g.name == "Group-2").unwrap();
    let subgroups = store.list_subgroups(&group_2.id).await.unwrap();
    let mut names: Vec<&str> = subgroups.iter().map(|s| s.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["2-1", "2-2"]);
}

#[tokio::test]
async fn test_member_filter_applied_client_side() {
    let (store, _sheet) = spawn_proxy().await;
    seed_defaults(&store).await.unwrap();
    let group = store.list_groups().await.unwrap().remove(0);
    let subgroups = store.list_subgroups(&group.id).await.unwrap();
    let second = subgroups.iter().find(|s| s.name.ends_with("-2")).unwrap();

    let members = store
        .list_members(MemberFilter::Subgroup(second.id.clone()))
        .await
        .unwrap();
    assert!(members.is_empty());
    assert_eq!(store.list_members(MemberFilter::All).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_mark_attendance_joins_names() {
    let (store, sheet) = spawn_proxy().await;
    seed_defaults(&store).await.unwrap();
    let jane = store
        .list_members(MemberFilter::All)
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.gender == Gender::Female)
        .unwrap();

    let record = store.mark_attendance(&jane.id).await.unwrap();
    assert_eq!(record.member_name, "Jane Smith");
    assert_eq!(record.group_name, "Group-1");
    assert_eq!(record.subgroup_name, "1-1");
    assert_eq!(record.service_date, local_today());

    let today = store.list_attendance(AttendanceFilter::today()).await.unwrap();
    assert_eq!(today, vec![record]);
    assert_eq!(sheet.lock().unwrap().attendance.len(), 1);
}

#[tokio::test]
async fn test_today_listing_ignores_proxy_utc_date() {
    let (store, sheet) = spawn_proxy().await;
    let local = local_today();
    let not_utc_today = if Utc::now().date_naive() == local {
        local - chrono::Duration::days(1)
    } else {
        local
    };

    // A row dated on a day the proxy's own "today" would not return.
    let record = store
        .add_attendance(NewAttendance {
            member_id: "m1".to_string(),
            member_name: "Jane Smith".to_string(),
            gender: Gender::Female,
            group_name: "Group-1".to_string(),
            subgroup_name: "1-1".to_string(),
            service_date: not_utc_today,
            status: AttendanceStatus::Present,
        })
        .await
        .unwrap();

    let listed = store
        .list_attendance(AttendanceFilter::ServiceDate(not_utc_today))
        .await
        .unwrap();
    assert_eq!(listed, vec![record]);

    let today = store.list_attendance(AttendanceFilter::today()).await.unwrap();
    assert_eq!(today.len(), usize::from(not_utc_today == local));
    assert_eq!(sheet.lock().unwrap().today_requests, 0);
}

#[tokio::test]
async fn test_unknown_member_posts_nothing() {
    let (store, sheet) = spawn_proxy().await;
    seed_defaults(&store).await.unwrap();

    let err = store.mark_attendance("nobody").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(sheet.lock().unwrap().attendance.is_empty());
}

#[tokio::test]
async fn test_reference_checks_before_posting() {
    let (store, sheet) = spawn_proxy().await;
    let err = store
        .add_subgroup(NewSubgroup::new("Orphan", "missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let group = store.add_group(NewGroup::new("Choir")).await.unwrap();
    let err = store
        .add_member(NewMember::new("Ruth", Gender::Female, group.id.clone(), "missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let sheet = sheet.lock().unwrap();
    assert!(sheet.subgroups.is_empty());
    assert!(sheet.members.is_empty());
}

#[tokio::test]
async fn test_error_status_mapping() {
    let (store, _sheet) = spawn_proxy().await;
    store.add_group(NewGroup::new("Choir")).await.unwrap();

    let err = store.add_group(NewGroup::new("Choir")).await.unwrap_err();
    assert_eq!(err, StoreError::Validation("Group name already exists".to_string()));

    let err = store.delete_group("g404").await.unwrap_err();
    assert_eq!(err, StoreError::NotFound("Group not found".to_string()));
}

#[tokio::test]
async fn test_delete_group() {
    let (store, _sheet) = spawn_proxy().await;
    let group = store.add_group(NewGroup::new("Choir")).await.unwrap();
    store.delete_group(&group.id).await.unwrap();
    assert!(store.list_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_proxy_is_network_error() {
    let store = RemoteStore::new("http://127.0.0.1:1").unwrap();
    let err = store.list_groups().await.unwrap_err();
    assert!(matches!(err, StoreError::Network(_)));
}
