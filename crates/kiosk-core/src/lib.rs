//! Core library for the church attendance check-in kiosk.
//!
//! This crate holds everything the kiosk front end needs that is not
//! presentation:
//!
//! - `models`: Group, Subgroup, Member and AttendanceRecord plus their creation inputs
//! - `store`: the `AttendanceStore` trait and its local and remote backends
//! - `report`: aggregate counts over attendance records
//! - `export`: the CSV attendance export
//! - `flow`: the screen-to-screen navigation state machine
//! - `error`: the error taxonomy shared by both backends

pub mod error;
pub mod export;
pub mod flow;
pub mod models;
pub mod report;
pub mod store;

pub use error::StoreError;
pub use export::{export_csv, export_filename, write_export, ServiceLabel};
pub use flow::{AfterCheckIn, Flow, FlowError, Screen};
pub use models::{
    AttendanceRecord, AttendanceStatus, Gender, Group, Member, NewAttendance, NewGroup,
    NewMember, NewSubgroup, Subgroup,
};
pub use report::AttendanceReport;
pub use store::{
    open_store, seed_defaults, AttendanceFilter, AttendanceStore, LocalStore, MemberFilter,
    RemoteStore, StoreBackend,
};
