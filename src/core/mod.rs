//! Core business logic - framework-agnostic ledger, budgeting and reporting operations.
//!
//! Pure computation (month arithmetic, target funding, target timelines and the
//! budget view composition) lives beside the storage-backed operations that
//! feed it. Every storage operation takes its connection explicitly.

pub mod account;
pub mod budget;
pub mod category;
pub mod funding;
pub mod ledger;
pub mod month;
pub mod report;
pub mod target;
pub mod timeline;
pub mod transaction;
