//! Course timetable builder and empty lecture hall finder.
//!
//! The catalog is loaded once and shared read-only; each user's selection is
//! edited under its own lock and persisted to SQLite after every change.

pub mod catalog;
pub mod config;
pub mod db;
pub mod directory;
pub mod occupancy;
pub mod schedule;
pub mod scrape;
pub mod selection;
pub mod server;
pub mod timing;
pub mod types;
