//! Top-three school rankings over NFL draft records.
//!
//! [`dataset::Dataset`] loads and coerces the draft table once,
//! [`ranking::rank`] filters, groups and ranks it, and [`report`] renders the
//! fixed-size result.

pub mod dataset;
pub mod error;
pub mod logging;
pub mod models;
pub mod ranking;
pub mod report;
