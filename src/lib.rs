//! jobhook: webhook notifications for scheduled job executions
//!
//! A library for loading webhook definitions, deciding which of them a
//! finished job execution selects, rendering their templates against the
//! execution, and delivering the requests with retry.

pub mod config;
pub mod dispatch;
pub mod job;
pub mod template;
pub mod time;
pub mod webhook;
