//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the moisture monitor:
//! per-cycle orchestration, the uncalibrated/degraded policies, and the
//! symmetric peripheral power discipline. All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
