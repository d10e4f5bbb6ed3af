//! Leave decision logic: interval overlap, request validation, the
//! Pending -> Approved | Rejected lifecycle and department reporting.
//!
//! Everything below `service` is synchronous and free of I/O; the service
//! is the only piece that talks to a [`crate::store::LeaveStore`].

pub mod lifecycle;
pub mod overlap;
pub mod report;
pub mod service;
pub mod validator;

pub use lifecycle::Transition;
pub use report::{DepartmentFilter, OverlapReport};
pub use service::LeaveService;
