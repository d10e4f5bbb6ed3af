pub mod hr;
pub mod leave_request;
pub mod users;
