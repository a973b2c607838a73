pub mod leave_request;
pub mod requester;
pub mod role;
