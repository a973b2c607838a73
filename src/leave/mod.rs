//! Leave (congé) workflow: submission, decisions, balances and statistics.

pub mod balance;
pub mod dates;
pub mod filter;
pub mod notify;
pub mod refresh;
pub mod service;
pub mod stats;
pub mod validation;

pub use filter::LeaveFilter;
pub use service::{LeavePolicy, LeaveReview, LeaveService, RequesterBalance};
pub use validation::LeaveSubmission;
