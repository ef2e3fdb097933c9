pub mod approvals;
pub mod change_requests;
pub mod commissions;
pub mod consumers;
pub mod generators;
pub mod representatives;
pub mod settings;
