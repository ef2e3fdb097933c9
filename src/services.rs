pub mod allocation_service;
pub mod approval_service;
pub mod audit_service;
pub mod auth;
pub mod change_request_service;
pub mod commission_service;
pub mod generator_service;
pub mod pricing_service;
pub mod representative_service;
