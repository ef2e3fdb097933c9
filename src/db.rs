pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod change_request_repo;
pub use change_request_repo::ChangeRequestRepository;
pub mod commission_repo;
pub use commission_repo::CommissionRepository;
pub mod consumer_repo;
pub use consumer_repo::ConsumerRepository;
pub mod generator_repo;
pub use generator_repo::GeneratorRepository;
pub mod representative_repo;
pub use representative_repo::RepresentativeRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;

#[cfg(test)]
pub(crate) mod fixtures;
