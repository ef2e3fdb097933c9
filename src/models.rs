pub mod audit;
pub mod auth;
pub mod change_request;
pub mod commission;
pub mod consumer;
pub mod generator;
pub mod representative;
pub mod settings;
