pub mod auth_service;
pub mod tree_validator;
