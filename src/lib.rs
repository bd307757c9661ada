// Exportar los módulos principales del proyecto
pub mod common;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod interfaces;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exportaciones públicas comunes
pub use common::config::AppConfig;
pub use common::di::{AppServiceFactory, AppState};
pub use domain::services::tree_validator::{MoveCheck, MoveRejection, TreeValidator};
pub use interfaces::create_app;
