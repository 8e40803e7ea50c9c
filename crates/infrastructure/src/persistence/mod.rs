//! File persistence.

mod documents;
mod settings_repository;

pub use documents::{DocumentError, load_project, load_runtime, save_runtime};
pub use settings_repository::{SettingsError, SettingsRepository};
