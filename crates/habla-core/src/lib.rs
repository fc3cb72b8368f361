pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::HablaConfig;
pub use error::{HablaError, Result};
pub use events::UiEvent;
pub use types::*;
