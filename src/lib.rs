//! Profile and session manager for running several isolated Sober instances.
//!
//! Each profile is a directory used as `HOME` for one client instance. The
//! [`manager::Manager`] discovers profiles, launches and tracks their processes,
//! and persists user settings.

pub mod config;
pub mod error;
pub mod intents;
pub mod launch;
pub mod manager;
pub mod profiles;
pub mod reconciler;
pub mod settings;
pub mod supervisor;
pub mod utils;

pub use config::Config;
pub use error::{AppError, ErrorKind};
pub use launch::LaunchMode;
pub use manager::{Manager, Platform, StateSnapshot};
