//! Profile discovery and creation.
//!
//! A profile is `<base_dir>/<name>` containing a `.local` directory. The virtual
//! `Main Profile` is never backed by a directory and always lists first.

pub mod natural;
pub mod scanner;

pub use scanner::{create_profile, scan, MAIN_PROFILE, PROFILE_MARKER};
