use crate::error::AppError;
use crate::profiles::MAIN_PROFILE;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Expands tilde (~) in a path string to the user's home directory.
pub fn expand_tilde_path_buf(path_str: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path_str).as_ref())
}

/// Makes `path` absolute against the current directory without requiring it to exist.
pub fn absolutize(path: &Path) -> Result<PathBuf, AppError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

/// Resolves a user-chosen base directory: tilde expansion, absolute, must be an
/// existing directory.
pub fn resolve_base_directory(path_str: &str) -> Result<PathBuf, AppError> {
    let trimmed = path_str.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInputArgument("Base directory must not be empty".to_string()));
    }
    let expanded = absolutize(&expand_tilde_path_buf(trimmed))?;
    if !expanded.is_dir() {
        return Err(AppError::InvalidPath(format!(
            "Not an existing directory: {}",
            expanded.display()
        )));
    }
    let resolved = dunce::canonicalize(&expanded).unwrap_or(expanded);
    debug!(path = %resolved.display(), "Resolved base directory");
    Ok(resolved)
}

/// Checks that `name` is usable verbatim as a single directory name for a profile.
pub fn check_profile_name(name: &str) -> Result<&str, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInputArgument(
            "Enter a valid profile name.".to_string(),
        ));
    }
    if name == MAIN_PROFILE {
        return Err(AppError::InvalidInputArgument(format!(
            "'{}' is reserved",
            MAIN_PROFILE
        )));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name => Ok(name),
        _ => Err(AppError::InvalidInputArgument(format!(
            "Profile name must be a single directory name: '{}'",
            name
        ))),
    }
}

/// Trims a user-typed name for a new profile, then checks it.
pub fn validate_profile_name(name: &str) -> Result<&str, AppError> {
    check_profile_name(name.trim())
}
