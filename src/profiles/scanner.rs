use crate::error::AppError;
use crate::profiles::natural::natural_cmp;
use crate::utils::path_utils::validate_profile_name;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Virtual profile that launches with the caller's environment untouched.
pub const MAIN_PROFILE: &str = "Main Profile";

/// Subdirectory whose presence marks a directory as an isolated home.
pub const PROFILE_MARKER: &str = ".local";

fn is_profile_dir(dir: &Path) -> bool {
    dir.is_dir() && dir.join(PROFILE_MARKER).is_dir()
}

/// Lists the profiles under `base_dir`, `Main Profile` first and the rest in
/// natural order. Unreadable entries are skipped.
#[instrument(level = "debug")]
pub fn scan(base_dir: Option<&Path>) -> Vec<String> {
    let mut names = Vec::new();

    if let Some(base) = base_dir.filter(|b| b.exists()) {
        match fs::read_dir(base) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    if !is_profile_dir(&entry.path()) {
                        continue;
                    }
                    match entry.file_name().into_string() {
                        Ok(name) => names.push(name),
                        Err(raw) => debug!(name = ?raw, "Skipping non UTF-8 profile directory"),
                    }
                }
            }
            Err(e) => debug!(path = %base.display(), error = %e, "Base directory unreadable"),
        }
    }

    names.sort_by(|a, b| natural_cmp(a, b));
    names.retain(|n| n != MAIN_PROFILE);
    names.insert(0, MAIN_PROFILE.to_string());
    names
}

/// Creates `<base_dir>/<name>/.local`. An already existing profile is fine.
#[instrument(level = "debug")]
pub fn create_profile(base_dir: &Path, name: &str) -> Result<PathBuf, AppError> {
    let name = validate_profile_name(name)?;
    let profile_path = base_dir.join(name);
    let marker = profile_path.join(PROFILE_MARKER);

    fs::create_dir_all(&marker).map_err(|source| AppError::ProfileCreation {
        path: profile_path.clone(),
        source,
    })?;
    debug!(path = %profile_path.display(), "Profile directory ready");
    Ok(profile_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_profile(base: &Path, name: &str) {
        fs::create_dir_all(base.join(name).join(PROFILE_MARKER)).unwrap();
    }

    #[test]
    fn test_scan_without_base_dir() {
        assert_eq!(scan(None), vec![MAIN_PROFILE]);
        assert_eq!(scan(Some(Path::new("/definitely/not/here"))), vec![MAIN_PROFILE]);
    }

    #[test]
    fn test_scan_orders_naturally_with_main_first() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["Profile10", "Profile2", "profile1"] {
            make_profile(temp_dir.path(), name);
        }
        assert_eq!(
            scan(Some(temp_dir.path())),
            vec![MAIN_PROFILE, "profile1", "Profile2", "Profile10"]
        );
    }

    #[test]
    fn test_scan_ignores_directories_without_marker() {
        let temp_dir = TempDir::new().unwrap();
        make_profile(temp_dir.path(), "Real");
        fs::create_dir_all(temp_dir.path().join("Plain")).unwrap();
        fs::create_dir_all(temp_dir.path().join("FileMarker")).unwrap();
        fs::write(temp_dir.path().join("FileMarker").join(PROFILE_MARKER), b"").unwrap();
        fs::write(temp_dir.path().join("loose.txt"), b"x").unwrap();

        assert_eq!(scan(Some(temp_dir.path())), vec![MAIN_PROFILE, "Real"]);
    }

    #[test]
    fn test_main_profile_directory_is_not_duplicated() {
        let temp_dir = TempDir::new().unwrap();
        make_profile(temp_dir.path(), MAIN_PROFILE);
        make_profile(temp_dir.path(), "Alt");

        let profiles = scan(Some(temp_dir.path()));
        assert_eq!(profiles, vec![MAIN_PROFILE, "Alt"]);
    }

    #[test]
    fn test_create_profile_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let first = create_profile(temp_dir.path(), "Alt1").unwrap();
        let second = create_profile(temp_dir.path(), "  Alt1 ").unwrap();

        assert_eq!(first, second);
        assert!(first.join(PROFILE_MARKER).is_dir());
        assert_eq!(scan(Some(temp_dir.path())), vec![MAIN_PROFILE, "Alt1"]);
    }

    #[test]
    fn test_create_profile_rejects_bad_names() {
        let temp_dir = TempDir::new().unwrap();
        for bad in ["", "   ", "..", "a/b", MAIN_PROFILE] {
            let err = create_profile(temp_dir.path(), bad).unwrap_err();
            assert!(matches!(err, AppError::InvalidInputArgument(_)), "{bad:?} gave {err:?}");
        }
    }

    #[test]
    fn test_create_profile_reports_filesystem_cause() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("Taken");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = create_profile(temp_dir.path(), "Taken").unwrap_err();
        assert!(matches!(err, AppError::ProfileCreation { .. }));
    }
}
