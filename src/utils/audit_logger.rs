use crate::config::Config;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

/// String arguments longer than this are cut in the log.
const MAX_LOGGED_STRING: usize = 512;

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    ts: DateTime<Utc>,
    intent: &'a str,
    args: Value,
}

fn clip_strings(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_LOGGED_STRING => {
            let clipped: String = s.chars().take(MAX_LOGGED_STRING).collect();
            Value::String(format!("{}...", clipped))
        }
        Value::Array(items) => Value::Array(items.iter().map(clip_strings).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), clip_strings(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// `intents.log` -> `intents.2024-05-01_10-00-00.log`
fn backup_path(log_file: &Path, now: DateTime<Utc>) -> PathBuf {
    let stem = log_file.file_stem().unwrap_or_default().to_string_lossy();
    let stamp = now.format("%Y-%m-%d_%H-%M-%S");
    let name = match log_file.extension() {
        Some(ext) => format!("{}.{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}.{}", stem, stamp),
    };
    log_file.with_file_name(name)
}

/// JSON-lines record of every intent received by the control loop.
#[derive(Debug)]
pub struct AuditLogger {
    log_file: PathBuf,
    max_size_bytes: u64,
}

impl AuditLogger {
    pub fn new(config: &Config) -> Self {
        if let Some(parent_dir) = config.audit_log_file.parent() {
            if let Err(e) = std::fs::create_dir_all(parent_dir) {
                error!(
                    path = %parent_dir.display(),
                    error = %e,
                    "Failed to create audit log directory"
                );
            }
        }
        Self {
            log_file: config.audit_log_file.clone(),
            max_size_bytes: config.audit_log_max_size_bytes,
        }
    }

    async fn rotate_if_needed(&self, now: DateTime<Utc>) -> Result<()> {
        let size = match fs::metadata(&self.log_file).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if size >= self.max_size_bytes {
            let backup = backup_path(&self.log_file, now);
            fs::rename(&self.log_file, &backup).await?;
            debug!(backup = %backup.display(), "Rotated audit log");
        }
        Ok(())
    }

    /// Records one intent. Failures are logged and swallowed.
    pub async fn log_intent(&self, intent: &str, args: &Value) {
        if let Err(e) = self.append(intent, args).await {
            error!(intent = %intent, error = %e, "Failed to write audit log");
        }
    }

    async fn append(&self, intent: &str, args: &Value) -> Result<()> {
        let now = Utc::now();
        self.rotate_if_needed(now).await?;

        let entry = AuditEntry {
            ts: now,
            intent,
            args: clip_strings(args),
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .await?;
        file.write_all(&line).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_appends_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(temp_dir.path());
        let logger = AuditLogger::new(&config);

        logger.log_intent("launch", &json!({"profiles": ["Main Profile"]})).await;
        logger.log_intent("terminate_all", &Value::Null).await;

        let content = std::fs::read_to_string(&config.audit_log_file).unwrap();
        let entries: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["intent"], "launch");
        assert_eq!(entries[0]["args"]["profiles"][0], "Main Profile");
        assert_eq!(entries[1]["intent"], "terminate_all");
        assert!(entries[1]["ts"].is_string());
    }

    #[tokio::test]
    async fn test_rotates_when_over_limit() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::with_data_dir(temp_dir.path());
        config.audit_log_max_size_bytes = 1;
        let logger = AuditLogger::new(&config);

        logger.log_intent("state", &Value::Null).await;
        logger.log_intent("state", &Value::Null).await;

        let files = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(files, 2);
        assert_eq!(std::fs::read_to_string(&config.audit_log_file).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_long_arguments_are_clipped() {
        let long = "x".repeat(MAX_LOGGED_STRING + 10);
        let clipped = clip_strings(&json!({"parameter": long, "n": 3}));
        assert_eq!(clipped["parameter"].as_str().unwrap().len(), MAX_LOGGED_STRING + 3);
        assert_eq!(clipped["n"], 3);
    }

    #[test]
    fn test_backup_name_keeps_extension() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(
            backup_path(Path::new("/data/intents.log"), now),
            PathBuf::from("/data/intents.2024-05-01_10-00-00.log")
        );
    }
}
