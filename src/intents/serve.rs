use crate::config::Config;
use crate::intents::handler::{handle_intent, parse_intent, reply_err, reply_ok, Intent};
use crate::manager::Manager;
use crate::utils::audit_logger::AuditLogger;
use anyhow::Result;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, value: &Value) -> Result<()> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

fn missing_event(missing: &BTreeSet<String>) -> Value {
    json!({ "event": "missing_changed", "missing": missing })
}

/// Runs the control loop until `shutdown` or end of input.
///
/// The loop is the only owner of `manager`: intents and the periodic liveness
/// sweep are serialized through it.
pub async fn serve<R, W>(
    config: &Config,
    manager: &mut Manager,
    reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let audit = AuditLogger::new(config);
    let mut lines = reader.lines();
    let mut ticker = interval(config.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_missing = manager.missing();

    info!(interval_ms = config.sweep_interval.as_millis() as u64, "Control loop started");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = match parse_intent(&line) {
                    Ok(intent) => {
                        let shutdown = intent == Intent::Shutdown;
                        let arguments = serde_json::to_value(&intent).unwrap_or(Value::Null);
                        audit.log_intent(intent.name(), &arguments).await;
                        let reply = match handle_intent(manager, intent) {
                            Ok(result) => reply_ok(result),
                            Err(e) => {
                                warn!(error = %e, kind = ?e.kind(), "Intent failed");
                                reply_err(&e)
                            }
                        };
                        if shutdown {
                            write_line(&mut writer, &reply).await?;
                            break;
                        }
                        reply
                    }
                    Err(e) => reply_err(&e),
                };
                write_line(&mut writer, &reply).await?;
            }
            _ = ticker.tick() => {
                manager.sweep();
            }
        }

        let missing = manager.missing();
        if missing != last_missing {
            write_line(&mut writer, &missing_event(&missing)).await?;
            last_missing = missing;
        }
    }
    info!("Control loop stopped");
    Ok(())
}
