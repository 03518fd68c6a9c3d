//! Line commands read from stdin and turned into coordinator triggers.
//!
//! ```text
//! water [plant_id]
//! tick
//! attach <surface_id> <min_width>
//! resize <surface_id> <min_width>
//! detach <surface_id>
//! ```

use anyhow::{anyhow, bail, Context, Result};
use coordinator::{Trigger, TriggerQueue};
use shared::domain::SurfaceId;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

/// Queues every parsed command, waiting for room when the queue is full.
/// Returns at end of input or once the trigger worker has stopped.
pub async fn forward_commands<R>(reader: R, queue: TriggerQueue)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(%err, "stopped reading commands");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Some(trigger)) => {
                if let Err(err) = queue.send(trigger).await {
                    warn!(%err, "stopped reading commands");
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, line = %line.trim(), "ignoring command"),
        }
    }
}

pub fn parse_command(line: &str) -> Result<Option<Trigger>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let trigger = match verb.to_ascii_lowercase().as_str() {
        "water" => Trigger::WaterRequested {
            plant_id: words.next().map(str::to_string),
        },
        "tick" | "refresh" => Trigger::PeriodicTick,
        "attach" => {
            let (surface_id, min_width) = surface_and_width(&mut words)?;
            Trigger::SurfaceAttached {
                surface_id,
                min_width,
            }
        }
        "resize" => {
            let (surface_id, min_width) = surface_and_width(&mut words)?;
            Trigger::SurfaceResized {
                surface_id,
                min_width,
            }
        }
        "detach" => Trigger::SurfaceDetached {
            surface_id: surface_id(words.next())?,
        },
        other => bail!("unknown command '{other}'"),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument '{extra}'");
    }
    Ok(Some(trigger))
}

fn surface_and_width<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<(SurfaceId, u32)> {
    let surface_id = surface_id(words.next())?;
    let raw = words.next().ok_or_else(|| anyhow!("missing min_width"))?;
    let min_width = raw
        .parse::<u32>()
        .with_context(|| format!("invalid min_width '{raw}'"))?;
    Ok((surface_id, min_width))
}

fn surface_id(raw: Option<&str>) -> Result<SurfaceId> {
    let raw = raw.ok_or_else(|| anyhow!("missing surface_id"))?;
    let id = raw
        .parse::<i64>()
        .with_context(|| format!("invalid surface_id '{raw}'"))?;
    Ok(SurfaceId(id))
}
