//! Draft command implementations.

use super::{CliResult, Format};
use chrono::{DateTime, Utc};
use liftsync_session::SessionSnapshot;
use liftsync_sync_engine::DraftStore;
use std::fmt::Write as _;
use tracing::info;

/// Renders a draft summary as of `now`.
pub fn render(
    snapshot: Option<&SessionSnapshot>,
    format: Format,
    now: DateTime<Utc>,
) -> CliResult<String> {
    let Some(snapshot) = snapshot else {
        return Ok("(no draft)\n".to_string());
    };
    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(snapshot)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Workout:   {}", snapshot.workout().title);
    let _ = writeln!(out, "Started:   {}", snapshot.started_at().to_rfc3339());
    let _ = writeln!(out, "Duration:  {}s", snapshot.duration_seconds(now));
    let _ = writeln!(out, "Logged:    {} set(s)", snapshot.logged_set_count());
    let _ = writeln!(out, "Volume:    {}", snapshot.total_volume());
    for (we, state) in snapshot.exercises() {
        let marker = if state.is_completed() {
            "done"
        } else if state.is_open() {
            "open"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {:<24} {:>2}/{:<2} {}",
            we.exercise.name,
            state.logged_set_count(),
            state.set_count(),
            marker
        );
    }
    Ok(out)
}

/// Runs `draft show`.
pub fn show(drafts: &DraftStore, format: Format) -> CliResult<()> {
    let snapshot = drafts.load()?;
    print!("{}", render(snapshot.as_ref(), format, Utc::now())?);
    Ok(())
}

/// Runs `draft clear`.
pub fn clear(drafts: &DraftStore) -> CliResult<()> {
    drafts.clear()?;
    info!("draft cleared");
    println!("Draft cleared");
    Ok(())
}
