//! Outbox command implementations.

use super::{CliError, CliResult, Format};
use liftsync_sync_engine::{Outbox, PendingJob};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::info;

/// One line of `outbox list`.
#[derive(Debug, Serialize)]
pub struct JobSummary {
    /// Idempotency key.
    pub key: String,
    /// Queue time, RFC 3339.
    pub created_at: String,
    /// Workout title.
    pub title: String,
    /// Failed attempts.
    pub attempts: u32,
    /// Logged sets in the snapshot.
    pub sets: usize,
    /// Most recent failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<&PendingJob> for JobSummary {
    fn from(job: &PendingJob) -> Self {
        Self {
            key: job.idempotency_key.clone(),
            created_at: job.created_at.to_rfc3339(),
            title: job.title().to_string(),
            attempts: job.attempts,
            sets: job.snapshot.logged_set_count(),
            last_error: job.last_error.clone(),
        }
    }
}

/// Renders a job listing.
pub fn render_list(jobs: &[PendingJob], format: Format) -> CliResult<String> {
    let summaries: Vec<JobSummary> = jobs.iter().map(JobSummary::from).collect();
    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(&summaries)?);
    }

    let mut out = String::new();
    if summaries.is_empty() {
        out.push_str("(empty)\n");
        return Ok(out);
    }
    for (position, job) in summaries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{position:>3}  {}  {}  {:<24}  sets={:<3} attempts={}",
            job.key, job.created_at, job.title, job.sets, job.attempts
        );
        if let Some(error) = &job.last_error {
            let _ = writeln!(out, "     last error: {error}");
        }
    }
    Ok(out)
}

/// Runs `outbox list`.
pub fn list(outbox: &Outbox, dead_letter: bool, format: Format) -> CliResult<()> {
    let jobs = if dead_letter {
        outbox.dead_letters()?
    } else {
        outbox.jobs()?
    };
    print!("{}", render_list(&jobs, format)?);
    Ok(())
}

/// Renders the save record a job would send.
pub fn render_record(outbox: &Outbox, key: &str) -> CliResult<String> {
    let job = outbox
        .find(key)?
        .ok_or_else(|| CliError::JobNotFound(key.to_string()))?;
    Ok(serde_json::to_string_pretty(&job.to_record())?)
}

/// Runs `outbox show`.
pub fn show(outbox: &Outbox, key: &str) -> CliResult<()> {
    println!("{}", render_record(outbox, key)?);
    Ok(())
}

/// Runs `outbox clear`.
pub fn clear(outbox: &Outbox, dead_letter: bool) -> CliResult<()> {
    let removed = if dead_letter {
        outbox.clear_dead_letters()?
    } else {
        outbox.clear()?
    };
    info!(removed, dead_letter, "outbox cleared");
    println!("Removed {removed} job(s)");
    Ok(())
}

/// Runs `outbox requeue`.
pub fn requeue(outbox: &Outbox) -> CliResult<()> {
    let moved = outbox.requeue_dead_letters()?;
    info!(moved, "dead letters requeued");
    println!("Requeued {moved} job(s)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use liftsync_session::{Exercise, ExerciseKind, Session, SetPatch, StrengthSetPatch, Workout, WorkoutExercise};
    use liftsync_storage::InMemoryStore;
    use std::sync::Arc;

    fn job(key: &str) -> PendingJob {
        let workout = Workout::new("w1", "Push day").with_exercise(WorkoutExercise::new(
            "we1",
            Exercise::new("bench", "Bench", ExerciseKind::Strength),
        ));
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut session = Session::start(workout, at);
        session
            .update_set("we1", 0, SetPatch::Strength(StrengthSetPatch::new("8", "60")))
            .unwrap();
        PendingJob::new(key, session.finish(), 600, at, None)
    }

    fn outbox() -> Outbox {
        Outbox::new(Arc::new(InMemoryStore::new()), "outbox.pending", "outbox.dead_letter")
    }

    #[test]
    fn text_listing() {
        let mut failed = job("k1");
        failed.record_failure("timeout");
        let text = render_list(&[failed], Format::Text).unwrap();

        assert!(text.contains("k1"));
        assert!(text.contains("Push day"));
        assert!(text.contains("attempts=1"));
        assert!(text.contains("last error: timeout"));
        assert_eq!(render_list(&[], Format::Text).unwrap(), "(empty)\n");
    }

    #[test]
    fn json_listing() {
        let json = render_list(&[job("k1")], Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["key"], "k1");
        assert_eq!(value[0]["sets"], 1);
    }

    #[test]
    fn show_renders_record() {
        let outbox = outbox();
        outbox.push(job("k1")).unwrap();

        let json = render_record(&outbox, "k1").unwrap();
        assert!(json.contains("\"idempotencyKey\": \"k1\""));
        assert!(matches!(
            render_record(&outbox, "missing"),
            Err(CliError::JobNotFound(_))
        ));
    }
}
