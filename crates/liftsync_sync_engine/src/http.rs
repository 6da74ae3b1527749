//! HTTP backend binding.
//!
//! The HTTP client is abstracted via a trait so that any library (reqwest,
//! ureq, a platform bridge) can carry the requests. Bodies are JSON.

use crate::backend::{BackendError, WorkoutBackend};
use crate::identity::Identity;
use chrono::NaiveDate;
use liftsync_session::SaveRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SAVE_WORKOUT: &str = "/rpc/save_workout";
const INCREMENT_WEEKLY: &str = "/rpc/increment_weekly_workouts";
const EVALUATE_ACHIEVEMENTS: &str = "/rpc/evaluate_achievements";

/// HTTP client abstraction.
pub trait HttpClient: Send + Sync {
    /// Sends a POST with a JSON body and bearer token, returning the
    /// response body. Non-2xx responses are errors carrying the server's
    /// message.
    fn post(&self, url: &str, bearer: &str, body: Vec<u8>, timeout: Duration) -> Result<Vec<u8>, String>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveWorkoutBody<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    record: &'a SaveRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyBody<'a> {
    user_id: &'a str,
    week_start: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementsBody<'a> {
    user_id: &'a str,
    workout_history_id: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SaveResponse {
    Id(String),
    Object { id: String },
}

/// [`WorkoutBackend`] over HTTP.
pub struct HttpBackend<C: HttpClient> {
    base_url: String,
    client: C,
    timeout: Duration,
}

impl<C: HttpClient> HttpBackend<C> {
    /// Creates a backend rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_json<T: Serialize>(&self, identity: &Identity, endpoint: &str, body: &T) -> Result<Vec<u8>, BackendError> {
        let body = serde_json::to_vec(body)
            .map_err(|e| BackendError::new(format!("failed to encode request: {e}")))?;
        let url = format!("{}{}", self.base_url, endpoint);
        self.client
            .post(&url, &identity.access_token, body, self.timeout)
            .map_err(BackendError::new)
    }
}

impl<C: HttpClient> WorkoutBackend for HttpBackend<C> {
    fn save_workout(&self, identity: &Identity, record: &SaveRecord) -> Result<String, BackendError> {
        let body = SaveWorkoutBody {
            user_id: &identity.user_id,
            record,
        };
        let response = self.post_json(identity, SAVE_WORKOUT, &body)?;
        match serde_json::from_slice(&response) {
            Ok(SaveResponse::Id(id) | SaveResponse::Object { id }) => Ok(id),
            Err(e) => Err(BackendError::new(format!("invalid save response: {e}"))),
        }
    }

    fn increment_weekly_count(&self, identity: &Identity, week_start: NaiveDate) -> Result<(), BackendError> {
        let body = WeeklyBody {
            user_id: &identity.user_id,
            week_start,
        };
        self.post_json(identity, INCREMENT_WEEKLY, &body).map(|_| ())
    }

    fn evaluate_achievements(&self, identity: &Identity, history_id: &str) -> Result<(), BackendError> {
        let body = AchievementsBody {
            user_id: &identity.user_id,
            workout_history_id: history_id,
        };
        self.post_json(identity, EVALUATE_ACHIEVEMENTS, &body).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<(String, String, serde_json::Value)>>,
        response: Mutex<Option<Result<Vec<u8>, String>>>,
    }

    impl HttpClient for RecordingClient {
        fn post(&self, url: &str, bearer: &str, body: Vec<u8>, _timeout: Duration) -> Result<Vec<u8>, String> {
            let json = serde_json::from_slice(&body).map_err(|e| e.to_string())?;
            self.requests.lock().push((url.to_string(), bearer.to_string(), json));
            self.response.lock().clone().unwrap_or_else(|| Ok(b"null".to_vec()))
        }
    }

    fn record() -> SaveRecord {
        SaveRecord {
            idempotency_key: "k1".into(),
            workout_id: "w1".into(),
            completed_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            duration_seconds: 60,
            notes: "good".into(),
            plan_workout_id: None,
            exercise_history: Vec::new(),
            workout_exercise_target_updates: Vec::new(),
        }
    }

    fn identity() -> Identity {
        Identity::new("u1", "secret")
    }

    #[test]
    fn save_posts_flattened_record() {
        let backend = HttpBackend::new("https://api.example.com/", RecordingClient::default());
        *backend.client.response.lock() = Some(Ok(br#""history-9""#.to_vec()));

        let id = backend.save_workout(&identity(), &record()).unwrap();
        assert_eq!(id, "history-9");

        let requests = backend.client.requests.lock();
        let (url, bearer, body) = &requests[0];
        assert_eq!(url, "https://api.example.com/rpc/save_workout");
        assert_eq!(bearer, "secret");
        assert_eq!(body["userId"], "u1");
        assert_eq!(body["idempotencyKey"], "k1");
        assert_eq!(body["completedAt"], "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn save_accepts_object_response() {
        let backend = HttpBackend::new("http://localhost", RecordingClient::default());
        *backend.client.response.lock() = Some(Ok(br#"{"id":"h2"}"#.to_vec()));
        assert_eq!(backend.save_workout(&identity(), &record()).unwrap(), "h2");
    }

    #[test]
    fn transport_errors_keep_message() {
        let backend = HttpBackend::new("http://localhost", RecordingClient::default());
        *backend.client.response.lock() = Some(Err("Network request failed".into()));

        let err = backend.save_workout(&identity(), &record()).unwrap_err();
        assert_eq!(err.message, "Network request failed");
    }

    #[test]
    fn garbage_response_is_an_error() {
        let backend = HttpBackend::new("http://localhost", RecordingClient::default());
        *backend.client.response.lock() = Some(Ok(b"<html>".to_vec()));
        assert!(backend
            .save_workout(&identity(), &record())
            .unwrap_err()
            .message
            .starts_with("invalid save response"));
    }

    #[test]
    fn secondary_endpoints() {
        let backend = HttpBackend::new("http://localhost", RecordingClient::default());
        let week = NaiveDate::from_ymd_opt(2024, 4, 28).unwrap();
        backend.increment_weekly_count(&identity(), week).unwrap();
        backend.evaluate_achievements(&identity(), "h1").unwrap();

        let requests = backend.client.requests.lock();
        assert_eq!(requests[0].0, "http://localhost/rpc/increment_weekly_workouts");
        assert_eq!(requests[0].2["weekStart"], "2024-04-28");
        assert_eq!(requests[1].0, "http://localhost/rpc/evaluate_achievements");
        assert_eq!(requests[1].2["workoutHistoryId"], "h1");
    }
}
