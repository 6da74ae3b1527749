//! Failure classification for backend error messages.

use serde::{Deserialize, Serialize};
use std::fmt;

const AUTH_MARKERS: &[&str] = &["jwt", "token", "auth", "session", "401", "unauthorized"];

const NETWORK_MARKERS: &[&str] = &[
    "network request failed",
    "timeout",
    "timed out",
    "offline",
    "socket",
    "connection",
];

/// Why a save failed, as far as the drain loop cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Credentials were rejected. Halts the drain.
    Authentication,
    /// The backend was unreachable. Halts the drain.
    Network,
    /// Anything else. The drain moves on to the next job.
    Server,
}

impl FailureClass {
    /// Classifies an error message by case-insensitive substring match.
    /// Authentication wins over network when both match.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
            FailureClass::Authentication
        } else if NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
            FailureClass::Network
        } else {
            FailureClass::Server
        }
    }

    /// Returns true if a failure of this class stops the current drain.
    pub fn halts_drain(self) -> bool {
        !matches!(self, FailureClass::Server)
    }

    /// Message shown to the user.
    pub fn user_message(self) -> &'static str {
        match self {
            FailureClass::Authentication => "Please sign in again.",
            FailureClass::Network => "No connection.",
            FailureClass::Server => "Saving failed. It will be retried automatically.",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureClass::Authentication => "authentication",
            FailureClass::Network => "network",
            FailureClass::Server => "server",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_markers() {
        for message in [
            "JWT expired",
            "invalid token",
            "Auth session missing!",
            "HTTP 401",
            "Unauthorized",
        ] {
            assert_eq!(FailureClass::classify(message), FailureClass::Authentication, "{message}");
        }
    }

    #[test]
    fn network_markers() {
        for message in [
            "TypeError: Network request failed",
            "request timeout",
            "operation timed out",
            "device is offline",
            "socket hang up",
            "Connection refused",
        ] {
            assert_eq!(FailureClass::classify(message), FailureClass::Network, "{message}");
        }
    }

    #[test]
    fn auth_checked_before_network() {
        assert_eq!(
            FailureClass::classify("token refresh timed out"),
            FailureClass::Authentication
        );
    }

    #[test]
    fn everything_else_is_server() {
        assert_eq!(FailureClass::classify("violates foreign key"), FailureClass::Server);
        assert_eq!(FailureClass::classify(""), FailureClass::Server);
        assert!(!FailureClass::Server.halts_drain());
        assert!(FailureClass::Network.halts_drain());
    }
}
