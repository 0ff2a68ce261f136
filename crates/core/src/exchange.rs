//! Exchange: one logged question/answer turn.
//!
//! The serialized shape (`timestamp`, `user`, `assistant`, `safe`) is the
//! on-disk format of the conversation log and must stay stable: existing
//! logs are read back to build the history window after a restart.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the persisted log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A completed turn. Immutable once appended to a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    /// Local wall-clock time the turn finished
    #[serde(with = "log_timestamp")]
    pub timestamp: NaiveDateTime,

    /// The caregiver's message, exactly as received
    #[serde(rename = "user")]
    pub user_text: String,

    /// The text returned to the caregiver
    #[serde(rename = "assistant")]
    pub assistant_text: String,

    /// False for guardrail refusals and technical failures
    #[serde(rename = "safe")]
    pub was_safe: bool,
}

impl Exchange {
    /// Record a turn stamped with the current local time.
    pub fn now(
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        was_safe: bool,
    ) -> Self {
        let now = Local::now().naive_local();
        Self {
            // Second precision, matching what survives a round trip through the log.
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            was_safe,
        }
    }
}

mod log_timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_log_field_names() {
        let exchange = Exchange::now("Olá", "Oi!", true);
        let json = serde_json::to_value(&exchange).unwrap();
        assert_eq!(json["user"], "Olá");
        assert_eq!(json["assistant"], "Oi!");
        assert_eq!(json["safe"], true);
        assert!(json["timestamp"].as_str().unwrap().len() == 19);
    }

    #[test]
    fn parses_existing_log_entry() {
        let raw = r#"{
            "timestamp": "2025-03-14 09:26:53",
            "user": "Qual a dose do remédio?",
            "assistant": "⚠️ ALERTA",
            "safe": false
        }"#;
        let exchange: Exchange = serde_json::from_str(raw).unwrap();
        assert_eq!(exchange.user_text, "Qual a dose do remédio?");
        assert!(!exchange.was_safe);
        assert_eq!(exchange.timestamp.format(TIMESTAMP_FORMAT).to_string(), "2025-03-14 09:26:53");
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let raw = r#"{"timestamp":"yesterday","user":"a","assistant":"b","safe":true}"#;
        assert!(serde_json::from_str::<Exchange>(raw).is_err());
    }
}
