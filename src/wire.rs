//! JSON payloads handed to the transport layer.

use crate::error::Result;
use serde::Serialize;

/// Sent in place of an event that could not be serialized.
pub const MARSHAL_ERROR_PAYLOAD: &str =
    r#"{"errors":["internal error: can't marshal response into json"]}"#;

/// Serialize a response body.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Serialize one subscription event for delivery.
///
/// A failure is logged and replaced by [`MARSHAL_ERROR_PAYLOAD`] so the
/// subscriber stays connected.
pub fn encode_event<T: Serialize>(event: &T) -> String {
    match to_json(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize subscription event");
            MARSHAL_ERROR_PAYLOAD.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::types::{GameData, NewSample, Sample, SeriesSnapshot, Timestamp};
    use serde::Serializer;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("nope"))
        }
    }

    #[test]
    fn test_encode_event() {
        let event = NewSample {
            name: "x".to_string(),
            time_value: Sample::new(Timestamp(12), 4),
        };
        assert_eq!(
            encode_event(&event),
            r#"{"name":"x","timeValue":{"timestampMs":"12","value":4}}"#
        );
    }

    #[test]
    fn test_encode_failure_becomes_error_payload() {
        assert_eq!(encode_event(&Unserializable), MARSHAL_ERROR_PAYLOAD);
        assert!(matches!(to_json(&Unserializable), Err(StoreError::Serialization(_))));

        let parsed: serde_json::Value = serde_json::from_str(MARSHAL_ERROR_PAYLOAD).unwrap();
        assert!(parsed["errors"].is_array());
    }

    #[test]
    fn test_game_data_shape() {
        let data = GameData {
            series: vec![SeriesSnapshot {
                name: "x".to_string(),
                values: vec![Sample::new(Timestamp(1), 10)],
            }],
        };
        assert_eq!(
            to_json(&data).unwrap(),
            r#"{"series":[{"name":"x","values":[{"timestampMs":"1","value":10}]}]}"#
        );
        assert_eq!(to_json(&GameData::default()).unwrap(), r#"{"series":[]}"#);
    }
}
