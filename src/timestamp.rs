//! RFC3339 formatting for the timestamps in JSON responses.

use serde::Serializer;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Serialize a timestamp as an RFC3339 string, e.g. `2025-01-31T12:00:00Z`.
pub fn serialize_rfc3339<S: Serializer>(
    timestamp: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let text = timestamp
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;

    serializer.serialize_str(&text)
}

#[cfg(test)]
mod timestamp_tests {
    use serde::Serialize;
    use time::{OffsetDateTime, macros::datetime};

    use super::serialize_rfc3339;

    #[derive(Serialize)]
    struct Wrapper {
        #[serde(serialize_with = "serialize_rfc3339")]
        at: OffsetDateTime,
    }

    #[test]
    fn formats_utc_with_z_suffix() {
        let wrapper = Wrapper {
            at: datetime!(2025-01-31 12:00 UTC),
        };

        assert_eq!(
            serde_json::to_string(&wrapper).unwrap(),
            r#"{"at":"2025-01-31T12:00:00Z"}"#
        );
    }

    #[test]
    fn keeps_fractional_seconds() {
        let wrapper = Wrapper {
            at: datetime!(2025-01-31 12:00:00.25 UTC),
        };

        assert_eq!(
            serde_json::to_string(&wrapper).unwrap(),
            r#"{"at":"2025-01-31T12:00:00.25Z"}"#
        );
    }
}
