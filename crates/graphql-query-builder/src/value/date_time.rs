//! Serde field helpers for date-times inside serialized arguments.
//!
//! chrono serializes a `DateTime` as a plain string, which
//! [`Value::from_serialize`](crate::Value::from_serialize) cannot tell apart
//! from any other string. Fields annotated with these helpers become
//! [`Value::DateTime`](crate::Value::DateTime) and render with the
//! millisecond RFC 3339 literal. Other serializers still see the RFC 3339
//! text.
//!
//! ```
//! use chrono::{DateTime, Utc};
//! use graphql_query_builder::Value;
//!
//! #[derive(serde::Serialize)]
//! struct Filter {
//!     #[serde(with = "graphql_query_builder::date_time")]
//!     since: DateTime<Utc>,
//! }
//!
//! let since = DateTime::parse_from_rfc3339("2024-03-09T14:05:07Z")?.to_utc();
//! let value = Value::from_serialize(&Filter { since })?;
//! assert_eq!(value.to_string(), "{since:\"2024-03-09T14:05:07.000Z\"}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Newtype-struct name a date-time serializes under.
pub(crate) const DATETIME_MARKER: &str = "$graphql_query_builder::DateTime";

pub(crate) fn to_literal<Tz: TimeZone>(value: &DateTime<Tz>) -> String {
    value
        .fixed_offset()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize<Tz, S>(value: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error>
where
    Tz: TimeZone,
    S: Serializer,
{
    serializer.serialize_newtype_struct(DATETIME_MARKER, &to_literal(value))
}

pub fn deserialize<'de, Tz, D>(deserializer: D) -> Result<DateTime<Tz>, D::Error>
where
    Tz: TimeZone,
    DateTime<Tz>: Deserialize<'de>,
    D: Deserializer<'de>,
{
    DateTime::<Tz>::deserialize(deserializer)
}

struct Marked<'a, Tz: TimeZone>(&'a DateTime<Tz>);

impl<Tz: TimeZone> Serialize for Marked<'_, Tz> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(self.0, serializer)
    }
}

/// The same helpers for `Option<DateTime<_>>` fields.
pub mod option {
    use super::{DateTime, Deserialize, Deserializer, Marked, Serializer, TimeZone};

    #[allow(clippy::ref_option)]
    pub fn serialize<Tz, S>(value: &Option<DateTime<Tz>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        Tz: TimeZone,
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_some(&Marked(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, Tz, D>(deserializer: D) -> Result<Option<DateTime<Tz>>, D::Error>
    where
        Tz: TimeZone,
        DateTime<Tz>: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<DateTime<Tz>>::deserialize(deserializer)
    }
}
