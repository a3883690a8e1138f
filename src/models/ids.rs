//! Opaque identifiers handed out by the Riot API.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

opaque_id!(
    /// Canonical player identifier, stable across name changes.
    Puuid
);

opaque_id!(
    /// Match identifier, unique within a regional partition (e.g. `NA1_4812345678`).
    MatchId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_puuid_serializes_as_plain_string() {
        let id = Puuid::from("abc-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc-123\"");

        let parsed: Puuid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_match_id_list_deserialization() {
        let ids: Vec<MatchId> = serde_json::from_str(r#"["NA1_1", "NA1_2"]"#).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].as_str(), "NA1_1");
    }

    #[test]
    fn test_display_and_debug() {
        let id = MatchId::new("EUW1_42");
        assert_eq!(format!("{}", id), "EUW1_42");
        assert_eq!(format!("{:?}", id), "MatchId(EUW1_42)");
    }
}
