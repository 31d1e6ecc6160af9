use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque entity identifier.
///
/// The storage layer hands out either 24-hex-character object ids (sometimes
/// wrapped as `{"$oid": "..."}`) or plain strings. Both are kept verbatim and
/// compared by their canonical string form; nothing is validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(
            id.into()
                .trim()
                .to_string(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0
            .is_empty()
    }

    /// `true` for the 24-hex-character object id form.
    pub fn is_object_id(&self) -> bool {
        self.0
            .len()
            == 24
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_hexdigit())
    }

    /// Case-insensitive for object ids, exact for everything else.
    pub fn matches(&self, other: &EntityId) -> bool {
        if self.is_object_id() && other.is_object_id() {
            self.0
                .eq_ignore_ascii_case(&other.0)
        } else {
            self.0 == other.0
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
    Wrapped {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => EntityId::new(s),
            RawId::Number(n) => EntityId::new(n.to_string()),
            RawId::Wrapped { oid } => EntityId::new(oid),
        })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_wrapped_forms() {
        let plain: EntityId = serde_json::from_str("\"64b7f0c2a1b2c3d4e5f60718\"").unwrap();
        let wrapped: EntityId =
            serde_json::from_str(r#"{"$oid": "64b7f0c2a1b2c3d4e5f60718"}"#).unwrap();
        assert_eq!(plain, wrapped);
        assert!(plain.is_object_id());
    }

    #[test]
    fn malformed_ids_are_kept_as_strings() {
        let id: EntityId = serde_json::from_str("\"not-an-object-id\"").unwrap();
        assert_eq!(id.as_str(), "not-an-object-id");
        assert!(!id.is_object_id());
    }

    #[test]
    fn numeric_ids_become_strings() {
        let id: EntityId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn object_ids_match_case_insensitively() {
        let a = EntityId::new("64B7F0C2A1B2C3D4E5F60718");
        let b = EntityId::new("64b7f0c2a1b2c3d4e5f60718");
        assert!(a.matches(&b));
        assert!(!EntityId::new("Main").matches(&EntityId::new("main")));
    }
}
