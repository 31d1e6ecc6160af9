//! Shared "what happens next" value type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::EntityId;

/// Kind of routing target a [`Destination`] points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DestinationKind {
    Extension,
    Queue,
    Ivr,
    Recording,
    Announcement,
    Hangup,
    #[default]
    None,
    /// Any type string the storage layer produced that this crate does not know.
    Unknown(String),
}

impl DestinationKind {
    pub fn as_str(&self) -> &str {
        match self {
            DestinationKind::Extension => "extension",
            DestinationKind::Queue => "queue",
            DestinationKind::Ivr => "ivr",
            DestinationKind::Recording => "recording",
            DestinationKind::Announcement => "announcement",
            DestinationKind::Hangup => "hangup",
            DestinationKind::None => "none",
            DestinationKind::Unknown(other) => other,
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(
            match s
                .trim()
                .to_ascii_lowercase()
                .as_str()
            {
                "extension" => DestinationKind::Extension,
                "queue" => DestinationKind::Queue,
                "ivr" => DestinationKind::Ivr,
                "recording" => DestinationKind::Recording,
                "announcement" => DestinationKind::Announcement,
                "hangup" => DestinationKind::Hangup,
                "" | "none" => DestinationKind::None,
                _ => DestinationKind::Unknown(s.to_string()),
            },
        )
    }
}

impl<'de> Deserialize<'de> for DestinationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .map(|s| {
                s.parse()
                    .unwrap_or_default()
            })
            .unwrap_or_default())
    }
}

impl Serialize for DestinationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// `{ type, id }` pair naming where a call goes next.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Destination {
    #[serde(rename = "type", default)]
    pub kind: DestinationKind,
    #[serde(default)]
    pub id: Option<EntityId>,
}

impl Destination {
    pub fn new(kind: DestinationKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn hangup() -> Self {
        Self {
            kind: DestinationKind::Hangup,
            id: None,
        }
    }

    pub fn extension(id: impl Into<EntityId>) -> Self {
        Self::new(DestinationKind::Extension, id)
    }

    pub fn queue(id: impl Into<EntityId>) -> Self {
        Self::new(DestinationKind::Queue, id)
    }

    pub fn ivr(id: impl Into<EntityId>) -> Self {
        Self::new(DestinationKind::Ivr, id)
    }

    pub fn announcement(id: impl Into<EntityId>) -> Self {
        Self::new(DestinationKind::Announcement, id)
    }

    pub fn recording(id: impl Into<EntityId>) -> Self {
        Self::new(DestinationKind::Recording, id)
    }

    /// Target id as a string, empty when unset.
    pub fn target(&self) -> &str {
        self.id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("")
    }

    /// `true` when the destination carries a routable type and a non-empty id.
    pub fn is_set(&self) -> bool {
        match self.kind {
            DestinationKind::Hangup => true,
            DestinationKind::None => false,
            _ => !self
                .target()
                .is_empty(),
        }
    }
}

/// `'Yes'`/`'No'` flag as stored by the admin forms.
///
/// Anything other than a case-insensitive `yes` (or JSON `true`) reads as `No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct YesNo(pub bool);

impl YesNo {
    pub const YES: YesNo = YesNo(true);
    pub const NO: YesNo = YesNo(false);

    pub fn is_yes(self) -> bool {
        self.0
    }
}

impl<'de> Deserialize<'de> for YesNo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Flag(b)) => YesNo(b),
            Some(Raw::Text(s)) => YesNo(
                s.trim()
                    .eq_ignore_ascii_case("yes"),
            ),
            None => YesNo::NO,
        })
    }
}

impl Serialize for YesNo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.0 { "Yes" } else { "No" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        let dest: Destination = serde_json::from_str(r#"{"type":"queue","id":"Q1"}"#).unwrap();
        assert_eq!(dest.kind, DestinationKind::Queue);
        assert_eq!(dest.target(), "Q1");
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let dest: Destination =
            serde_json::from_str(r#"{"type":"conference","id":"9"}"#).unwrap();
        assert_eq!(dest.kind, DestinationKind::Unknown("conference".into()));
    }

    #[test]
    fn missing_or_null_type_is_none() {
        let dest: Destination = serde_json::from_str(r#"{"type":null}"#).unwrap();
        assert_eq!(dest.kind, DestinationKind::None);
        let dest: Destination = serde_json::from_str("{}").unwrap();
        assert_eq!(dest.kind, DestinationKind::None);
        assert!(!dest.is_set());
    }

    #[test]
    fn yes_no_flags() {
        let flags: Vec<YesNo> =
            serde_json::from_str(r#"["Yes","no","YES",true,false,null,"maybe"]"#).unwrap();
        assert_eq!(
            flags,
            vec![
                YesNo::YES,
                YesNo::NO,
                YesNo::YES,
                YesNo::YES,
                YesNo::NO,
                YesNo::NO,
                YesNo::NO
            ]
        );
    }
}
