//! Entity snapshots as exported by the admin storage layer.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Destination, EntityId, YesNo};

/// Agent and the extension assigned to them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(default)]
    pub user_extension: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

impl Agent {
    pub fn new(extension: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_extension: Some(extension.into()),
            display_name: display_name.into(),
        }
    }

    /// Assigned extension, `None` when missing or blank.
    pub fn extension(&self) -> Option<&str> {
        self.user_extension
            .as_deref()
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFile {
    pub original_name: String,
}

/// Uploaded recording with its ordered audio files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub audio_files: Vec<AudioFile>,
}

impl Recording {
    pub fn new(id: impl Into<EntityId>, files: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: None,
            audio_files: files
                .iter()
                .map(|f| AudioFile {
                    original_name: f.to_string(),
                })
                .collect(),
        }
    }
}

/// Reference from another entity to a [`Recording`].
///
/// Stored either as a bare id or as `{ id, name }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RecordingRef {
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RecordingRef {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

impl<'de> Deserialize<'de> for RecordingRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Full {
                #[serde(alias = "_id", default)]
                id: EntityId,
                #[serde(default)]
                name: Option<String>,
            },
            Bare(EntityId),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Full { id, name } => RecordingRef { id, name },
            Raw::Bare(id) => RecordingRef::new(id),
        })
    }
}

/// Announcement repeat setting: `disable` or the digit that replays it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Disabled,
    Digit(String),
}

impl Repeat {
    pub fn digit(&self) -> Option<&str> {
        match self {
            Repeat::Disabled => None,
            Repeat::Digit(d) => Some(d),
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repeat::Disabled => f.write_str("disable"),
            Repeat::Digit(d) => f.write_str(d),
        }
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u8),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(n)) => Repeat::Digit(n.to_string()),
            Some(Raw::Text(s)) => {
                let s = s.trim();
                if s.is_empty() || s.eq_ignore_ascii_case("disable") || s.eq_ignore_ascii_case("no")
                {
                    Repeat::Disabled
                } else {
                    Repeat::Digit(s.to_string())
                }
            }
            None => Repeat::Disabled,
        })
    }
}

impl Serialize for Repeat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dont_answer_channel: YesNo,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub recording: Option<RecordingRef>,
    #[serde(default)]
    pub allow_skip: YesNo,
    #[serde(default, rename = "returnToIVR")]
    pub return_to_ivr: YesNo,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub destination_after_playback: Destination,
}

impl Announcement {
    /// Dial code exposing the announcement, `None` when missing or blank.
    pub fn dial_code(&self) -> Option<&str> {
        self.extension
            .as_deref()
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
    }
}

/// What pressing an IVR digit does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IvrEntryKind {
    #[default]
    Extension,
    Queue,
    Ivr,
    Voicemail,
    Recording,
    Hangup,
    Unknown(String),
}

impl IvrEntryKind {
    pub fn as_str(&self) -> &str {
        match self {
            IvrEntryKind::Extension => "extension",
            IvrEntryKind::Queue => "queue",
            IvrEntryKind::Ivr => "ivr",
            IvrEntryKind::Voicemail => "voicemail",
            IvrEntryKind::Recording => "recording",
            IvrEntryKind::Hangup => "hangup",
            IvrEntryKind::Unknown(other) => other,
        }
    }
}

impl<'de> Deserialize<'de> for IvrEntryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(
            match raw
                .trim()
                .to_ascii_lowercase()
                .as_str()
            {
                "extension" => IvrEntryKind::Extension,
                "queue" => IvrEntryKind::Queue,
                "ivr" => IvrEntryKind::Ivr,
                "voicemail" => IvrEntryKind::Voicemail,
                "recording" => IvrEntryKind::Recording,
                "hangup" => IvrEntryKind::Hangup,
                _ => IvrEntryKind::Unknown(raw),
            },
        )
    }
}

impl Serialize for IvrEntryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IvrEntry {
    pub digit: String,
    #[serde(rename = "type")]
    pub kind: IvrEntryKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl IvrEntry {
    pub fn new(digit: impl Into<String>, kind: IvrEntryKind, value: impl Into<String>) -> Self {
        Self {
            digit: digit.into(),
            kind,
            value: value.into(),
            label: String::new(),
        }
    }
}

/// Timeouts, retry handling and optional behaviours of an IVR menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DtmfConfig {
    /// Main prompt.
    pub announcement: Option<RecordingRef>,
    /// Response timeout in seconds.
    #[serde(deserialize_with = "lenient_u32")]
    pub timeout: u32,
    /// Inter-digit timeout in seconds.
    #[serde(deserialize_with = "lenient_u32")]
    pub digit_timeout: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub invalid_retries: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub timeout_retries: u32,
    pub invalid_retry_recording: Option<RecordingRef>,
    pub invalid_recording: Option<RecordingRef>,
    pub timeout_retry_recording: Option<RecordingRef>,
    pub timeout_recording: Option<RecordingRef>,
    pub invalid_destination: Option<Destination>,
    pub timeout_destination: Option<Destination>,
    pub append_announcement_to_invalid: YesNo,
    pub append_announcement_to_timeout: YesNo,
    pub return_on_invalid: YesNo,
    pub return_on_timeout: YesNo,
    #[serde(rename = "returnToIVRAfterVM")]
    pub return_to_ivr_after_vm: YesNo,
    pub ignore_trailing_key: YesNo,
    pub alert_info: Option<String>,
    pub ringer_volume_override: Option<String>,
}

impl Default for DtmfConfig {
    fn default() -> Self {
        Self {
            announcement: None,
            timeout: 10,
            digit_timeout: 3,
            invalid_retries: 0,
            timeout_retries: 0,
            invalid_retry_recording: None,
            invalid_recording: None,
            timeout_retry_recording: None,
            timeout_recording: None,
            invalid_destination: None,
            timeout_destination: None,
            append_announcement_to_invalid: YesNo::NO,
            append_announcement_to_timeout: YesNo::NO,
            return_on_invalid: YesNo::NO,
            return_on_timeout: YesNo::NO,
            return_to_ivr_after_vm: YesNo::NO,
            ignore_trailing_key: YesNo::NO,
            alert_info: None,
            ringer_volume_override: None,
        }
    }
}

/// Admin forms store numbers as either JSON numbers or digit strings.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {:?}", s))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IvrMenu {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<IvrEntry>,
    #[serde(default)]
    pub dtmf: DtmfConfig,
}

/// Feature code bound straight into the dial context (e.g. `*65`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiscApplication {
    #[serde(default)]
    pub name: String,
    pub feature_code: String,
    #[serde(default)]
    pub destination: Destination,
}
