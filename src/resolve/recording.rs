use tracing::trace;

use crate::model::{Recording, RecordingRef};

/// Turn an uploaded file's original name into a sound path.
///
/// Takes the last path segment, drops a trailing extension and prefixes
/// `namespace`. Returns `None` when nothing is left.
pub fn normalize_filename(original_name: &str, namespace: &str) -> Option<String> {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    let stem = match base.rfind('.') {
        Some(dot) => &base[..dot],
        None => base,
    };
    if stem.is_empty() {
        None
    } else {
        Some(format!("{}{}", namespace, stem))
    }
}

/// Filenames a recording reference implies, in playback order.
///
/// A missing reference, an unknown id or a recording without files all yield
/// an empty list.
pub fn resolve_filenames(
    reference: Option<&RecordingRef>,
    recordings: &[Recording],
    namespace: &str,
) -> Vec<String> {
    let Some(reference) = reference.filter(|r| !r.id.is_empty()) else {
        return Vec::new();
    };

    let Some(recording) = recordings
        .iter()
        .find(|rec| rec.id.matches(&reference.id))
    else {
        trace!("No recording matches id {}", reference.id);
        return Vec::new();
    };

    recording
        .audio_files
        .iter()
        .filter_map(|file| normalize_filename(&file.original_name, namespace))
        .collect()
}
