//! Upload rules. They read [`FileDescriptor`]s, never file contents.

use serde_json::{Map, Value};

use super::RuleRegistry;
use crate::file::{descriptors, FileDescriptor};
use crate::types::SubmissionData;
use crate::value::{to_list, to_number};

pub(crate) fn register(registry: &RuleRegistry) {
    registry.register_builtin(
        "file_required",
        "Please upload a file",
        |v: &Value, _: &Value, _: &SubmissionData| {
            descriptors(v).is_some_and(|files| files.iter().all(FileDescriptor::is_present))
        },
    );
    registry.register_builtin(
        "file_type",
        "File type must be one of: {param}",
        |v: &Value, p: &Value, _: &SubmissionData| {
            let accepted = to_list(p);
            if accepted.is_empty() {
                return true;
            }
            all_files(v, |file| accepts_type(file, &accepted))
        },
    );
    registry.register_builtin(
        "file_size",
        "File size must not exceed {param} KB",
        |v: &Value, p: &Value, _: &SubmissionData| match to_number(p) {
            Some(max_kb) => all_files(v, |file| within_size(file, max_kb)),
            None => true,
        },
    );
    registry.register_builtin(
        "image_dimensions",
        "Image dimensions are not allowed",
        |v: &Value, p: &Value, _: &SubmissionData| {
            let bounds = DimensionBounds::from_value(p);
            all_files(v, |file| file.is_image() && bounds.admits(file))
        },
    );
}

fn all_files(value: &Value, check: impl Fn(&FileDescriptor) -> bool) -> bool {
    descriptors(value).is_some_and(|files| files.iter().all(check))
}

/// `accepted` entries are extensions (`pdf`, `.pdf`), MIME types
/// (`application/pdf`) or MIME wildcards (`image/*`).
pub fn accepts_type(file: &FileDescriptor, accepted: &[String]) -> bool {
    let mime = file.mime_type.to_ascii_lowercase();
    let extension = file.extension();
    accepted.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        if let Some(family) = entry.strip_suffix("/*") {
            mime.split_once('/').is_some_and(|(top, _)| top == family)
        } else if entry.contains('/') {
            mime == entry
        } else {
            extension.as_deref() == Some(entry.trim_start_matches('.'))
        }
    })
}

/// `max_kb` is in kilobytes (1 KB = 1024 bytes).
pub fn within_size(file: &FileDescriptor, max_kb: f64) -> bool {
    (file.size as f64) <= max_kb * 1024.0
}

/// Pixel bounds for `image_dimensions`. Every bound is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DimensionBounds {
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
}

impl DimensionBounds {
    /// Read bounds from a rule parameter; non-maps are unbounded.
    pub fn from_value(param: &Value) -> Self {
        param.as_object().map(Self::from_map).unwrap_or_default()
    }

    /// Read `min_width`, `max_width`, `min_height` and `max_height`.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let get = |key: &str| map.get(key).and_then(to_number);
        Self {
            min_width: get("min_width"),
            max_width: get("max_width"),
            min_height: get("min_height"),
            max_height: get("max_height"),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }

    /// Descriptors without measured dimensions are admitted.
    pub fn admits(&self, file: &FileDescriptor) -> bool {
        let (Some(width), Some(height)) = (file.width, file.height) else {
            return true;
        };
        let (w, h) = (f64::from(width), f64::from(height));
        self.min_width.map_or(true, |m| w >= m)
            && self.max_width.map_or(true, |m| w <= m)
            && self.min_height.map_or(true, |m| h >= m)
            && self.max_height.map_or(true, |m| h <= m)
    }
}
