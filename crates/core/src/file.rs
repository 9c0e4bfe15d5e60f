//! Uploaded-file descriptors.
//!
//! The engine never touches file contents. Uploads arrive as descriptors
//! produced by the upload collaborator; everything the file rules check is
//! read from the descriptor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    #[serde(alias = "type", alias = "mime")]
    pub mime_type: String,
    #[serde(default, alias = "tmp_name", skip_serializing_if = "Option::is_none")]
    pub temp_storage_handle: Option<String>,
    /// Pixel width, when the upload collaborator measured an image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl FileDescriptor {
    /// Lower-cased extension of `name`, without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.to_ascii_lowercase().starts_with("image/")
    }

    /// A descriptor the upload collaborator filled in for a real file.
    pub fn is_present(&self) -> bool {
        !self.name.trim().is_empty() && self.size > 0
    }
}

/// Decode the descriptor(s) carried by a field value.
///
/// Single uploads are a map, multi-file uploads a list of maps. Returns
/// `None` if any entry is not a descriptor or the list is empty.
pub fn descriptors(value: &Value) -> Option<Vec<FileDescriptor>> {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone()).ok().map(|d| vec![d]),
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pdf() -> Value {
        json!({
            "name": "report.PDF",
            "size": 2048,
            "mime_type": "application/pdf",
            "temp_storage_handle": "tmp/abc123"
        })
    }

    #[test]
    fn single_descriptor() {
        let files = descriptors(&pdf()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].extension().as_deref(), Some("pdf"));
        assert!(files[0].is_present());
        assert!(!files[0].is_image());
    }

    #[test]
    fn multiple_descriptors() {
        let files = descriptors(&json!([pdf(), pdf()])).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn accepts_upload_aliases() {
        let files = descriptors(&json!({
            "name": "a.png", "size": 1, "type": "image/png", "tmp_name": "/tmp/x"
        }))
        .unwrap();
        assert!(files[0].is_image());
        assert_eq!(files[0].temp_storage_handle.as_deref(), Some("/tmp/x"));
    }

    #[test]
    fn rejects_non_descriptors() {
        assert!(descriptors(&json!("report.pdf")).is_none());
        assert!(descriptors(&json!({"name": "a.pdf"})).is_none());
        assert!(descriptors(&json!([pdf(), "x"])).is_none());
        assert!(descriptors(&json!([])).is_none());
    }

    #[test]
    fn dotfile_has_no_extension() {
        let d = FileDescriptor {
            name: ".env".into(),
            size: 1,
            mime_type: "text/plain".into(),
            temp_storage_handle: None,
            width: None,
            height: None,
        };
        assert_eq!(d.extension(), None);
    }
}
