//! Document records and the normalizer that builds them from drive items.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{format_size, Site};

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Discriminator written on every record.
pub const CONTENT_TYPE_FILE: &str = "file";

/// Whether documents of this MIME type go through text extraction.
pub fn is_extractable(mime_type: &str) -> bool {
    matches!(mime_type, PDF_MIME | DOCX_MIME)
}

/// Result of extracting one document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Extracted(String),
    Failed(String),
}

/// One crawled document: drive-item metadata, owning site and extracted text.
///
/// Field order is the snapshot's key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "sp_file_id")]
    pub id: String,
    #[serde(rename = "sp_file_download_url")]
    pub download_url: Option<String>,
    #[serde(rename = "sp_file_web_url")]
    pub web_url: String,
    #[serde(rename = "sp_file_name")]
    pub name: String,
    #[serde(rename = "sp_file_mime_type")]
    pub mime_type: String,
    #[serde(rename = "sp_drive_id")]
    pub drive_id: String,
    #[serde(rename = "sp_drive_type")]
    pub drive_type: String,
    #[serde(rename = "sp_file_created_date")]
    pub created_at: String,
    #[serde(rename = "sp_file_lmod_date")]
    pub modified_at: String,
    #[serde(rename = "sp_file_created_by")]
    pub created_by: String,
    #[serde(rename = "sp_file_lmod_by")]
    pub modified_by: String,
    #[serde(rename = "sp_file_size")]
    pub size: u64,
    #[serde(rename = "sp_content_type")]
    pub content_type: String,
    #[serde(rename = "sp_file_shared_by", skip_serializing_if = "Option::is_none", default)]
    pub shared_by: Option<String>,
    #[serde(rename = "sp_file_shared_date", skip_serializing_if = "Option::is_none", default)]
    pub shared_at: Option<String>,
    #[serde(rename = "sp_file_content", default)]
    pub content: Option<String>,
    #[serde(
        rename = "sp_file_extraction_error",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub extraction_error: Option<String>,
    #[serde(rename = "sp_site_id", default)]
    pub site_id: String,
    #[serde(rename = "sp_site_name", default)]
    pub site_name: String,
    #[serde(rename = "sp_site_url", default)]
    pub site_url: Option<String>,
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn string_at(value: &Value, pointer: &str) -> String {
    str_at(value, pointer).unwrap_or_default().to_string()
}

impl DocumentRecord {
    /// Normalize a drive item.
    ///
    /// Never fails: missing fields become empty strings, zero or `None`. When
    /// the item is a reference to content stored elsewhere (`remoteItem`), the
    /// drive and sharing details come from the remote item.
    pub fn from_drive_item(item: &Value) -> Self {
        let remote = item
            .get("remoteItem")
            .filter(|remote| remote.as_object().is_some_and(|obj| !obj.is_empty()));

        let (drive_id, drive_type) = match remote {
            Some(remote) => (
                string_at(remote, "/parentReference/driveId"),
                string_at(remote, "/parentReference/driveType"),
            ),
            None => (
                string_at(item, "/parentReference/driveId"),
                string_at(item, "/parentReference/driveType"),
            ),
        };

        let shared = remote
            .and_then(|remote| remote.get("shared"))
            .filter(|shared| shared.as_object().is_some_and(|obj| !obj.is_empty()));

        let download_url = str_at(item, "/@microsoft.graph.downloadUrl")
            .or_else(|| remote.and_then(|remote| str_at(remote, "/webDavUrl")))
            .map(str::to_string);

        Self {
            id: string_at(item, "/id"),
            download_url,
            web_url: string_at(item, "/webUrl"),
            name: string_at(item, "/name"),
            mime_type: string_at(item, "/file/mimeType"),
            drive_id,
            drive_type,
            created_at: string_at(item, "/createdDateTime"),
            modified_at: string_at(item, "/lastModifiedDateTime"),
            created_by: string_at(item, "/createdBy/user/displayName"),
            modified_by: string_at(item, "/lastModifiedBy/user/displayName"),
            size: item.get("size").and_then(Value::as_u64).unwrap_or(0),
            content_type: CONTENT_TYPE_FILE.to_string(),
            shared_by: shared.map(|shared| string_at(shared, "/sharedBy/user/displayName")),
            shared_at: shared.and_then(|shared| str_at(shared, "/sharedDateTime").map(str::to_string)),
            content: None,
            extraction_error: None,
            site_id: String::new(),
            site_name: String::new(),
            site_url: None,
        }
    }

    pub fn is_extractable(&self) -> bool {
        is_extractable(&self.mime_type)
    }

    /// Attach the extraction result: text on success, null content plus reason on failure.
    pub fn with_extraction(mut self, outcome: ExtractionOutcome) -> Self {
        match outcome {
            ExtractionOutcome::Extracted(text) => {
                self.content = Some(text);
                self.extraction_error = None;
            }
            ExtractionOutcome::Failed(reason) => {
                self.content = None;
                self.extraction_error = Some(reason);
            }
        }
        self
    }

    /// Attach the owning site.
    pub fn with_site(mut self, site: &Site) -> Self {
        self.site_id = site.id.clone();
        self.site_name = site.display_name.clone();
        self.site_url = site.web_url.clone();
        self
    }
}

impl std::fmt::Display for DocumentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match (&self.content, &self.extraction_error) {
            (Some(text), _) => format!("{} chars", text.chars().count()),
            (None, Some(_)) => "failed".to_string(),
            (None, None) => "-".to_string(),
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.id,
            format_size(self.size),
            self.mime_type,
            status,
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn direct_item() -> Value {
        json!({
            "id": "01ABC",
            "name": "report.pdf",
            "webUrl": "https://contoso.sharepoint.com/Shared%20Documents/report.pdf",
            "@microsoft.graph.downloadUrl": "https://download/01ABC",
            "size": 2048,
            "createdDateTime": "2024-01-02T03:04:05Z",
            "lastModifiedDateTime": "2024-02-03T04:05:06Z",
            "createdBy": {"user": {"displayName": "Adele Vance"}},
            "lastModifiedBy": {"user": {"displayName": "Alex Wilber"}},
            "file": {"mimeType": "application/pdf"},
            "parentReference": {"driveId": "b!own", "driveType": "documentLibrary"}
        })
    }

    #[test]
    fn test_direct_item() {
        let record = DocumentRecord::from_drive_item(&direct_item());

        assert_eq!(record.id, "01ABC");
        assert_eq!(record.download_url.as_deref(), Some("https://download/01ABC"));
        assert_eq!(record.drive_id, "b!own");
        assert_eq!(record.drive_type, "documentLibrary");
        assert_eq!(record.created_by, "Adele Vance");
        assert_eq!(record.modified_by, "Alex Wilber");
        assert_eq!(record.size, 2048);
        assert_eq!(record.content_type, "file");
        assert!(record.shared_by.is_none());
        assert!(record.shared_at.is_none());
        assert!(record.is_extractable());
    }

    #[test]
    fn test_remote_item_overrides_container() {
        let mut item = direct_item();
        item.as_object_mut().unwrap().remove("@microsoft.graph.downloadUrl");
        item["remoteItem"] = json!({
            "webDavUrl": "https://dav/01ABC",
            "parentReference": {"driveId": "b!remote", "driveType": "business"},
            "shared": {
                "sharedBy": {"user": {"displayName": "Megan Bowen"}},
                "sharedDateTime": "2024-03-04T05:06:07Z"
            }
        });

        let record = DocumentRecord::from_drive_item(&item);

        assert_eq!(record.drive_id, "b!remote");
        assert_eq!(record.drive_type, "business");
        assert_eq!(record.download_url.as_deref(), Some("https://dav/01ABC"));
        assert_eq!(record.shared_by.as_deref(), Some("Megan Bowen"));
        assert_eq!(record.shared_at.as_deref(), Some("2024-03-04T05:06:07Z"));
    }

    #[test]
    fn test_empty_item_normalizes() {
        let record = DocumentRecord::from_drive_item(&json!({}));
        assert_eq!(record.id, "");
        assert_eq!(record.size, 0);
        assert!(record.download_url.is_none());
        assert!(!record.is_extractable());

        let record = DocumentRecord::from_drive_item(&json!("not an object"));
        assert_eq!(record.name, "");
    }

    #[test]
    fn test_extraction_outcome_on_record() {
        let record = DocumentRecord::from_drive_item(&direct_item())
            .with_extraction(ExtractionOutcome::Failed("status 500".to_string()));
        assert!(record.content.is_none());
        assert_eq!(record.extraction_error.as_deref(), Some("status 500"));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["sp_file_content"].is_null());

        let record = record.with_extraction(ExtractionOutcome::Extracted("hello".to_string()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sp_file_content"], "hello");
        assert!(json.get("sp_file_extraction_error").is_none());
    }

    #[test]
    fn test_extractable_mime_types() {
        assert!(is_extractable(PDF_MIME));
        assert!(is_extractable(DOCX_MIME));
        assert!(!is_extractable("application/msword"));
        assert!(!is_extractable("image/png"));
        assert!(!is_extractable(""));
    }
}
