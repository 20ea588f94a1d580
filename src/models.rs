//! Data models for document API and identity provider responses.

use serde::{Deserialize, Serialize};

/// Template tag of lists that hold files.
pub const DOCUMENT_LIBRARY_TEMPLATE: &str = "documentLibrary";

/// Content-type prefix of folders and other system items inside a library.
pub const RESERVED_CONTENT_TYPE_PREFIX: &str = "0x012000";

/// A page of a collection response.
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// A site or subsite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// A list of a site; document libraries are lists too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteList {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub list: Option<ListInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListInfo {
    #[serde(default)]
    pub template: String,
}

impl SiteList {
    pub fn is_document_library(&self) -> bool {
        self.list
            .as_ref()
            .is_some_and(|info| info.template == DOCUMENT_LIBRARY_TEMPLATE)
    }
}

/// An entry of a list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content_type: Option<ContentTypeInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentTypeInfo {
    #[serde(default)]
    pub id: String,
}

impl ListItem {
    /// Folders and special items carry a reserved content type and hold no document.
    pub fn is_reserved(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.id.starts_with(RESERVED_CONTENT_TYPE_PREFIX))
    }
}

/// Graph API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// OAuth2 error response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// The ID token claims used to identify the signed-in account.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub oid: String,
    #[serde(default)]
    pub tid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_document_library_detection() {
        let json = r#"{"id": "l1", "displayName": "Documents", "list": {"template": "documentLibrary"}}"#;
        let list: SiteList = serde_json::from_str(json).unwrap();
        assert!(list.is_document_library());

        let json = r#"{"id": "l2", "displayName": "Tasks", "list": {"template": "genericList"}}"#;
        let list: SiteList = serde_json::from_str(json).unwrap();
        assert!(!list.is_document_library());

        let list: SiteList = serde_json::from_str(r#"{"id": "l3"}"#).unwrap();
        assert!(!list.is_document_library());
    }

    #[test]
    fn test_reserved_content_type() {
        let folder: ListItem =
            serde_json::from_str(r#"{"id": "1", "contentType": {"id": "0x0120001234"}}"#).unwrap();
        assert!(folder.is_reserved());

        let document: ListItem =
            serde_json::from_str(r#"{"id": "2", "contentType": {"id": "0x0101009A"}}"#).unwrap();
        assert!(!document.is_reserved());

        let bare: ListItem = serde_json::from_str(r#"{"id": "3"}"#).unwrap();
        assert!(!bare.is_reserved());
    }

    #[test]
    fn test_collection_next_link() {
        let json = r#"{"value": [{"id": "s1"}], "@odata.nextLink": "https://next"}"#;
        let page: Collection<Site> = serde_json::from_str(json).unwrap();
        assert_eq!(page.value.len(), 1);
        assert_eq!(page.next_link.as_deref(), Some("https://next"));

        let page: Collection<Site> = serde_json::from_str("{}").unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }
}
