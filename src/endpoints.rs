//! Typed request builders for the document API.
//!
//! Base URLs are validated once by [`BaseUrl::parse`]; after that every endpoint
//! URL is built by pushing percent-encoded path segments, so an identifier can
//! never break out of its segment.

use url::Url;

use crate::error::{CrawlerError, Result};

/// A validated http(s) URL that path segments can be appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Parse and validate a base URL.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(CrawlerError::InvalidBaseUrl(input.to_string()));
        }
        Ok(Self(url))
    }

    /// Append path segments to the base, keeping the base's own path.
    pub fn join_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.0.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut path = url
                .path_segments_mut()
                .expect("BaseUrl::parse rejects cannot-be-a-base URLs");
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }
}

/// One read-only call against the document API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphRequest<'a> {
    /// Every site visible to the signed-in user.
    AllSites,
    /// Direct children of a site.
    Subsites { site_id: &'a str },
    /// Lists (including document libraries) of a site.
    Lists { site_id: &'a str },
    /// Items of one list.
    ListItems { site_id: &'a str, list_id: &'a str },
    /// The drive-item representation of one list item.
    DriveItem {
        site_id: &'a str,
        list_id: &'a str,
        item_id: &'a str,
    },
    /// Binary content of a drive item.
    Content { drive_id: &'a str, item_id: &'a str },
}

/// Builds URLs for [`GraphRequest`]s against one API base.
#[derive(Debug, Clone)]
pub struct GraphEndpoints {
    base: BaseUrl,
}

impl GraphEndpoints {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            base: BaseUrl::parse(base)?,
        })
    }

    pub fn url_for(&self, request: GraphRequest<'_>) -> Url {
        match request {
            GraphRequest::AllSites => {
                let mut url = self.base.join_segments(&["sites"]);
                url.query_pairs_mut().append_pair("search", "*");
                url
            }
            GraphRequest::Subsites { site_id } => {
                self.base.join_segments(&["sites", site_id, "sites"])
            }
            GraphRequest::Lists { site_id } => self.base.join_segments(&["sites", site_id, "lists"]),
            GraphRequest::ListItems { site_id, list_id } => {
                self.base
                    .join_segments(&["sites", site_id, "lists", list_id, "items"])
            }
            GraphRequest::DriveItem {
                site_id,
                list_id,
                item_id,
            } => self.base.join_segments(&[
                "sites",
                site_id,
                "lists",
                list_id,
                "items",
                item_id,
                "driveItem",
            ]),
            GraphRequest::Content { drive_id, item_id } => {
                self.base
                    .join_segments(&["drives", drive_id, "items", item_id, "content"])
            }
        }
    }

    /// Whether `url` has the same scheme, host and port as the API base.
    pub fn same_origin(&self, url: &Url) -> bool {
        url.origin() == self.base.0.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> GraphEndpoints {
        GraphEndpoints::new("https://graph.microsoft.com/v1.0").unwrap()
    }

    #[test]
    fn test_all_sites_searches_everything() {
        let url = graph().url_for(GraphRequest::AllSites);
        assert_eq!(url.as_str(), "https://graph.microsoft.com/v1.0/sites?search=*");
    }

    #[test]
    fn test_drive_item_path() {
        let url = graph().url_for(GraphRequest::DriveItem {
            site_id: "contoso.sharepoint.com,1111,2222",
            list_id: "list-1",
            item_id: "7",
        });
        assert_eq!(
            url.as_str(),
            "https://graph.microsoft.com/v1.0/sites/contoso.sharepoint.com,1111,2222/lists/list-1/items/7/driveItem"
        );
    }

    #[test]
    fn test_content_path() {
        let url = graph().url_for(GraphRequest::Content {
            drive_id: "b!abc",
            item_id: "01XYZ",
        });
        assert_eq!(
            url.as_str(),
            "https://graph.microsoft.com/v1.0/drives/b!abc/items/01XYZ/content"
        );
    }

    #[test]
    fn test_identifiers_cannot_escape_their_segment() {
        let url = graph().url_for(GraphRequest::Lists {
            site_id: "../me?x=1",
        });
        assert_eq!(
            url.as_str(),
            "https://graph.microsoft.com/v1.0/sites/..%2Fme%3Fx=1/lists"
        );
    }

    #[test]
    fn test_trailing_slash_on_base() {
        let endpoints = GraphEndpoints::new("http://localhost:1234/v1.0/").unwrap();
        let url = endpoints.url_for(GraphRequest::Subsites { site_id: "s1" });
        assert_eq!(url.as_str(), "http://localhost:1234/v1.0/sites/s1/sites");
    }

    #[test]
    fn test_same_origin() {
        let graph = graph();
        let page = Url::parse("https://graph.microsoft.com/v1.0/sites?$skiptoken=abc").unwrap();
        assert!(graph.same_origin(&page));

        for other in [
            "https://evil.example.com/v1.0/sites",
            "http://graph.microsoft.com/v1.0/sites",
            "https://graph.microsoft.com:8443/v1.0/sites",
        ] {
            assert!(!graph.same_origin(&Url::parse(other).unwrap()), "{other}");
        }
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(GraphEndpoints::new("not a url").is_err());
        assert!(GraphEndpoints::new("mailto:someone@example.com").is_err());
        assert!(GraphEndpoints::new("ftp://example.com").is_err());
    }
}
