//! Document API client for the SharePoint site hierarchy.

use std::collections::HashSet;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::endpoints::{GraphEndpoints, GraphRequest};
use crate::error::Result;
use crate::http::{api_error, AuthorizedClient};
use crate::models::{Collection, ListItem, Site, SiteList};

/// Client for the read-only endpoints the crawler walks.
#[derive(Clone)]
pub struct SharePointClient {
    http: AuthorizedClient,
    endpoints: GraphEndpoints,
}

impl SharePointClient {
    /// Create a new SharePointClient.
    ///
    /// # Arguments
    /// * `http` - Authenticated client used for every call
    /// * `endpoints` - URL builder for the API base
    pub fn new(http: AuthorizedClient, endpoints: GraphEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// List every site visible to the signed-in user.
    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        self.get_collection(self.endpoints.url_for(GraphRequest::AllSites))
            .await
    }

    /// List the direct subsites of a site.
    pub async fn list_subsites(&self, site_id: &str) -> Result<Vec<Site>> {
        self.get_collection(self.endpoints.url_for(GraphRequest::Subsites { site_id }))
            .await
    }

    /// List the lists of a site, document libraries included.
    pub async fn list_lists(&self, site_id: &str) -> Result<Vec<SiteList>> {
        self.get_collection(self.endpoints.url_for(GraphRequest::Lists { site_id }))
            .await
    }

    /// List the items of one list.
    pub async fn list_items(&self, site_id: &str, list_id: &str) -> Result<Vec<ListItem>> {
        self.get_collection(
            self.endpoints
                .url_for(GraphRequest::ListItems { site_id, list_id }),
        )
        .await
    }

    /// Resolve a list item to its drive item, kept as raw JSON for the normalizer.
    ///
    /// A `null` body resolves to `None`.
    pub async fn get_drive_item(
        &self,
        site_id: &str,
        list_id: &str,
        item_id: &str,
    ) -> Result<Option<Value>> {
        let url = self.endpoints.url_for(GraphRequest::DriveItem {
            site_id,
            list_id,
            item_id,
        });
        let response = self.http.get(url).await?;
        if response.status() != StatusCode::OK {
            return Err(api_error(response).await);
        }

        let item: Value = response.json().await?;
        Ok(Some(item).filter(|item| !item.is_null()))
    }

    /// Start downloading a drive item's content.
    ///
    /// The response is returned as is; the caller checks the status and
    /// streams the body.
    pub async fn download(&self, drive_id: &str, item_id: &str) -> Result<Response> {
        self.http
            .get(self.endpoints.url_for(GraphRequest::Content { drive_id, item_id }))
            .await
    }

    /// GET a collection, following `@odata.nextLink` until the last page.
    ///
    /// Only a failure on the first page is an error. A later page that fails,
    /// or a next link that leaves the API origin or revisits a page, ends the
    /// walk with the items collected so far. Lost sign-in always propagates.
    async fn get_collection<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut all: Vec<T> = Vec::new();
        let mut visited: HashSet<Url> = HashSet::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            debug!(%url, page = visited.len() + 1, "fetching collection page");
            let page: Collection<T> = match self.get_page(url.clone()).await {
                Ok(page) => page,
                Err(e) if visited.is_empty() || e.requires_interaction() => return Err(e),
                Err(error) => {
                    warn!(%url, %error, kept = all.len(), "collection page failed, keeping earlier pages");
                    break;
                }
            };
            all.extend(page.value);
            visited.insert(url);

            next = match page.next_link.as_deref().map(Url::parse) {
                None => None,
                Some(Err(error)) => {
                    warn!(%error, "unparseable next link, stopping pagination");
                    None
                }
                Some(Ok(link)) if !self.endpoints.same_origin(&link) => {
                    warn!(url = %link, "next link leaves the API origin, not followed");
                    None
                }
                Some(Ok(link)) if visited.contains(&link) => {
                    warn!(url = %link, "next link revisits a page, stopping pagination");
                    None
                }
                Some(Ok(link)) => Some(link),
            };
        }

        Ok(all)
    }

    async fn get_page<T: DeserializeOwned>(&self, url: Url) -> Result<Collection<T>> {
        let response = self.http.get(url).await?;
        if response.status() != StatusCode::OK {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }
}
