//! Site Walker: sites, their direct subsites, document libraries, items.
//!
//! Every call is awaited in turn. Failures below the site list are logged and
//! the affected branch skipped; only a lost sign-in aborts the walk.

use tracing::{error, info, warn};

use crate::client::SharePointClient;
use crate::error::Result;
use crate::extraction::ContentExtractor;
use crate::models::{ListItem, Site, SiteList};
use crate::record::DocumentRecord;

/// Log and replace a non-fatal error with an empty value.
fn skip_on_error<T: Default>(result: Result<T>, what: &str) -> Result<T> {
    match result {
        Err(e) if e.requires_interaction() => Err(e),
        Err(e) => {
            warn!(error = %e, "{}, skipping", what);
            Ok(T::default())
        }
        ok => ok,
    }
}

/// Walks the site hierarchy and collects document records.
pub struct SiteWalker {
    client: SharePointClient,
    content: ContentExtractor,
}

impl SiteWalker {
    pub fn new(client: SharePointClient, content: ContentExtractor) -> Self {
        Self { client, content }
    }

    /// Walk every site and its direct subsites.
    ///
    /// Subsites of subsites are not visited.
    pub async fn crawl(&self) -> Result<Vec<DocumentRecord>> {
        let sites = match self.client.list_sites().await {
            Ok(sites) => sites,
            Err(e) if e.requires_interaction() => return Err(e),
            Err(e) => {
                error!(error = %e, "unable to find sharepoint sites");
                return Ok(Vec::new());
            }
        };

        self.content.prepare().await?;

        let mut records = Vec::new();
        for site in &sites {
            info!(site = %site.display_name, "fetching data from site");
            records.extend(self.process_site(site).await?);

            if site.id.is_empty() {
                continue;
            }
            let subsites = skip_on_error(
                self.client.list_subsites(&site.id).await,
                "unable to list subsites",
            )?;
            for subsite in &subsites {
                info!(site = %subsite.display_name, "fetching data from subsite");
                records.extend(self.process_site(subsite).await?);
            }
        }

        info!(count = records.len(), "total files extracted");
        Ok(records)
    }

    /// Collect the records of one site's document libraries.
    pub async fn process_site(&self, site: &Site) -> Result<Vec<DocumentRecord>> {
        if site.id.is_empty() {
            warn!(site = %site.display_name, "site without id, skipping");
            return Ok(Vec::new());
        }

        let lists = skip_on_error(
            self.client.list_lists(&site.id).await,
            "unable to list site lists",
        )?;

        let mut records = Vec::new();
        for list in lists.iter().filter(|list| list.is_document_library()) {
            records.extend(self.process_library(site, list).await?);
        }
        Ok(records)
    }

    async fn process_library(&self, site: &Site, list: &SiteList) -> Result<Vec<DocumentRecord>> {
        let items = skip_on_error(
            self.client.list_items(&site.id, &list.id).await,
            "unable to list library items",
        )?;

        let mut records = Vec::new();
        for item in items.iter().filter(|item| !item.is_reserved()) {
            if let Some(record) = self.process_item(site, list, item).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn process_item(
        &self,
        site: &Site,
        list: &SiteList,
        item: &ListItem,
    ) -> Result<Option<DocumentRecord>> {
        let drive_item = skip_on_error(
            self.client
                .get_drive_item(&site.id, &list.id, &item.id)
                .await,
            "unable to resolve drive item",
        )?;
        let Some(drive_item) = drive_item else {
            return Ok(None);
        };

        let record = DocumentRecord::from_drive_item(&drive_item);
        if !record.is_extractable() {
            return Ok(None);
        }

        let outcome = self.content.extract(&record).await?;
        Ok(Some(record.with_extraction(outcome).with_site(site)))
    }
}
