//! Snapshot Writer: the crawl result as one indented JSON array.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::fs;
use tracing::info;

use crate::error::Result;
use crate::record::DocumentRecord;

/// Serialize records with 4-space indentation.
pub fn to_json(records: &[DocumentRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write the snapshot, replacing any previous one.
///
/// The JSON goes to a sibling `.tmp` file first and is then renamed over the
/// target, so an interrupted write leaves the previous snapshot intact.
pub async fn write_snapshot<P: AsRef<Path>>(path: P, records: &[DocumentRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    fs::write(&tmp, to_json(records)?).await?;
    fs::rename(&tmp, path).await?;

    info!(path = %path.display(), count = records.len(), "snapshot written");
    Ok(())
}

/// Read a snapshot back.
pub async fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentRecord>> {
    let content = fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}
