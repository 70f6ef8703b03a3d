//! End-to-end update: fetch → join → write
//!
//! Strictly sequential. Every failure is fatal and surfaces before the output
//! file is touched.

use crate::archive::GeoLiteArchive;
use crate::error::Result;
use crate::fetch::ArchiveSource;
use crate::join::FamilyStats;
use crate::output::write_ranges;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

/// What an update run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    pub output_path: PathBuf,
    /// Rows written after the header
    pub entries: usize,
    pub ipv4: FamilyStats,
    pub ipv6: FamilyStats,
    /// Location ids with a country code
    pub locations: usize,
}

/// Fetch the archive from `source`, flatten it, and replace `output_path`
pub fn run_update(
    source: &dyn ArchiveSource,
    output_path: &Path,
    date: NaiveDate,
) -> Result<UpdateSummary> {
    info!("Fetching archive from {}", source.describe());
    let bytes = source.fetch()?;

    info!("Processing zip file in memory...");
    let mut archive = GeoLiteArchive::from_bytes(bytes)?;
    let joined = archive.join()?;
    info!(
        "Processing complete. Found a total of {} IP ranges.",
        joined.entries.len()
    );

    write_ranges(output_path, &joined.entries, date)?;

    Ok(UpdateSummary {
        output_path: output_path.to_path_buf(),
        entries: joined.entries.len(),
        ipv4: joined.ipv4,
        ipv6: joined.ipv6,
        locations: joined.locations,
    })
}

/// Today's date in local time, as stamped into the header
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
