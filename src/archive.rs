//! GeoLite2 Country CSV archive layout
//!
//! MaxMind ships the CSV edition as a zip whose single top-level directory is
//! named after the release date (`GeoLite2-Country-CSV_20240102/...`), so the
//! directory is discovered rather than hard-coded: the first entry whose path
//! ends with the locations filename wins, and its parent is used for the two
//! block files.
//!
//! An archive with several locations files is ambiguous. Central-directory
//! order decides which one is used; a warning is logged but nothing else is
//! done to resolve it.

use crate::error::{GeoliteError, Result};
use crate::join::{IpFamily, JoinOutput, LocationLookup, RangeJoin};
use std::io::{Cursor, Read};
use tracing::{info, warn};
use zip::ZipArchive;

/// English locations dataset
pub const LOCATIONS_FILENAME: &str = "GeoLite2-Country-Locations-en.csv";

/// IPv4 blocks dataset
pub const IPV4_BLOCKS_FILENAME: &str = "GeoLite2-Country-Blocks-IPv4.csv";

/// IPv6 blocks dataset
pub const IPV6_BLOCKS_FILENAME: &str = "GeoLite2-Country-Blocks-IPv6.csv";

/// In-memory view of a downloaded archive
pub struct GeoLiteArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    data_dir: String,
}

impl GeoLiteArchive {
    /// Open archive bytes and locate the data directory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes))?;
        let data_dir = locate_data_dir(zip.file_names())?;
        info!("Found data directory inside zip: '{}'", data_dir);
        Ok(Self { zip, data_dir })
    }

    /// Parent path of the locations file, empty for a flat archive
    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    /// Full entry path of a dataset inside the archive
    pub fn member_path(&self, filename: &str) -> String {
        if self.data_dir.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", self.data_dir, filename)
        }
    }

    /// Open one dataset for reading
    pub fn member(&mut self, filename: &str) -> Result<impl Read + '_> {
        let path = self.member_path(filename);
        match self.zip.by_name(&path) {
            Ok(file) => Ok(file),
            Err(zip::result::ZipError::FileNotFound) => Err(GeoliteError::Format(format!(
                "Could not find '{}' in the zip archive.",
                path
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Run the join over locations, IPv4 blocks and IPv6 blocks, in that order
    ///
    /// Same steps as [`join_datasets`](crate::join::join_datasets), spelled
    /// out because each member reader borrows the archive mutably: only one
    /// can be open at a time, so the three cannot be handed over together.
    pub fn join(&mut self) -> Result<JoinOutput> {
        info!("Reading country locations...");
        let lookup = LocationLookup::from_reader(self.member(LOCATIONS_FILENAME)?)?;

        let mut join = RangeJoin::new(&lookup);

        info!("Reading IPv4 blocks...");
        join.extend_from_reader(IpFamily::V4, self.member(IPV4_BLOCKS_FILENAME)?)?;

        info!("Reading IPv6 blocks...");
        join.extend_from_reader(IpFamily::V6, self.member(IPV6_BLOCKS_FILENAME)?)?;

        Ok(join.finish())
    }
}

/// Find the directory holding the locations file among archive entry names
pub fn locate_data_dir<'a, I>(names: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matches = names
        .into_iter()
        .filter(|name| name.ends_with(LOCATIONS_FILENAME));

    let first = matches.next().ok_or_else(|| {
        GeoliteError::Format(format!(
            "Could not find '{}' in the zip archive.",
            LOCATIONS_FILENAME
        ))
    })?;

    let extra = matches.count();
    if extra > 0 {
        warn!(
            "{} entries end with '{}', using '{}'",
            extra + 1,
            LOCATIONS_FILENAME,
            first
        );
    }

    let dir = &first[..first.len() - LOCATIONS_FILENAME.len()];
    Ok(dir.trim_end_matches('/').to_string())
}
