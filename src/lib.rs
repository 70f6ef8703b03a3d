//! GeoLite2 Ranges - Flat CIDR-to-country data from GeoLite2 Country CSV
//!
//! MaxMind's GeoLite2 Country CSV edition splits its data across a locations
//! file and two block files (IPv4, IPv6) linked by `geoname_id`. This crate
//! joins them into a single pre-resolved list of `(CIDR, ISO country code)`
//! pairs and writes it as a small text file that an in-memory resolver can
//! load without knowing anything about the GeoLite2 layout.
//!
//! # Quick Start
//!
//! ```rust
//! use geolite_ranges::join::join_datasets;
//!
//! let locations = "geoname_id,country_iso_code\n1,US\n2,\n";
//! let ipv4 = "network,geoname_id,registered_country_geoname_id\n1.2.3.0/24,1,\n5.6.7.0/24,2,\n";
//! let ipv6 = "network,geoname_id,registered_country_geoname_id\n::1/128,,1\n";
//!
//! let output = join_datasets(locations.as_bytes(), ipv4.as_bytes(), ipv6.as_bytes())?;
//! assert_eq!(output.entries.len(), 2);
//! assert_eq!(output.entries[0].network, "1.2.3.0/24");
//! assert_eq!(output.entries[1].country_code, "US");
//! # Ok::<(), geolite_ranges::GeoliteError>(())
//! ```
//!
//! # Pipeline
//!
//! ```text
//! ┌───────────────┐    ┌────────────────┐    ┌───────────────┐
//! │ ArchiveSource │───►│ GeoLiteArchive │───►│ write_ranges  │
//! │ (download or  │    │ locations +    │    │ header + rows │
//! │  local zip)   │    │ IPv4 + IPv6    │    │ atomic rename │
//! └───────────────┘    └────────────────┘    └───────────────┘
//! ```
//!
//! See [`pipeline::run_update`] for the whole thing in one call.

#![warn(clippy::all)]

/// Archive layout and data directory discovery
pub mod archive;
/// Credentials and run settings
pub mod config;
/// Error types for updater operations
pub mod error;
/// Archive retrieval
pub mod fetch;
pub mod join;
pub mod output;
pub mod pipeline;

pub use crate::archive::GeoLiteArchive;
pub use crate::config::{Credentials, UpdateConfig};
pub use crate::error::{GeoliteError, Result};
pub use crate::fetch::{ArchiveSource, LocalArchive, MaxMindDownloader};
pub use crate::join::{join_datasets, GeoRangeEntry, JoinOutput, LocationLookup};
pub use crate::pipeline::{run_update, UpdateSummary};
