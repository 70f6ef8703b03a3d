//! Location/block join
//!
//! GeoLite2 ships country data split across an ID-indirected table layout:
//! block files map CIDR ranges to a `geoname_id`, and a separate locations
//! file maps each `geoname_id` to a country. This module flattens that into
//! a single ordered list of `(network, country_code)` pairs.
//!
//! The join is a single-pass hash join. The lookup is built once from the
//! locations file, then each block row probes it exactly once. Rows whose id
//! does not resolve are counted and skipped; GeoLite2 intentionally contains
//! ranges (anonymous proxies, reserved space) that map to no country.
//!
//! ```text
//! locations.csv ──► LocationLookup ──┐
//!                                    ├──► [GeoRangeEntry] (IPv4 rows, then IPv6 rows)
//! blocks-ipv4.csv ──► probe ─────────┤
//! blocks-ipv6.csv ──► probe ─────────┘
//! ```

use crate::error::{GeoliteError, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use tracing::{debug, info};

/// CSV reader for a GeoLite2 dataset
///
/// Rows may be shorter or longer than the header: absent columns deserialize
/// as `None`, surplus fields are ignored.
fn dataset_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

/// One row of the locations dataset
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub geoname_id: String,
    #[serde(default)]
    pub country_iso_code: Option<String>,
}

/// One row of an IPv4 or IPv6 blocks dataset
#[derive(Debug, Clone, Deserialize)]
pub struct RangeBlockRecord {
    /// CIDR range, passed through verbatim
    pub network: String,
    #[serde(default)]
    pub geoname_id: Option<String>,
    #[serde(default)]
    pub registered_country_geoname_id: Option<String>,
}

impl RangeBlockRecord {
    /// The id this row resolves through
    pub fn location_id(&self) -> Option<&str> {
        resolve_id(
            self.geoname_id.as_deref(),
            self.registered_country_geoname_id.as_deref(),
        )
    }
}

/// Pick the id used for resolution: the row's own location, else its
/// registered country. Empty strings count as absent.
pub fn resolve_id<'a>(geoname_id: Option<&'a str>, registered: Option<&'a str>) -> Option<&'a str> {
    geoname_id
        .filter(|id| !id.is_empty())
        .or_else(|| registered.filter(|id| !id.is_empty()))
}

/// `geoname_id` → ISO country code
///
/// Only locations that carry a country code are present. A location with an
/// empty code gets no entry at all, so block rows pointing at it are
/// unresolvable rather than resolving to an empty code.
#[derive(Debug, Clone, Default)]
pub struct LocationLookup {
    countries: FxHashMap<String, String>,
}

impl LocationLookup {
    /// Build the lookup from a locations CSV stream (header row required)
    ///
    /// Short rows are accepted; missing trailing columns read as absent.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = dataset_reader(reader);
        let mut lookup = Self::default();

        for result in csv_reader.deserialize::<LocationRecord>() {
            let record = result?;
            lookup.insert(record);
        }

        info!("Mapped {} geoname_ids to country codes.", lookup.len());
        Ok(lookup)
    }

    /// Add one location row; a duplicate id replaces the earlier code
    pub fn insert(&mut self, record: LocationRecord) {
        match record.country_iso_code {
            Some(code) if !code.is_empty() => {
                self.countries.insert(record.geoname_id, code);
            }
            _ => {}
        }
    }

    pub fn get(&self, geoname_id: &str) -> Option<&str> {
        self.countries.get(geoname_id).map(String::as_str)
    }

    pub fn contains(&self, geoname_id: &str) -> bool {
        self.countries.contains_key(geoname_id)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl FromIterator<LocationRecord> for LocationLookup {
    fn from_iter<I: IntoIterator<Item = LocationRecord>>(iter: I) -> Self {
        let mut lookup = Self::default();
        for record in iter {
            lookup.insert(record);
        }
        lookup
    }
}

/// Address family of a blocks dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IpFamily {
    V4,
    V6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// A resolved output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRangeEntry {
    pub network: String,
    pub country_code: String,
}

impl GeoRangeEntry {
    pub fn new(network: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            country_code: country_code.into(),
        }
    }
}

/// Per-family row counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyStats {
    /// Data rows read (header excluded)
    pub rows: usize,
    /// Rows that produced an entry
    pub resolved: usize,
    /// Rows dropped because neither id resolved
    pub skipped: usize,
}

/// Result of a complete join
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinOutput {
    /// Entries in encounter order, IPv4 first
    pub entries: Vec<GeoRangeEntry>,
    pub ipv4: FamilyStats,
    pub ipv6: FamilyStats,
    /// Number of ids in the location lookup
    pub locations: usize,
}

impl JoinOutput {
    /// Total block rows read across both families
    pub fn total_rows(&self) -> usize {
        self.ipv4.rows + self.ipv6.rows
    }
}

/// Accumulates entries by probing block datasets against a [`LocationLookup`]
///
/// Families must be appended IPv4 first; the output order is the append order.
pub struct RangeJoin<'a> {
    lookup: &'a LocationLookup,
    entries: Vec<GeoRangeEntry>,
    ipv4: FamilyStats,
    ipv6: FamilyStats,
    last_family: Option<IpFamily>,
}

impl<'a> RangeJoin<'a> {
    pub fn new(lookup: &'a LocationLookup) -> Self {
        Self {
            lookup,
            entries: Vec::new(),
            ipv4: FamilyStats::default(),
            ipv6: FamilyStats::default(),
            last_family: None,
        }
    }

    /// Resolve one block row, appending an entry if its id is known
    ///
    /// Returns whether the row resolved.
    pub fn push(&mut self, family: IpFamily, record: RangeBlockRecord) -> Result<bool> {
        self.check_order(family)?;

        let country = record
            .location_id()
            .and_then(|id| self.lookup.get(id))
            .map(str::to_string);

        let stats = match family {
            IpFamily::V4 => &mut self.ipv4,
            IpFamily::V6 => &mut self.ipv6,
        };
        stats.rows += 1;

        match country {
            Some(country_code) => {
                stats.resolved += 1;
                self.entries.push(GeoRangeEntry {
                    network: record.network,
                    country_code,
                });
                Ok(true)
            }
            None => {
                stats.skipped += 1;
                Ok(false)
            }
        }
    }

    /// Stream a blocks CSV through the join
    pub fn extend_from_reader<R: Read>(&mut self, family: IpFamily, reader: R) -> Result<FamilyStats> {
        self.check_order(family)?;

        let mut csv_reader = dataset_reader(reader);
        for result in csv_reader.deserialize::<RangeBlockRecord>() {
            let record = result?;
            self.push(family, record)?;
        }

        let stats = self.stats(family);
        if stats.skipped > 0 {
            debug!(
                family = %family,
                skipped = stats.skipped,
                "block rows without a resolvable country"
            );
        }
        info!("Processed {} {} ranges.", stats.resolved, family);
        Ok(stats)
    }

    pub fn stats(&self, family: IpFamily) -> FamilyStats {
        match family {
            IpFamily::V4 => self.ipv4,
            IpFamily::V6 => self.ipv6,
        }
    }

    pub fn finish(self) -> JoinOutput {
        JoinOutput {
            entries: self.entries,
            ipv4: self.ipv4,
            ipv6: self.ipv6,
            locations: self.lookup.len(),
        }
    }

    fn check_order(&mut self, family: IpFamily) -> Result<()> {
        match self.last_family {
            Some(last) if family < last => Err(GeoliteError::Format(format!(
                "{} blocks cannot follow {} blocks",
                family, last
            ))),
            _ => {
                self.last_family = Some(family);
                Ok(())
            }
        }
    }
}

/// Join the three datasets, read in the fixed order locations, IPv4, IPv6
pub fn join_datasets<L, V4, V6>(locations: L, ipv4: V4, ipv6: V6) -> Result<JoinOutput>
where
    L: Read,
    V4: Read,
    V6: Read,
{
    let lookup = LocationLookup::from_reader(locations)?;

    let mut join = RangeJoin::new(&lookup);
    join.extend_from_reader(IpFamily::V4, ipv4)?;
    join.extend_from_reader(IpFamily::V6, ipv6)?;
    Ok(join.finish())
}
