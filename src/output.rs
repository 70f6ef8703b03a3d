//! Range file writer
//!
//! Output layout consumed by the resolver:
//!
//! ```text
//! # Geofence Validator - IP Range Data
//! # Automatically generated by scripts/update_geolite_data.py
//! # Last updated on: 2024-01-02
//! # Data sourced from the GeoLite2 database created by MaxMind, available from https://www.maxmind.com
//! # Format: CIDR,ISO_COUNTRY_CODE
//! 1.0.0.0/24,AU
//! ...
//! ```

use crate::error::{GeoliteError, Result};
use crate::join::GeoRangeEntry;
use chrono::NaiveDate;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Date format used in the `Last updated on` line
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed comment header lines
pub fn header_lines(date: NaiveDate) -> [String; 5] {
    [
        "# Geofence Validator - IP Range Data".to_string(),
        "# Automatically generated by scripts/update_geolite_data.py".to_string(),
        format!("# Last updated on: {}", date.format(DATE_FORMAT)),
        "# Data sourced from the GeoLite2 database created by MaxMind, available from https://www.maxmind.com".to_string(),
        "# Format: CIDR,ISO_COUNTRY_CODE".to_string(),
    ]
}

/// Serialize header and entries to any writer
pub fn render<W: Write>(mut writer: W, entries: &[GeoRangeEntry], date: NaiveDate) -> Result<()> {
    for line in header_lines(date) {
        writeln!(writer, "{}", line)?;
    }

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for entry in entries {
        csv_writer.write_record([entry.network.as_str(), entry.country_code.as_str()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Replace the file at `path` with the rendered entries
///
/// The parent directory is created if needed. Content goes to a temporary file
/// next to the destination and is renamed over it only once fully written, so
/// a failed run leaves any previous file untouched.
pub fn write_ranges(path: &Path, entries: &[GeoRangeEntry], date: NaiveDate) -> Result<()> {
    info!("Writing {} records to {}...", entries.len(), path.display());

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| {
        GeoliteError::Io(format!("Failed to create {}: {}", parent.display(), e))
    })?;

    let mut temp = NamedTempFile::new_in(parent)?;
    {
        let mut buffered = BufWriter::new(temp.as_file_mut());
        render(&mut buffered, entries, date)?;
        buffered.flush()?;
    }
    temp.as_file().sync_all()?;

    // Temp files are created 0600; the range file is shared data.
    #[cfg(unix)]
    temp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))?;

    temp.persist(path).map_err(|e| {
        GeoliteError::Io(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    info!("Output file written successfully.");
    Ok(())
}
