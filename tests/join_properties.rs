//! Property tests for the location/block join

use geolite_ranges::join::{join_datasets, GeoRangeEntry};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Block {
    network: String,
    geoname_id: Option<u8>,
    registered: Option<u8>,
}

fn location_strategy() -> impl Strategy<Value = Vec<(u8, Option<String>)>> {
    prop::collection::vec((0u8..16, prop::option::of("[A-Z]{2}")), 0..16)
}

fn block_strategy() -> impl Strategy<Value = Vec<Block>> {
    prop::collection::vec(
        (
            "[0-9a-f:./]{1,12}",
            prop::option::of(0u8..24),
            prop::option::of(0u8..24),
        )
            .prop_map(|(network, geoname_id, registered)| Block {
                network,
                geoname_id,
                registered,
            }),
        0..32,
    )
}

fn locations_csv(rows: &[(u8, Option<String>)]) -> String {
    let mut csv = String::from("geoname_id,country_iso_code\n");
    for (id, code) in rows {
        csv.push_str(&format!("{},{}\n", id, code.as_deref().unwrap_or("")));
    }
    csv
}

fn blocks_csv(rows: &[Block]) -> String {
    let mut csv = String::from("network,geoname_id,registered_country_geoname_id\n");
    for row in rows {
        let id = row.geoname_id.map(|v| v.to_string()).unwrap_or_default();
        let registered = row.registered.map(|v| v.to_string()).unwrap_or_default();
        csv.push_str(&format!("{},{},{}\n", row.network, id, registered));
    }
    csv
}

/// Straightforward reference: last-wins map, primary id else fallback
fn expected(locations: &[(u8, Option<String>)], v4: &[Block], v6: &[Block]) -> Vec<GeoRangeEntry> {
    let mut map = HashMap::new();
    for (id, code) in locations {
        if let Some(code) = code {
            map.insert(*id, code.clone());
        }
    }
    v4.iter()
        .chain(v6.iter())
        .filter_map(|b| {
            let id = b.geoname_id.or(b.registered)?;
            map.get(&id).map(|c| GeoRangeEntry::new(b.network.clone(), c.clone()))
        })
        .collect()
}

proptest! {
    #[test]
    fn join_matches_reference(
        locations in location_strategy(),
        v4 in block_strategy(),
        v6 in block_strategy(),
    ) {
        let output = join_datasets(
            locations_csv(&locations).as_bytes(),
            blocks_csv(&v4).as_bytes(),
            blocks_csv(&v6).as_bytes(),
        ).unwrap();

        prop_assert_eq!(&output.entries, &expected(&locations, &v4, &v6));
    }

    #[test]
    fn counts_are_consistent(
        locations in location_strategy(),
        v4 in block_strategy(),
        v6 in block_strategy(),
    ) {
        let output = join_datasets(
            locations_csv(&locations).as_bytes(),
            blocks_csv(&v4).as_bytes(),
            blocks_csv(&v6).as_bytes(),
        ).unwrap();

        let total = v4.len() + v6.len();
        prop_assert_eq!(output.total_rows(), total);
        prop_assert!(output.entries.len() <= total);
        prop_assert_eq!(output.entries.len(), output.ipv4.resolved + output.ipv6.resolved);
        prop_assert_eq!(output.ipv4.resolved + output.ipv4.skipped, v4.len());
        prop_assert_eq!(output.ipv6.resolved + output.ipv6.skipped, v6.len());
        prop_assert_eq!(output.entries.len() == total, output.ipv4.skipped + output.ipv6.skipped == 0);
    }

    #[test]
    fn ipv4_entries_come_first(
        locations in location_strategy(),
        v4 in block_strategy(),
        v6 in block_strategy(),
    ) {
        let output = join_datasets(
            locations_csv(&locations).as_bytes(),
            blocks_csv(&v4).as_bytes(),
            blocks_csv(&v6).as_bytes(),
        ).unwrap();

        let split = output.ipv4.resolved;
        let v4_networks: Vec<&str> = output.entries[..split].iter().map(|e| e.network.as_str()).collect();
        let v4_source: Vec<&str> = v4.iter().map(|b| b.network.as_str()).collect();

        // Resolved IPv4 networks form a subsequence of the source rows, in order.
        let mut source = v4_source.iter();
        for network in &v4_networks {
            prop_assert!(source.any(|s| s == network));
        }
    }
}
