//! ID prefix constants.
//!
//! IDs are generated by the store as `{prefix}-{8 hex chars}`, e.g. `ses-a3f8b2c1`.

pub const PREFIX_SESSION: &str = "ses";
pub const PREFIX_CONTACT: &str = "cnt";
pub const PREFIX_PLACE: &str = "plc";
pub const PREFIX_EVENT: &str = "evt";

/// Every prefix the store hands out.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_SESSION, PREFIX_CONTACT, PREFIX_PLACE, PREFIX_EVENT];

/// Prefix used for places that come from the public geodata service rather
/// than from a user. Full form: `osm-{element type}-{element id}`.
pub const PREFIX_OSM_PLACE: &str = "osm";

/// Build the place ID for a geodata element.
#[must_use]
pub fn osm_place_id(element_type: &str, element_id: u64) -> String {
    format!("{PREFIX_OSM_PLACE}-{element_type}-{element_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for prefix in ALL_PREFIXES {
            assert!(seen.insert(*prefix), "duplicate prefix {prefix}");
        }
        assert!(!seen.contains(PREFIX_OSM_PLACE));
    }

    #[test]
    fn osm_place_id_format() {
        assert_eq!(osm_place_id("node", 42), "osm-node-42");
    }
}
