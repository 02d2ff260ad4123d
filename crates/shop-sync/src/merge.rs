//! # Snapshot Merge
//!
//! Folding an authoritative push into the local view.
//!
//! ```text
//! previous ─┐
//!           ├─► merge_snapshot ─► next
//! incoming ─┘
//!
//!   stats             incoming if present, else previous (carry-over)
//!   vehicleOwnership  incoming, or {} when absent
//!   everything else   incoming, verbatim
//! ```
//!
//! Pushes are not versioned; the last one applied wins.

use std::collections::BTreeMap;

use shop_core::{Delivery, ShopSnapshot};
use tracing::debug;

/// Merges a pushed snapshot into the previous local one.
pub fn merge_snapshot(previous: Option<&ShopSnapshot>, mut incoming: ShopSnapshot) -> ShopSnapshot {
    if incoming.stats.is_none() {
        if let Some(stats) = previous.and_then(|prev| prev.stats.as_ref()) {
            debug!(shop = %incoming.identifier, "Carrying statistics over from previous snapshot");
            incoming.stats = Some(stats.clone());
        }
    }
    if incoming.vehicle_ownership.is_none() {
        incoming.vehicle_ownership = Some(BTreeMap::new());
    }
    incoming
}

/// Replaces the delivery list of a loaded snapshot.
///
/// Returns false, changing nothing, when no snapshot is loaded.
pub fn apply_deliveries(snapshot: Option<&mut ShopSnapshot>, deliveries: Vec<Delivery>) -> bool {
    match snapshot {
        Some(shop) => {
            debug!(shop = %shop.identifier, count = deliveries.len(), "Deliveries replaced");
            shop.deliveries = deliveries;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> ShopSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_stats_carry_over() {
        let previous = snapshot(json!({
            "identifier": "corner",
            "stats": { "labels": ["Mon"], "sales": [100] }
        }));
        let incoming = snapshot(json!({ "identifier": "corner", "balance": 500 }));

        let merged = merge_snapshot(Some(&previous), incoming);
        assert_eq!(merged.stats, previous.stats);
        assert_eq!(merged.balance.units(), 500);
    }

    #[test]
    fn test_incoming_stats_win() {
        let previous = snapshot(json!({
            "identifier": "corner",
            "stats": { "labels": ["Mon"], "sales": [100] }
        }));
        let incoming = snapshot(json!({
            "identifier": "corner",
            "stats": { "labels": ["Tue"], "sales": [7] }
        }));
        let expected = incoming.stats.clone();

        assert_eq!(merge_snapshot(Some(&previous), incoming).stats, expected);
    }

    #[test]
    fn test_ownership_defaults_to_empty() {
        let merged = merge_snapshot(None, snapshot(json!({ "identifier": "corner" })));
        assert_eq!(merged.vehicle_ownership, Some(BTreeMap::new()));
        assert!(merged.stats.is_none());

        let merged = merge_snapshot(
            None,
            snapshot(json!({
                "identifier": "corner",
                "vehicleOwnership": { "speedo": { "unlocked": true } }
            })),
        );
        assert!(merged.ownership("speedo").unwrap().unlocked);
    }

    #[test]
    fn test_other_fields_are_verbatim() {
        let previous = snapshot(json!({ "identifier": "corner", "level": 4, "discount": 10 }));
        let incoming = snapshot(json!({ "identifier": "corner", "level": 2 }));
        let merged = merge_snapshot(Some(&previous), incoming);
        assert_eq!(merged.level, 2);
        assert_eq!(merged.discount, 0);
    }

    #[test]
    fn test_deliveries_need_a_loaded_shop() {
        let delivery: Delivery =
            serde_json::from_value(json!({ "identifier": "d-1", "status": "pending" })).unwrap();

        assert!(!apply_deliveries(None, vec![delivery.clone()]));

        let mut shop = snapshot(json!({ "identifier": "corner" }));
        assert!(apply_deliveries(Some(&mut shop), vec![delivery]));
        assert_eq!(shop.deliveries.len(), 1);
    }
}
