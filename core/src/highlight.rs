use std::collections::HashSet;

use crate::cells::CellBuffer;
use crate::color;
use crate::record::ParcelRecord;

/// Handle for one highlight request. Obtained from [`Highlighter::begin_request`]
/// before kicking off the (asynchronous) account-asset lookup, and presented
/// back with the result. Only the most recently issued token is honored, so
/// out-of-order resolutions can never overwrite a newer query's overlay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Applies account-match highlights to the cell buffer's overlay layer.
/// Tracks the currently lit slots so a refresh clears exactly what it lit,
/// and a monotonic request counter for last-write-wins across async queries.
#[derive(Debug, Default)]
pub struct Highlighter {
    issued: u64,
    active: Vec<usize>,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new highlight query, invalidating all earlier ones.
    pub fn begin_request(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Apply the result of a highlight query: clear every currently active
    /// overlay slot, then light the slot of each parcel whose id matches a
    /// numeric asset identifier in `match_ids`. An empty set is a pure clear
    /// (which is also how an upstream fetch failure degrades).
    ///
    /// Returns `false` without touching any state when `token` is stale.
    /// Idempotent for a given id set.
    pub fn apply(
        &mut self,
        token: RequestToken,
        cells: &mut CellBuffer,
        parcels: &[ParcelRecord],
        match_ids: &HashSet<u64>,
    ) -> bool {
        if token.0 != self.issued {
            return false;
        }

        for slot in self.active.drain(..) {
            cells.set_overlay(slot, None);
        }

        if !match_ids.is_empty() {
            for parcel in parcels {
                let Some(slot) = parcel.slot else {
                    continue;
                };
                let Ok(asset_id) = parcel.id.parse::<u64>() else {
                    continue;
                };
                if match_ids.contains(&asset_id) {
                    cells.set_overlay(slot, Some(color::HIGHLIGHT));
                    self.active.push(slot);
                }
            }
        }

        true
    }

    /// Number of slots currently lit.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::Highlighter;
    use crate::cells::CellBuffer;
    use crate::color;
    use crate::grid::GridGeometry;
    use crate::record::{GroupRegistry, ParcelRecord};
    use crate::spatial::SpatialIndex;

    fn parcel(id: &str, col: u32, row: u32) -> ParcelRecord {
        ParcelRecord {
            id: id.to_string(),
            col,
            row,
            group_id: "R1".to_string(),
            raw_fields: Vec::new(),
            slot: None,
        }
    }

    fn build(parcels: &mut Vec<ParcelRecord>) -> CellBuffer {
        let geometry = GridGeometry::new(100, 100, 1.0);
        let (index, _) = SpatialIndex::build(parcels, &geometry);
        CellBuffer::build(geometry, parcels, &index, &GroupRegistry::new())
    }

    fn ids(values: &[u64]) -> HashSet<u64> {
        values.iter().copied().collect()
    }

    #[test]
    fn lights_matching_slot_and_nothing_else() {
        // Scenario D: parcel id "7" at slot 42.
        let mut parcels = vec![parcel("7", 42, 0), parcel("8", 10, 3)];
        let mut cells = build(&mut parcels);
        let mut hl = Highlighter::new();

        let token = hl.begin_request();
        assert!(hl.apply(token, &mut cells, &parcels, &ids(&[7])));

        assert_eq!(cells.overlay(42), Some(color::HIGHLIGHT));
        for slot in 0..cells.len() {
            if slot != 42 {
                assert_eq!(cells.overlay(slot), None);
            }
        }
    }

    #[test]
    fn reapplying_same_set_is_idempotent() {
        let mut parcels = vec![parcel("7", 42, 0), parcel("9", 1, 1)];
        let mut cells = build(&mut parcels);
        let mut hl = Highlighter::new();

        let token = hl.begin_request();
        hl.apply(token, &mut cells, &parcels, &ids(&[7, 9]));
        let token = hl.begin_request();
        hl.apply(token, &mut cells, &parcels, &ids(&[7, 9]));

        assert_eq!(hl.active_count(), 2);
        assert_eq!(cells.overlay(42), Some(color::HIGHLIGHT));
        assert_eq!(cells.overlay(101), Some(color::HIGHLIGHT));
    }

    #[test]
    fn empty_set_clears_all_previous_highlights() {
        let mut parcels = vec![parcel("7", 42, 0), parcel("9", 1, 1)];
        let mut cells = build(&mut parcels);
        let mut hl = Highlighter::new();

        let token = hl.begin_request();
        hl.apply(token, &mut cells, &parcels, &ids(&[7, 9]));
        let token = hl.begin_request();
        hl.apply(token, &mut cells, &parcels, &HashSet::new());

        assert_eq!(hl.active_count(), 0);
        for slot in 0..cells.len() {
            assert_eq!(cells.overlay(slot), None);
        }
    }

    #[test]
    fn highlight_never_touches_base_colors() {
        let mut parcels = vec![parcel("7", 42, 0)];
        let mut cells = build(&mut parcels);
        let base_before: Vec<_> = (0..cells.len()).map(|s| cells.base_color(s)).collect();
        let mut hl = Highlighter::new();

        let token = hl.begin_request();
        hl.apply(token, &mut cells, &parcels, &ids(&[7]));

        for slot in 0..cells.len() {
            assert_eq!(cells.base_color(slot), base_before[slot]);
        }
    }

    #[test]
    fn stale_token_is_rejected() {
        let mut parcels = vec![parcel("7", 42, 0), parcel("9", 1, 1)];
        let mut cells = build(&mut parcels);
        let mut hl = Highlighter::new();

        let first = hl.begin_request();
        let second = hl.begin_request();
        // Second query resolves first.
        assert!(hl.apply(second, &mut cells, &parcels, &ids(&[9])));
        // First query's late result must not win.
        assert!(!hl.apply(first, &mut cells, &parcels, &ids(&[7])));

        assert_eq!(cells.overlay(42), None);
        assert_eq!(cells.overlay(101), Some(color::HIGHLIGHT));
    }

    #[test]
    fn non_numeric_ids_never_match() {
        let mut parcels = vec![parcel("not-a-number", 42, 0)];
        let mut cells = build(&mut parcels);
        let mut hl = Highlighter::new();

        let token = hl.begin_request();
        hl.apply(token, &mut cells, &parcels, &ids(&[7]));
        assert_eq!(hl.active_count(), 0);
        assert_eq!(cells.overlay(42), None);
    }
}
