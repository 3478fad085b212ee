use crate::color::{self, Rgb};
use crate::grid::GridGeometry;
use crate::record::{GroupRegistry, ParcelRecord};
use crate::spatial::SpatialIndex;

/// Fixed-capacity per-cell visual state: a base color layer written once at
/// build time and an independent overlay layer toggled by the highlight
/// service. Rebuilding requires a full `build` — the buffers never grow or
/// shrink within one data load.
pub struct CellBuffer {
    geometry: GridGeometry,
    base: Vec<Rgb>,
    overlay: Vec<Option<Rgb>>,
    /// Reverse map: slot → index into the parcel table, for O(1) hit lookup.
    parcel_at: Vec<Option<usize>>,
}

impl CellBuffer {
    /// Populate every one of `cols * rows` slots. Color resolution order per
    /// slot: no parcel → unlisted gray; group found in the registry → its
    /// display color; otherwise → unmapped cyan. Writes each in-bounds
    /// parcel's slot back into the record so later lookups by slot are O(1).
    pub fn build(
        geometry: GridGeometry,
        parcels: &mut [ParcelRecord],
        index: &SpatialIndex,
        registry: &GroupRegistry,
    ) -> Self {
        let count = geometry.cell_count();
        let mut base = vec![color::UNLISTED; count];
        let mut parcel_at = vec![None; count];

        for record in parcels.iter_mut() {
            record.slot = None;
        }

        for row in 0..geometry.rows {
            for col in 0..geometry.cols {
                let Some(parcel_idx) = index.get(col, row) else {
                    continue;
                };
                let slot = geometry.slot(col, row);
                let parcel = &mut parcels[parcel_idx];
                base[slot] = registry
                    .get(&parcel.group_id)
                    .map(|g| g.color)
                    .unwrap_or(color::UNMAPPED);
                parcel.slot = Some(slot);
                parcel_at[slot] = Some(parcel_idx);
            }
        }

        Self {
            geometry,
            base,
            overlay: vec![None; count],
            parcel_at,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn base_color(&self, slot: usize) -> Rgb {
        self.base[slot]
    }

    pub fn overlay(&self, slot: usize) -> Option<Rgb> {
        self.overlay[slot]
    }

    /// Set or clear the overlay layer for one slot. O(1); never touches the
    /// base layer.
    pub fn set_overlay(&mut self, slot: usize, color: Option<Rgb>) {
        self.overlay[slot] = color;
    }

    /// Base color with the overlay combined additively when present.
    pub fn effective_color(&self, slot: usize) -> Rgb {
        match self.overlay[slot] {
            Some(glow) => self.base[slot].saturating_add(glow),
            None => self.base[slot],
        }
    }

    /// Index into the parcel table for the parcel rendered at `slot`, if any.
    pub fn parcel_at_slot(&self, slot: usize) -> Option<usize> {
        self.parcel_at.get(slot).copied().flatten()
    }

    /// Number of slots occupied by a listed parcel.
    pub fn listed_count(&self) -> usize {
        self.parcel_at.iter().filter(|p| p.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::CellBuffer;
    use crate::color::{self, Rgb};
    use crate::grid::GridGeometry;
    use crate::record::{GroupAttributes, GroupRegistry, ParcelRecord};
    use crate::spatial::SpatialIndex;

    fn parcel(id: &str, col: u32, row: u32, group: &str) -> ParcelRecord {
        ParcelRecord {
            id: id.to_string(),
            col,
            row,
            group_id: group.to_string(),
            raw_fields: Vec::new(),
            slot: None,
        }
    }

    fn registry_with(group: &str, hex: &str) -> GroupRegistry {
        let mut registry = GroupRegistry::new();
        registry.insert(
            group.to_string(),
            GroupAttributes {
                group_id: group.to_string(),
                color: Rgb::parse_hex(hex).unwrap(),
                partner: "Acme".to_string(),
                name: "Northfield".to_string(),
            },
        );
        registry
    }

    fn build(
        geometry: GridGeometry,
        parcels: &mut Vec<ParcelRecord>,
        registry: &GroupRegistry,
    ) -> CellBuffer {
        let (index, warnings) = SpatialIndex::build(parcels, &geometry);
        assert!(warnings.is_empty());
        CellBuffer::build(geometry, parcels, &index, registry)
    }

    #[test]
    fn every_slot_gets_a_base_color() {
        let geometry = GridGeometry::new(370, 270, 1.0);
        let mut parcels = vec![parcel("7", 5, 10, "R1")];
        let cells = build(geometry, &mut parcels, &registry_with("R1", "#ABCDEF"));
        assert_eq!(cells.len(), 370 * 270);
    }

    #[test]
    fn mapped_group_gets_registry_color() {
        // Scenario A: parcel at (5,10), group R1 → #ABCDEF at slot 3705.
        let geometry = GridGeometry::new(370, 270, 1.0);
        let mut parcels = vec![parcel("7", 5, 10, "R1")];
        let cells = build(geometry, &mut parcels, &registry_with("R1", "#ABCDEF"));
        assert_eq!(cells.base_color(3705), Rgb::parse_hex("#ABCDEF").unwrap());
        assert_eq!(parcels[0].slot, Some(3705));
        assert_eq!(cells.parcel_at_slot(3705), Some(0));
    }

    #[test]
    fn unmapped_group_gets_default_cyan() {
        // Scenario B: group absent from the registry.
        let geometry = GridGeometry::new(370, 270, 1.0);
        let mut parcels = vec![parcel("7", 0, 0, "R999")];
        let cells = build(geometry, &mut parcels, &registry_with("R1", "#ABCDEF"));
        assert_eq!(cells.base_color(0), color::UNMAPPED);
    }

    #[test]
    fn unlisted_coordinate_gets_gray() {
        // Scenario C: nothing listed at (50,50).
        let geometry = GridGeometry::new(370, 270, 1.0);
        let mut parcels = vec![parcel("7", 5, 10, "R1")];
        let cells = build(geometry, &mut parcels, &registry_with("R1", "#ABCDEF"));
        assert_eq!(cells.base_color(geometry.slot(50, 50)), color::UNLISTED);
        assert_eq!(cells.parcel_at_slot(geometry.slot(50, 50)), None);
    }

    #[test]
    fn slot_satisfies_row_major_invariant() {
        let geometry = GridGeometry::new(12, 9, 1.0);
        let mut parcels = vec![
            parcel("1", 3, 2, "R1"),
            parcel("2", 0, 8, "R1"),
            parcel("3", 11, 0, "R1"),
        ];
        let _ = build(geometry, &mut parcels, &registry_with("R1", "#ABCDEF"));
        for p in &parcels {
            assert_eq!(p.slot, Some((p.row * 12 + p.col) as usize));
        }
    }

    #[test]
    fn overlay_is_independent_of_base() {
        let geometry = GridGeometry::new(4, 4, 1.0);
        let mut parcels = vec![parcel("7", 1, 1, "R1")];
        let mut cells = build(geometry, &mut parcels, &registry_with("R1", "#402000"));
        let slot = geometry.slot(1, 1);
        let base = cells.base_color(slot);

        cells.set_overlay(slot, Some(Rgb::new(0x10, 0x10, 0x10)));
        assert_eq!(cells.base_color(slot), base);
        assert_eq!(cells.effective_color(slot), Rgb::new(0x50, 0x30, 0x10));

        cells.set_overlay(slot, None);
        assert_eq!(cells.effective_color(slot), base);
    }
}
