use std::collections::HashMap;

use crate::grid::GridGeometry;
use crate::record::ParcelRecord;

/// Non-fatal data-quality condition observed while indexing the parcel
/// table. The offending record stays in the raw table (it is still
/// displayable data) but is absent from the index, so it will never be
/// colored or hit-tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataWarning {
    OutOfBounds { id: String, col: u32, row: u32 },
    DuplicateCoordinate { col: u32, row: u32, kept_id: String },
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds { id, col, row } => {
                write!(f, "parcel {id} at ({col}, {row}) is outside the grid")
            }
            Self::DuplicateCoordinate { col, row, kept_id } => {
                write!(f, "duplicate parcel at ({col}, {row}); keeping {kept_id}")
            }
        }
    }
}

/// O(1) lookup from grid coordinate to parcel index.
/// Rebuilt from scratch on every data load.
pub struct SpatialIndex {
    by_coord: HashMap<(u32, u32), usize>,
}

impl SpatialIndex {
    /// Index every in-bounds parcel in O(n). Duplicate coordinates keep the
    /// last record seen; out-of-bounds coordinates are dropped. Both are
    /// reported as warnings for the caller to log.
    pub fn build(parcels: &[ParcelRecord], geometry: &GridGeometry) -> (Self, Vec<DataWarning>) {
        let mut by_coord = HashMap::with_capacity(parcels.len());
        let mut warnings = Vec::new();

        for (idx, parcel) in parcels.iter().enumerate() {
            if !geometry.contains(parcel.col, parcel.row) {
                warnings.push(DataWarning::OutOfBounds {
                    id: parcel.id.clone(),
                    col: parcel.col,
                    row: parcel.row,
                });
                continue;
            }
            if by_coord.insert((parcel.col, parcel.row), idx).is_some() {
                warnings.push(DataWarning::DuplicateCoordinate {
                    col: parcel.col,
                    row: parcel.row,
                    kept_id: parcel.id.clone(),
                });
            }
        }

        (Self { by_coord }, warnings)
    }

    pub fn get(&self, col: u32, row: u32) -> Option<usize> {
        self.by_coord.get(&(col, row)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_coord.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_coord.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{DataWarning, SpatialIndex};
    use crate::grid::GridGeometry;
    use crate::record::ParcelRecord;

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

    #[test]
    fn indexes_in_bounds_parcels() {
        let parcels = vec![parcel("7", 5, 10), parcel("8", 0, 0)];
        let (index, warnings) = SpatialIndex::build(&parcels, &GridGeometry::new(370, 270, 1.0));
        assert!(warnings.is_empty());
        assert_eq!(index.get(5, 10), Some(0));
        assert_eq!(index.get(0, 0), Some(1));
        assert_eq!(index.get(50, 50), None);
    }

    #[test]
    fn out_of_bounds_parcel_is_dropped_with_warning() {
        let parcels = vec![parcel("7", 370, 10)];
        let (index, warnings) = SpatialIndex::build(&parcels, &GridGeometry::new(370, 270, 1.0));
        assert!(index.is_empty());
        assert_eq!(
            warnings,
            vec![DataWarning::OutOfBounds {
                id: "7".to_string(),
                col: 370,
                row: 10,
            }]
        );
    }

    #[test]
    fn duplicate_coordinate_last_write_wins() {
        let parcels = vec![parcel("7", 5, 10), parcel("8", 5, 10)];
        let (index, warnings) = SpatialIndex::build(&parcels, &GridGeometry::new(370, 270, 1.0));
        assert_eq!(index.get(5, 10), Some(1));
        assert_eq!(
            warnings,
            vec![DataWarning::DuplicateCoordinate {
                col: 5,
                row: 10,
                kept_id: "8".to_string(),
            }]
        );
    }
}
