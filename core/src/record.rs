use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// One row of the parcel table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelRecord {
    /// External asset identifier. Opaque here; parsed numerically only for
    /// account-highlight matching.
    pub id: String,
    pub col: u32,
    pub row: u32,
    /// Key into the group registry. May reference an unknown group.
    pub group_id: String,
    /// Original row values in file order, kept verbatim for tooltip display.
    #[serde(default)]
    pub raw_fields: Vec<String>,
    /// Index into the cell-instance buffer, assigned at grid build.
    /// `None` before build or when the coordinate fell outside the grid.
    #[serde(default)]
    pub slot: Option<usize>,
}

/// One row of the group registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAttributes {
    pub group_id: String,
    pub color: Rgb,
    pub partner: String,
    pub name: String,
}

pub type GroupRegistry = HashMap<String, GroupAttributes>;

/// Build the registry lookup from parsed rows. Last row wins on a repeated key.
pub fn registry_from_rows(rows: Vec<GroupAttributes>) -> GroupRegistry {
    rows.into_iter().map(|g| (g.group_id.clone(), g)).collect()
}
