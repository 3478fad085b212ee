use thiserror::Error;

use crate::color::{Rgb, group_fallback_color};
use crate::record::{GroupAttributes, GroupRegistry, ParcelRecord, registry_from_rows};

/// Failure while parsing a delimited table. Any variant is fatal for the
/// load attempt: the grid is not built from a partially understood file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("table is empty")]
    Empty,
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: invalid integer in column '{column}': {value:?}")]
    InvalidInteger {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: expected at least {expected} fields, got {got}")]
    ShortRow {
        row: usize,
        expected: usize,
        got: usize,
    },
}

const PARCEL_ID: &str = "index";
const PARCEL_X: &str = "properties_x";
const PARCEL_Y: &str = "properties_y";
const PARCEL_GROUP: &str = "properties_realm";

const GROUP_KEY: &str = "assignedrxelm";
const GROUP_PARTNER: &str = "partner";
const GROUP_NAME: &str = "rxelmname";
const GROUP_COLOR: &str = "rxelmcolor";

/// Split a CSV line the way the upstream exports are written: plain commas,
/// optional surrounding quotes per field. Embedded commas never occur.
fn split_fields(line: &str) -> Vec<String> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').to_string())
        .collect()
}

struct Header {
    columns: Vec<String>,
}

impl Header {
    fn parse(line: &str) -> Self {
        Self {
            columns: split_fields(line)
                .into_iter()
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        }
    }

    fn require(&self, name: &'static str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or(TableError::MissingColumn(name))
    }
}

fn parse_u32(
    fields: &[String],
    idx: usize,
    row: usize,
    column: &'static str,
) -> Result<u32, TableError> {
    let value = &fields[idx];
    value.parse().map_err(|_| TableError::InvalidInteger {
        row,
        column,
        value: value.clone(),
    })
}

fn data_lines(text: &str) -> Result<(Header, Vec<(usize, &str)>), TableError> {
    let mut lines = text.trim().lines().filter(|l| !l.trim().is_empty());
    let header = Header::parse(lines.next().ok_or(TableError::Empty)?);
    // Row numbers are 1-based over data rows, matching what a spreadsheet
    // user would count below the header.
    Ok((header, lines.enumerate().map(|(i, l)| (i + 1, l)).collect()))
}

/// Parse the parcel table. Required columns: `index`, `properties_x`,
/// `properties_y`, `properties_realm`. Every original field is retained in
/// `raw_fields` for display.
pub fn parse_parcels(text: &str) -> Result<Vec<ParcelRecord>, TableError> {
    let (header, lines) = data_lines(text)?;
    let id_idx = header.require(PARCEL_ID)?;
    let x_idx = header.require(PARCEL_X)?;
    let y_idx = header.require(PARCEL_Y)?;
    let group_idx = header.require(PARCEL_GROUP)?;
    let width = 1 + id_idx.max(x_idx).max(y_idx).max(group_idx);

    let mut parcels = Vec::with_capacity(lines.len());
    for (row, line) in lines {
        let fields = split_fields(line);
        if fields.len() < width {
            return Err(TableError::ShortRow {
                row,
                expected: width,
                got: fields.len(),
            });
        }
        parcels.push(ParcelRecord {
            id: fields[id_idx].clone(),
            col: parse_u32(&fields, x_idx, row, PARCEL_X)?,
            row: parse_u32(&fields, y_idx, row, PARCEL_Y)?,
            group_id: fields[group_idx].clone(),
            raw_fields: fields,
            slot: None,
        });
    }
    Ok(parcels)
}

/// Parse the group registry. Required columns: `assignedrxelm`, `partner`,
/// `rxelmname`, `rxelmcolor`. A color cell that doesn't parse as hex falls
/// back to a deterministic hash color rather than failing the load.
pub fn parse_groups(text: &str) -> Result<GroupRegistry, TableError> {
    let (header, lines) = data_lines(text)?;
    let key_idx = header.require(GROUP_KEY)?;
    let partner_idx = header.require(GROUP_PARTNER)?;
    let name_idx = header.require(GROUP_NAME)?;
    let color_idx = header.require(GROUP_COLOR)?;
    let width = 1 + key_idx.max(partner_idx).max(name_idx).max(color_idx);

    let mut rows = Vec::with_capacity(lines.len());
    for (row, line) in lines {
        let fields = split_fields(line);
        if fields.len() < width {
            return Err(TableError::ShortRow {
                row,
                expected: width,
                got: fields.len(),
            });
        }
        let group_id = fields[key_idx].clone();
        let color =
            Rgb::parse_hex(&fields[color_idx]).unwrap_or_else(|| group_fallback_color(&group_id));
        rows.push(GroupAttributes {
            group_id,
            color,
            partner: fields[partner_idx].clone(),
            name: fields[name_idx].clone(),
        });
    }
    Ok(registry_from_rows(rows))
}
