#![allow(clippy::missing_errors_doc)]

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use bladeline_core::{Command, Grid, GridError, Position, Tile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "blade";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded map payload.
pub(crate) const SNAPSHOT_HEADER: &str = "blade:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Map layout together with the enemy path drawn on it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MapSnapshot {
    /// Tiles composing the board.
    pub(crate) grid: Grid,
    /// Enemy path nodes in drawing order.
    pub(crate) enemy_path: Vec<Position>,
}

impl MapSnapshot {
    /// Parses either a transfer string or a plain JSON map document.
    pub(crate) fn parse(value: &str) -> Result<Self, MapTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MapTransferError::EmptyPayload);
        }

        if trimmed.starts_with('{') {
            let payload: MapPayload =
                serde_json::from_str(trimmed).map_err(MapTransferError::InvalidPayload)?;
            return payload.into_snapshot();
        }

        Self::decode(trimmed)
    }

    /// Encodes the map into a single-line string suitable for clipboard transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = MapPayload::of(self);
        let json = serde_json::to_vec(&payload).expect("map payload serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.grid.columns(),
            self.grid.rows()
        )
    }

    /// Decodes a map from its transfer string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, MapTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MapTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(MapTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(MapTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(MapTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(MapTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(MapTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(MapTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(MapTransferError::InvalidEncoding)?;
        let decoded: MapPayload =
            serde_json::from_slice(&bytes).map_err(MapTransferError::InvalidPayload)?;
        let snapshot = decoded.into_snapshot()?;

        if snapshot.grid.columns() != columns || snapshot.grid.rows() != rows {
            return Err(MapTransferError::DimensionMismatch {
                header: format!("{columns}x{rows}"),
                payload: format!("{}x{}", snapshot.grid.columns(), snapshot.grid.rows()),
            });
        }

        Ok(snapshot)
    }

    /// Converts the snapshot into the world command that loads it.
    #[must_use]
    pub(crate) fn into_command(self) -> Command {
        Command::LoadMap {
            grid: self.grid,
            enemy_path: self.enemy_path,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct MapPayload {
    tiles: Vec<Vec<u8>>,
    #[serde(default)]
    enemy_path: Vec<Position>,
}

impl MapPayload {
    fn of(snapshot: &MapSnapshot) -> Self {
        let tiles = snapshot
            .grid
            .tiles()
            .chunks(snapshot.grid.columns() as usize)
            .map(|row| row.iter().map(|tile| tile.code()).collect())
            .collect();

        Self {
            tiles,
            enemy_path: snapshot.enemy_path.clone(),
        }
    }

    fn into_snapshot(self) -> Result<MapSnapshot, MapTransferError> {
        let mut rows = Vec::with_capacity(self.tiles.len());
        for (row, codes) in self.tiles.iter().enumerate() {
            let mut tiles = Vec::with_capacity(codes.len());
            for (column, code) in codes.iter().enumerate() {
                let tile = Tile::from_code(*code).ok_or(MapTransferError::UnknownTile {
                    row,
                    column,
                    code: *code,
                })?;
                tiles.push(tile);
            }
            rows.push(tiles);
        }

        Ok(MapSnapshot {
            grid: Grid::from_rows(&rows)?,
            enemy_path: self.enemy_path,
        })
    }
}

/// Errors that can occur while decoding map transfer strings.
#[derive(Debug, Error)]
pub(crate) enum MapTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("map payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded map.
    #[error("map string is missing the prefix")]
    MissingPrefix,
    /// The encoded map did not contain a version segment.
    #[error("map string is missing the version")]
    MissingVersion,
    /// The encoded map did not include grid dimensions.
    #[error("map string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded map did not include the payload segment.
    #[error("map string is missing the payload")]
    MissingPayload,
    /// The encoded map used an unexpected prefix segment.
    #[error("map prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded map used an unsupported version identifier.
    #[error("map version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded map.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header dimensions disagree with the decoded tiles.
    #[error("header declares a {header} grid but the payload holds {payload}")]
    DimensionMismatch {
        /// Dimensions declared by the header.
        header: String,
        /// Dimensions of the decoded tile rows.
        payload: String,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode map payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse map payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// A tile code does not name a known tile.
    #[error("unknown tile code {code} at row {row}, column {column}")]
    UnknownTile {
        /// Row of the offending tile.
        row: usize,
        /// Column of the offending tile.
        column: usize,
        /// Code that failed to resolve.
        code: u8,
    },
    /// The decoded tiles do not form a valid grid.
    #[error("map tiles do not form a valid grid")]
    InvalidGrid(#[from] GridError),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), MapTransferError> {
    let invalid = || MapTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}
