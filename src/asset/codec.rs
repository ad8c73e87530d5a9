//! Asset record codec
//!
//! Assets persist as a JSON object with exactly the six fields `ID`, `Car`,
//! `Brand`, `ProductionDate`, `ProductionLocation` and `Description`.
//! Field order is fixed by the struct, so encoding is deterministic.

use crate::error::{LedgerError, Result};

use super::Asset;

/// Serialize an asset to its stored form
pub fn encode_asset(asset: &Asset) -> Result<Vec<u8>> {
    serde_json::to_vec(asset).map_err(|e| LedgerError::Encoding(e.to_string()))
}

/// Parse a stored record
///
/// Fails with `Decoding` on malformed JSON, a missing field, an unknown
/// field, or a non-string field value.
pub fn decode_asset(bytes: &[u8]) -> Result<Asset> {
    serde_json::from_slice(bytes).map_err(|e| LedgerError::Decoding(e.to_string()))
}

/// Serialize a list of assets as one JSON array
pub(crate) fn encode_assets(assets: &[Asset]) -> Result<Vec<u8>> {
    serde_json::to_vec(assets).map_err(|e| LedgerError::Encoding(e.to_string()))
}
