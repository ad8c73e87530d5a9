//! Asset Service
//!
//! CRUD over car-part assets. Every mutation checks existence first, so
//! the service is where `NotFound` and `AlreadyExists` come from; the world
//! state underneath treats deletes of absent keys as no-ops.

use crate::error::{LedgerError, Result};
use crate::state::WorldState;

use super::codec::encode_assets;
use super::{decode_asset, encode_asset, seed_assets, Asset, Transaction};

/// Asset registry over an injected world state
pub struct AssetService<S> {
    state: S,
}

impl<S: WorldState> AssetService<S> {
    pub fn new(state: S) -> Self {
        Self { state }
    }

    /// The underlying world state
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_inner(self) -> S {
        self.state
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Load the seed set, overwriting any existing copies
    pub fn init_ledger(&self) -> Result<()> {
        let assets = seed_assets();
        for asset in &assets {
            self.state.put_state(&asset.id, &encode_asset(asset)?)?;
        }

        tracing::debug!(count = assets.len(), "Seed assets loaded");
        Ok(())
    }

    /// Add a new asset; fails if its ID is already taken
    pub fn create_asset(&self, asset: &Asset) -> Result<()> {
        Self::validate(asset)?;

        if self.state.state_exists(&asset.id)? {
            return Err(LedgerError::AlreadyExists(asset.id.clone()));
        }

        self.state.put_state(&asset.id, &encode_asset(asset)?)?;

        tracing::debug!(id = %asset.id, "Asset created");
        Ok(())
    }

    /// Fetch one asset by ID
    pub fn read_asset(&self, id: &str) -> Result<Asset> {
        match self.state.get_state(id)? {
            Some(bytes) => decode_asset(&bytes),
            None => Err(LedgerError::NotFound(id.to_string())),
        }
    }

    /// Replace every field of an existing asset
    pub fn update_asset(&self, asset: &Asset) -> Result<()> {
        Self::validate(asset)?;

        if !self.state.state_exists(&asset.id)? {
            return Err(LedgerError::NotFound(asset.id.clone()));
        }

        self.state.put_state(&asset.id, &encode_asset(asset)?)?;

        tracing::debug!(id = %asset.id, "Asset updated");
        Ok(())
    }

    pub fn delete_asset(&self, id: &str) -> Result<()> {
        if !self.state.state_exists(id)? {
            return Err(LedgerError::NotFound(id.to_string()));
        }

        self.state.del_state(id)?;

        tracing::debug!(id, "Asset deleted");
        Ok(())
    }

    pub fn asset_exists(&self, id: &str) -> Result<bool> {
        self.state.state_exists(id)
    }

    /// Every asset in key order
    ///
    /// Stops at the first record that fails to decode.
    pub fn get_all_assets(&self) -> Result<Vec<Asset>> {
        let mut iter = self.state.get_state_by_range("", "")?;

        let mut assets = Vec::new();
        while iter.has_next() {
            let (_, value) = iter.next()?;
            assets.push(decode_asset(&value)?);
        }
        iter.close();

        Ok(assets)
    }

    /// Run a parsed transaction, returning its JSON payload if it has one
    ///
    /// - `ReadAsset`: the asset object
    /// - `AssetExists`: `true` or `false`
    /// - `GetAllAssets`: an array, `[]` when empty
    /// - mutations: no payload
    pub fn execute(&self, tx: Transaction) -> Result<Option<Vec<u8>>> {
        tracing::trace!(function = tx.name(), "Executing transaction");

        match tx {
            Transaction::InitLedger => self.init_ledger().map(|_| None),
            Transaction::CreateAsset(asset) => self.create_asset(&asset).map(|_| None),
            Transaction::UpdateAsset(asset) => self.update_asset(&asset).map(|_| None),
            Transaction::DeleteAsset { id } => self.delete_asset(&id).map(|_| None),
            Transaction::ReadAsset { id } => {
                let asset = self.read_asset(&id)?;
                encode_asset(&asset).map(Some)
            }
            Transaction::AssetExists { id } => {
                let exists = self.asset_exists(&id)?;
                Ok(Some(exists.to_string().into_bytes()))
            }
            Transaction::GetAllAssets => {
                let assets = self.get_all_assets()?;
                encode_assets(&assets).map(Some)
            }
        }
    }

    /// Run a read-only transaction
    ///
    /// Mutations are rejected with `NotReadOnly` before anything executes.
    pub fn evaluate(&self, tx: Transaction) -> Result<Option<Vec<u8>>> {
        if !tx.is_read_only() {
            return Err(LedgerError::NotReadOnly(tx.name().to_string()));
        }
        self.execute(tx)
    }

    fn validate(asset: &Asset) -> Result<()> {
        if asset.id.is_empty() {
            return Err(LedgerError::InvalidAsset(
                "asset ID must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
