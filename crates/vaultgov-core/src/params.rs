use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{MIN_LOCK_DURATION_SECS, VOTING_WINDOW_SECS, WEIGHT_SCALE};
use crate::error::VaultError;

/// Which asset's balance and supply a vote is weighed against.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightAssetSource {
    /// The asset of the record the proposal targets.
    #[default]
    ProposalAsset,
    /// The asset of the voter's own custody record; voters without one have no power.
    VoterAsset,
}

fn default_min_lock() -> i64 { MIN_LOCK_DURATION_SECS }
fn default_voting_window() -> i64 { VOTING_WINDOW_SECS }
fn default_weight_scale() -> u128 { WEIGHT_SCALE }

/// Protocol parameters for one vault deployment.
///
/// Every field is optional in JSON and falls back to the protocol constant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultParams {
    #[serde(default = "default_min_lock")]
    pub min_lock_duration_secs: i64,
    #[serde(default = "default_voting_window")]
    pub voting_window_secs: i64,
    #[serde(default = "default_weight_scale")]
    pub weight_scale: u128,
    #[serde(default)]
    pub weight_asset: WeightAssetSource,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            min_lock_duration_secs: MIN_LOCK_DURATION_SECS,
            voting_window_secs: VOTING_WINDOW_SECS,
            weight_scale: WEIGHT_SCALE,
            weight_asset: WeightAssetSource::default(),
        }
    }
}

impl VaultParams {
    pub fn from_json_str(json: &str) -> Result<Self, VaultError> {
        let params: Self =
            serde_json::from_str(json).map_err(|e| VaultError::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, VaultError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| VaultError::InvalidParams(format!("reading {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        // Deployments may lengthen the minimum lock, never shorten it.
        if self.min_lock_duration_secs < MIN_LOCK_DURATION_SECS {
            return Err(VaultError::InvalidParams(format!(
                "min_lock_duration_secs must be at least {MIN_LOCK_DURATION_SECS}"
            )));
        }
        if self.voting_window_secs <= 0 {
            return Err(VaultError::InvalidParams("voting_window_secs must be positive".into()));
        }
        if self.weight_scale == 0 {
            return Err(VaultError::InvalidParams("weight_scale must be non-zero".into()));
        }
        Ok(())
    }
}
