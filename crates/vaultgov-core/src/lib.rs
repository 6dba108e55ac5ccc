pub mod constants;
pub mod custody;
pub mod error;
pub mod event;
pub mod ledger;
pub mod params;
pub mod proposal;
pub mod types;

pub use constants::*;
pub use custody::*;
pub use error::{ErrorClass, VaultError};
pub use event::*;
pub use ledger::TokenLedger;
pub use params::{VaultParams, WeightAssetSource};
pub use proposal::*;
pub use types::*;
