//! Ledger value types shared by every component

pub mod account;
pub mod asset;

pub use account::Account;
pub use asset::{parse_decimal, AmountError, Asset, AssetKey, NATIVE_CURRENCY};
