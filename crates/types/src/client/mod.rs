//! Ledger client seam

pub mod errors;
pub mod traits;

pub use errors::{ClientError, ClientResult};
pub use traits::{LedgerClient, PathFindStream, TransactionStream};
