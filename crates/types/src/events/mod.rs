//! Events consumed from the node's subscription streams

pub mod path_find;
pub mod transaction;

pub use path_find::{PathFindRequest, PathFindUpdate};
pub use transaction::{Disqualification, ObservedPayment, PAYMENT_TYPE, SUCCESS_RESULT};
