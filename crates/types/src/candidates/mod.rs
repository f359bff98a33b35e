//! Path-finding candidates and their canonical registry keys

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Account, Asset, AssetKey};

/// Factor applied to an observed delivered amount (-10%)
pub const DELIVER_SCALE: Decimal = Decimal::from_parts(9, 0, 0, false, 1);

/// Factor applied to an observed send-max amount (+10%)
pub const SEND_MAX_SCALE: Decimal = Decimal::from_parts(11, 0, 0, false, 1);

/// One path-finding probe: deliver `deliver_amount` from `source` to
/// `destination`, spending at most `send_max_amount`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathCandidate {
	pub source: Account,
	pub destination: Account,
	pub deliver_amount: Asset,
	pub send_max_amount: Asset,
}

impl PathCandidate {
	pub fn new(
		source: Account,
		destination: Account,
		deliver_amount: Asset,
		send_max_amount: Asset,
	) -> Self {
		Self {
			source,
			destination,
			deliver_amount,
			send_max_amount,
		}
	}

	/// Canonical key: the route with both amounts stripped of their values
	pub fn key(&self) -> CandidateKey {
		CandidateKey {
			source: self.source.clone(),
			destination: self.destination.clone(),
			deliver: self.deliver_amount.key(),
			send_max: self.send_max_amount.key(),
		}
	}
}

impl fmt::Display for PathCandidate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} -> {} deliver {} (send max {})",
			self.source, self.destination, self.deliver_amount, self.send_max_amount
		)
	}
}

/// Identity of a route in the candidate registry
///
/// Two candidates that differ only in amount values share a key, so a later
/// observation on the same route replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateKey {
	pub source: Account,
	pub destination: Account,
	pub deliver: AssetKey,
	pub send_max: AssetKey,
}

impl fmt::Display for CandidateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"({} -> {}, {} via {})",
			self.source, self.destination, self.deliver, self.send_max
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::parse_decimal;

	fn usd(value: &str) -> Asset {
		Asset::issued("USD", Account::new("rIssuer"), parse_decimal(value).unwrap())
	}

	fn candidate(deliver: &str, send_max: &str) -> PathCandidate {
		PathCandidate::new(
			Account::new("rSource"),
			Account::new("rDest"),
			usd(deliver),
			usd(send_max),
		)
	}

	#[test]
	fn test_key_depends_only_on_route() {
		let a = candidate("0.001", "1");
		let b = candidate("12345.6789", "99999");
		assert_ne!(a, b);
		assert_eq!(a.key(), b.key());
	}

	#[test]
	fn test_key_distinguishes_send_max_currency() {
		let a = candidate("1", "1");
		let mut b = a.clone();
		b.send_max_amount = Asset::native(Decimal::ONE);
		assert_ne!(a.key(), b.key());
	}

	#[test]
	fn test_key_distinguishes_accounts() {
		let a = candidate("1", "1");
		let mut b = a.clone();
		b.destination = Account::new("rOther");
		assert_ne!(a.key(), b.key());
	}

	#[test]
	fn test_scale_constants() {
		assert_eq!(DELIVER_SCALE, Decimal::new(9, 1));
		assert_eq!(SEND_MAX_SCALE, Decimal::new(11, 1));
	}
}
