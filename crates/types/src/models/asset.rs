//! Ledger amounts: a currency, an optional issuer and a decimal value

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Account;

/// Currency code of the native asset
pub const NATIVE_CURRENCY: &str = "XRP";

/// Drops per whole unit of the native asset
const DROPS_PER_NATIVE: i64 = 1_000_000;

/// Errors produced when decoding an amount from its RPC representation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmountError {
	#[error("Amount must be a drops string or an issued-currency object, got: {0}")]
	UnsupportedShape(String),

	#[error("Issued amount is missing field '{0}'")]
	MissingField(&'static str),

	#[error("Invalid amount value '{value}': {reason}")]
	InvalidValue { value: String, reason: String },

	#[error("Amount {value} scaled by {factor} is out of range")]
	Overflow { value: Decimal, factor: Decimal },
}

/// Identity of an asset without its magnitude
///
/// Used wherever amounts on the same currency/issuer pair must collapse onto
/// one entry, e.g. registry keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
	pub currency: String,
	pub issuer: Option<Account>,
}

impl fmt::Display for AssetKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.issuer {
			Some(issuer) => write!(f, "{}/{}", self.currency, issuer),
			None => f.write_str(&self.currency),
		}
	}
}

/// An amount of some asset
///
/// An asset without an issuer is the network's native asset. Equality and
/// hashing cover the value as well; use [`Asset::key`] to compare on
/// currency and issuer only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
	pub currency: String,
	pub issuer: Option<Account>,
	pub value: Decimal,
}

impl Asset {
	/// Create an issued-currency amount
	pub fn issued(currency: impl Into<String>, issuer: Account, value: Decimal) -> Self {
		Self {
			currency: currency.into(),
			issuer: Some(issuer),
			value,
		}
	}

	/// Create a native amount, `value` expressed in whole units
	pub fn native(value: Decimal) -> Self {
		Self {
			currency: NATIVE_CURRENCY.to_string(),
			issuer: None,
			value,
		}
	}

	pub fn is_native(&self) -> bool {
		self.issuer.is_none()
	}

	/// Currency and issuer, ignoring the value
	pub fn key(&self) -> AssetKey {
		AssetKey {
			currency: self.currency.clone(),
			issuer: self.issuer.clone(),
		}
	}

	/// Same asset with a different value
	pub fn with_value(&self, value: Decimal) -> Self {
		Self {
			currency: self.currency.clone(),
			issuer: self.issuer.clone(),
			value,
		}
	}

	/// Same asset with its value multiplied by `factor`
	///
	/// Issued amounts can sit close to the decimal range limit, so the
	/// product is checked.
	pub fn scaled(&self, factor: Decimal) -> Result<Self, AmountError> {
		self.value
			.checked_mul(factor)
			.map(|value| self.with_value(value))
			.ok_or(AmountError::Overflow {
				value: self.value,
				factor,
			})
	}

	/// Same asset with a zero value
	pub fn zeroed(&self) -> Self {
		self.with_value(Decimal::ZERO)
	}

	/// Decode an amount as delivered by the node's RPC interface
	///
	/// Native amounts arrive as a string of drops, issued amounts as an
	/// object with `currency`, `issuer` and `value`.
	pub fn from_rpc(value: &Value) -> Result<Self, AmountError> {
		match value {
			Value::String(drops) => {
				let drops = drops
					.parse::<i64>()
					.map_err(|e| AmountError::InvalidValue {
						value: drops.clone(),
						reason: e.to_string(),
					})?;
				Ok(Self::native(Decimal::new(drops, 6)))
			},
			Value::Object(fields) => {
				let currency = fields
					.get("currency")
					.and_then(Value::as_str)
					.ok_or(AmountError::MissingField("currency"))?;
				let issuer = fields
					.get("issuer")
					.and_then(Value::as_str)
					.ok_or(AmountError::MissingField("issuer"))?;
				let raw = fields
					.get("value")
					.and_then(Value::as_str)
					.ok_or(AmountError::MissingField("value"))?;
				Ok(Self::issued(
					currency,
					Account::new(issuer),
					parse_decimal(raw)?,
				))
			},
			other => Err(AmountError::UnsupportedShape(other.to_string())),
		}
	}

	/// Encode the amount for an RPC request
	///
	/// Native values are truncated to whole drops.
	pub fn to_rpc(&self) -> Value {
		match &self.issuer {
			None => {
				let drops = (self.value * Decimal::from(DROPS_PER_NATIVE)).trunc();
				Value::String(drops.normalize().to_string())
			},
			Some(issuer) => json!({
				"currency": self.currency,
				"issuer": issuer.as_str(),
				"value": self.value.normalize().to_string(),
			}),
		}
	}
}

impl fmt::Display for Asset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.value.normalize(), self.key())
	}
}

/// Parse a decimal that may be written in scientific notation (`1.5e-7`)
pub fn parse_decimal(raw: &str) -> Result<Decimal, AmountError> {
	let parsed = if raw.contains(|c: char| c == 'e' || c == 'E') {
		Decimal::from_scientific(raw)
	} else {
		Decimal::from_str(raw)
	};
	parsed.map_err(|e| AmountError::InvalidValue {
		value: raw.to_string(),
		reason: e.to_string(),
	})
}
