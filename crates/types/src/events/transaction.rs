//! Validated-transaction stream events

use serde_json::Value;
use thiserror::Error;

use crate::candidates::{PathCandidate, DELIVER_SCALE, SEND_MAX_SCALE};
use crate::models::{Account, AmountError, Asset};

/// Engine result code of a successfully applied transaction
pub const SUCCESS_RESULT: &str = "tesSUCCESS";

/// Transaction type the observer derives candidates from
pub const PAYMENT_TYPE: &str = "Payment";

/// Why a transaction event does not yield a path-finding candidate
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Disqualification {
	#[error("transaction did not succeed ({result})")]
	NotSuccess { result: String },

	#[error("transaction is not a payment ({transaction_type})")]
	NotPayment { transaction_type: String },

	#[error("malformed field '{field}': {reason}")]
	Malformed { field: &'static str, reason: String },

	#[error("payment is native on both sides")]
	FullyNative,
}

impl Disqualification {
	/// Short label for counters and log fields
	pub fn label(&self) -> &'static str {
		match self {
			Disqualification::NotSuccess { .. } => "not_success",
			Disqualification::NotPayment { .. } => "not_payment",
			Disqualification::Malformed { .. } => "malformed",
			Disqualification::FullyNative => "fully_native",
		}
	}

	fn missing(field: &'static str) -> Self {
		Disqualification::Malformed {
			field,
			reason: "missing or not a string".to_string(),
		}
	}

	fn bad_amount(field: &'static str, error: AmountError) -> Self {
		Disqualification::Malformed {
			field,
			reason: error.to_string(),
		}
	}
}

/// A successful payment seen on the transaction stream
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedPayment {
	pub source: Account,
	pub destination: Account,
	pub delivered: Asset,
	/// Equal to `delivered` when the payment carried no `SendMax`
	pub send_max: Asset,
}

impl ObservedPayment {
	/// Validate a raw stream event and extract the payment it describes
	///
	/// Never fails with anything other than a [`Disqualification`]; callers
	/// on the delivery path can drop those without further handling.
	pub fn parse(event: &Value) -> Result<Self, Disqualification> {
		let result = event
			.get("engine_result")
			.and_then(Value::as_str)
			.ok_or_else(|| Disqualification::missing("engine_result"))?;
		let tx = event
			.get("transaction")
			.filter(|tx| tx.is_object())
			.ok_or_else(|| Disqualification::missing("transaction"))?;
		let transaction_type = tx
			.get("TransactionType")
			.and_then(Value::as_str)
			.ok_or_else(|| Disqualification::missing("TransactionType"))?;

		if result != SUCCESS_RESULT {
			return Err(Disqualification::NotSuccess {
				result: result.to_string(),
			});
		}
		if transaction_type != PAYMENT_TYPE {
			return Err(Disqualification::NotPayment {
				transaction_type: transaction_type.to_string(),
			});
		}

		let source = account_field(tx, "Account")?;
		let destination = account_field(tx, "Destination")?;

		// Newer API versions rename Amount to DeliverMax
		let delivered = tx
			.get("Amount")
			.or_else(|| tx.get("DeliverMax"))
			.ok_or_else(|| Disqualification::missing("Amount"))
			.and_then(|raw| amount_field("Amount", raw))?;
		let send_max = match tx.get("SendMax") {
			Some(raw) => amount_field("SendMax", raw)?,
			None => delivered.clone(),
		};

		if delivered.is_native() && send_max.is_native() {
			return Err(Disqualification::FullyNative);
		}

		Ok(Self {
			source,
			destination,
			delivered,
			send_max,
		})
	}

	/// Probe derived from this payment
	///
	/// The delivered amount is tightened by 10% and the send-max widened by
	/// 10%, so the probe asks for slightly less than was delivered while
	/// allowing slightly more to be spent. An amount that leaves the decimal
	/// range when scaled disqualifies the payment.
	pub fn to_candidate(&self) -> Result<PathCandidate, Disqualification> {
		let deliver = self
			.delivered
			.scaled(DELIVER_SCALE)
			.map_err(|e| Disqualification::bad_amount("Amount", e))?;
		let send_max = self
			.send_max
			.scaled(SEND_MAX_SCALE)
			.map_err(|e| Disqualification::bad_amount("SendMax", e))?;
		Ok(PathCandidate::new(
			self.source.clone(),
			self.destination.clone(),
			deliver,
			send_max,
		))
	}
}

fn account_field(tx: &Value, field: &'static str) -> Result<Account, Disqualification> {
	tx.get(field)
		.and_then(Value::as_str)
		.filter(|s| !s.is_empty())
		.map(Account::new)
		.ok_or_else(|| Disqualification::missing(field))
}

fn amount_field(field: &'static str, raw: &Value) -> Result<Asset, Disqualification> {
	Asset::from_rpc(raw).map_err(|e| Disqualification::bad_amount(field, e))
}
