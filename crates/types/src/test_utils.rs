//! Test utilities for creating common test objects
//!
//! Builders for candidates and fixtures for raw stream events, shared by the
//! unit and integration tests of every crate in the workspace.

use serde_json::{json, Value};

use crate::candidates::PathCandidate;
use crate::models::{parse_decimal, Account, Asset};

/// Builder for test candidates; defaults to a USD self-payment route
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
	source: Account,
	destination: Account,
	deliver: Asset,
	send_max: Asset,
}

impl Default for CandidateBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl CandidateBuilder {
	pub fn new() -> Self {
		let issuer = Account::new("rTestIssuer");
		Self {
			source: Account::new("rTestSource"),
			destination: Account::new("rTestSource"),
			deliver: issued("USD", issuer.clone(), "0.001"),
			send_max: issued("USD", issuer, "1"),
		}
	}

	pub fn source(mut self, source: &str) -> Self {
		self.source = Account::new(source);
		self
	}

	pub fn destination(mut self, destination: &str) -> Self {
		self.destination = Account::new(destination);
		self
	}

	pub fn deliver(mut self, currency: &str, issuer: &str, value: &str) -> Self {
		self.deliver = issued(currency, Account::new(issuer), value);
		self
	}

	pub fn send_max(mut self, currency: &str, issuer: &str, value: &str) -> Self {
		self.send_max = issued(currency, Account::new(issuer), value);
		self
	}

	pub fn build(self) -> PathCandidate {
		PathCandidate::new(self.source, self.destination, self.deliver, self.send_max)
	}
}

/// Fixtures for raw `transactions` stream events
pub struct TestEvents;

impl TestEvents {
	/// Issued-currency amount in RPC form
	pub fn issued(currency: &str, issuer: &str, value: &str) -> Value {
		json!({ "currency": currency, "issuer": issuer, "value": value })
	}

	/// Native amount in RPC form
	pub fn drops(drops: u64) -> Value {
		Value::String(drops.to_string())
	}

	/// A successful payment event
	pub fn payment(source: &str, destination: &str, amount: Value, send_max: Option<Value>) -> Value {
		let mut tx = json!({
			"TransactionType": "Payment",
			"Account": source,
			"Destination": destination,
			"Amount": amount,
		});
		if let Some(send_max) = send_max {
			tx["SendMax"] = send_max;
		}
		json!({
			"type": "transaction",
			"engine_result": "tesSUCCESS",
			"validated": true,
			"transaction": tx,
		})
	}

	/// A payment that failed to apply
	pub fn failed_payment(source: &str, destination: &str, amount: Value) -> Value {
		let mut event = Self::payment(source, destination, amount, None);
		event["engine_result"] = json!("tecPATH_PARTIAL");
		event
	}

	/// A successful non-payment transaction
	pub fn offer_create(account: &str) -> Value {
		json!({
			"type": "transaction",
			"engine_result": "tesSUCCESS",
			"transaction": {
				"TransactionType": "OfferCreate",
				"Account": account,
				"TakerGets": "1000000",
				"TakerPays": Self::issued("USD", "rTestIssuer", "1"),
			},
		})
	}
}

fn issued(currency: &str, issuer: Account, value: &str) -> Asset {
	Asset::issued(
		currency,
		issuer,
		parse_decimal(value).expect("Valid test decimal"),
	)
}
