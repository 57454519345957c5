//! Persisted entities (spec §3): [`Event`], [`ChainTransaction`], their status vocabularies, and
//! the `(signature, log_index)` identity scheme that makes ingestion at-most-once.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
	Pending,
	Confirmed,
	Reorged,
	Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationLabel {
	Fast,
	Standard,
}

impl ConfirmationLabel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Fast => "FAST",
			Self::Standard => "STANDARD",
		}
	}
}

impl std::fmt::Display for ConfirmationLabel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single ingested gateway event, keyed by `"<signature>:<log_index>"` (spec §3 Event).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	pub event_id: String,
	pub chain_id: String,
	pub event_type: String,
	pub block_height: u64,
	pub status: EventStatus,
	pub confirmation_type: ConfirmationLabel,
	/// Canonical JSON of the typed [`crate::decoder::DecodedEvent`] payload.
	pub event_data: serde_json::Value,
	pub created_at: i64,
}

impl Event {
	pub fn signature(&self) -> &str {
		self.event_id.split(':').next().unwrap_or(&self.event_id)
	}

	pub fn log_index(&self) -> Option<u32> {
		self.event_id.rsplit(':').next().and_then(|s| s.parse().ok())
	}

	pub fn new(
		signature: &str,
		log_index: u32,
		chain_id: &str,
		event_type: &str,
		block_height: u64,
		confirmation_type: ConfirmationLabel,
		event_data: serde_json::Value,
		created_at: i64,
	) -> Self {
		Self {
			event_id: format!("{signature}:{log_index}"),
			chain_id: chain_id.to_string(),
			event_type: event_type.to_string(),
			block_height,
			status: EventStatus::Pending,
			confirmation_type,
			event_data,
			created_at,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
	Pending,
	FastConfirmed,
	Confirmed,
	Reorged,
	Failed,
}

/// Per-transaction confirmation state shared by the Confirmer and the Reorg Verifier (spec §3
/// ChainTransaction, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainTransaction {
	pub tx_hash: String,
	pub block_number: u64,
	pub method: String,
	pub event_id: String,
	pub confirmations: u64,
	pub status: TxStatus,
	pub confirmation_type: ConfirmationLabel,
	pub chain_id: String,
}

impl ChainTransaction {
	/// `confirmations = max(0, latest_slot - block_number)` (spec §3 invariant, §8 property 4).
	pub fn recompute_confirmations(&mut self, latest_slot: u64) {
		self.confirmations = latest_slot.saturating_sub(self.block_number);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn event_id_round_trips_signature_and_log_index() {
		let e = Event::new(
			"5sig",
			3,
			"solana:H",
			"TxWithFunds",
			100,
			ConfirmationLabel::Fast,
			serde_json::json!({}),
			0,
		);
		assert_eq!(e.event_id, "5sig:3");
		assert_eq!(e.signature(), "5sig");
		assert_eq!(e.log_index(), Some(3));
	}

	#[test]
	fn confirmations_never_negative() {
		let mut tx = ChainTransaction {
			tx_hash: "sig".into(),
			block_number: 100,
			method: "TxWithFunds".into(),
			event_id: "sig:0".into(),
			confirmations: 0,
			status: TxStatus::Pending,
			confirmation_type: ConfirmationLabel::Fast,
			chain_id: "solana:H".into(),
		};
		tx.recompute_confirmations(50);
		assert_eq!(tx.confirmations, 0);
		tx.recompute_confirmations(150);
		assert_eq!(tx.confirmations, 50);
	}
}
