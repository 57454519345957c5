//! Reorg Verifier (C7): confirms that a tracked transaction still resides at its recorded slot
//! before the Confirmation Tracker bumps its depth (spec §4.4).

use std::str::FromStr;

use solana_rpc::types::RpcSignatureStatusConfig;
use sol_prim::Signature;

use crate::{
	event::{ChainTransaction, TxStatus},
	rpc_pool::RpcPool,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorgOutcome {
	Unchanged,
	Reorged,
	Failed,
	SlotRewritten { new_slot: u64 },
}

/// Applies the spec §4.4 outcome table for one tracked transaction, given the status the chain
/// currently reports for its signature (`None` if the RPC errored or found nothing).
pub fn classify(
	tx: &ChainTransaction,
	status: Option<&solana_rpc::responses::TransactionStatus>,
) -> ReorgOutcome {
	match status {
		None => ReorgOutcome::Reorged,
		Some(s) if s.err.is_some() => ReorgOutcome::Failed,
		Some(s) if s.slot != tx.block_number => ReorgOutcome::SlotRewritten { new_slot: s.slot },
		Some(_) => ReorgOutcome::Unchanged,
	}
}

pub fn apply_outcome(tx: &mut ChainTransaction, outcome: ReorgOutcome) {
	match outcome {
		ReorgOutcome::Unchanged => {},
		ReorgOutcome::Reorged => {
			tx.status = TxStatus::Reorged;
			tx.confirmations = 0;
		},
		ReorgOutcome::Failed => {
			tx.status = TxStatus::Failed;
			tx.confirmations = 0;
		},
		ReorgOutcome::SlotRewritten { new_slot } => {
			tx.block_number = new_slot;
			tx.status = TxStatus::Pending;
			tx.confirmations = 0;
		},
	}
}

pub struct ReorgVerifier {
	pool: RpcPool,
}

impl ReorgVerifier {
	pub fn new(pool: RpcPool) -> Self {
		Self { pool }
	}

	/// Checks `tx`'s signature against the chain and mutates it in place per the outcome table.
	/// Only called for transactions in `{pending, fast_confirmed}` (spec §4.4) — callers filter.
	pub async fn verify(&self, tx: &mut ChainTransaction) -> anyhow::Result<ReorgOutcome> {
		let signature = Signature::from_str(&tx.tx_hash)?;
		let response = self
			.pool
			.get_signature_statuses(vec![signature], RpcSignatureStatusConfig { search_transaction_history: false })
			.await?;
		let status = response.value.into_iter().next().flatten();
		let outcome = classify(tx, status.as_ref());
		apply_outcome(tx, outcome);
		Ok(outcome)
	}
}

#[cfg(test)]
mod tests {
	use solana_rpc::responses::TransactionStatus;

	use super::*;

	fn tx() -> ChainTransaction {
		ChainTransaction {
			tx_hash: "sig".into(),
			block_number: 150_000_000,
			method: "TxWithFunds".into(),
			event_id: "sig:0".into(),
			confirmations: 12,
			status: TxStatus::Confirmed,
			confirmation_type: crate::event::ConfirmationLabel::Standard,
			chain_id: "solana:H".into(),
		}
	}

	// spec §8 S4 — reorg.
	#[test]
	fn s4_slot_moved_rewrites_and_resets() {
		let status =
			TransactionStatus { slot: 150_000_002, confirmations: None, err: None, confirmation_status: None };
		let mut t = tx();
		let outcome = classify(&t, Some(&status));
		assert_eq!(outcome, ReorgOutcome::SlotRewritten { new_slot: 150_000_002 });
		apply_outcome(&mut t, outcome);
		assert_eq!(t.block_number, 150_000_002);
		assert_eq!(t.status, TxStatus::Pending);
		assert_eq!(t.confirmations, 0);
	}

	#[test]
	fn s4_error_marks_failed() {
		let status = TransactionStatus {
			slot: 150_000_000,
			confirmations: None,
			err: Some(serde_json::json!({"InstructionError": [0, "Custom"]})),
			confirmation_status: None,
		};
		let mut t = tx();
		let outcome = classify(&t, Some(&status));
		assert_eq!(outcome, ReorgOutcome::Failed);
		apply_outcome(&mut t, outcome);
		assert_eq!(t.status, TxStatus::Failed);
		assert_eq!(t.confirmations, 0);
	}

	#[test]
	fn missing_status_marks_reorged() {
		let mut t = tx();
		let outcome = classify(&t, None);
		assert_eq!(outcome, ReorgOutcome::Reorged);
		apply_outcome(&mut t, outcome);
		assert_eq!(t.status, TxStatus::Reorged);
		assert_eq!(t.confirmations, 0);
	}

	#[test]
	fn unchanged_when_slot_and_status_match() {
		let status =
			TransactionStatus { slot: 150_000_000, confirmations: None, err: None, confirmation_status: None };
		let t = tx();
		assert_eq!(classify(&t, Some(&status)), ReorgOutcome::Unchanged);
	}
}
