//! Confirmation Tracker (C8): the per-transaction status machine shared between the Confirmer and
//! the Reorg Verifier, and the external "is this tx confirmed?" surface (spec §4.4).
//!
//! Pure state transitions only — no RPC or persistence calls live here, so these rules are
//! directly unit-testable against spec §8 scenario S3.

use crate::{
	config::BlockConfirmations,
	event::{ChainTransaction, ConfirmationLabel, TxStatus},
};

fn required_depth(label: ConfirmationLabel, confirmations: &BlockConfirmations) -> u64 {
	match label {
		ConfirmationLabel::Fast => confirmations.fast,
		ConfirmationLabel::Standard => confirmations.standard,
	}
}

/// Recomputes `confirmations` and applies the depth threshold for `tx.confirmation_type`,
/// promoting `pending -> fast_confirmed -> confirmed`. A transaction already `reorged` or
/// `failed` is left untouched; callers run the Reorg Verifier first.
pub fn apply_thresholds(tx: &mut ChainTransaction, latest_slot: u64, confirmations: &BlockConfirmations) {
	if matches!(tx.status, TxStatus::Reorged | TxStatus::Failed) {
		return;
	}
	tx.recompute_confirmations(latest_slot);
	let required = required_depth(tx.confirmation_type, confirmations);
	if tx.confirmations >= required {
		tx.status = match tx.confirmation_type {
			ConfirmationLabel::Fast => TxStatus::FastConfirmed,
			ConfirmationLabel::Standard => TxStatus::Confirmed,
		};
	} else if matches!(tx.status, TxStatus::FastConfirmed | TxStatus::Confirmed) {
		// A confirmed transaction never regresses to pending without a reorg observation
		// (spec §8 property 3); thresholds alone cannot retract confirmation.
	} else {
		tx.status = TxStatus::Pending;
	}
}

pub fn is_confirmed(tx: &ChainTransaction) -> bool {
	matches!(tx.status, TxStatus::FastConfirmed | TxStatus::Confirmed)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tx(confirmation_type: ConfirmationLabel, block_number: u64) -> ChainTransaction {
		ChainTransaction {
			tx_hash: "sig".into(),
			block_number,
			method: "TxWithFunds".into(),
			event_id: "sig:0".into(),
			confirmations: 0,
			status: TxStatus::Pending,
			confirmation_type,
			chain_id: "solana:H".into(),
		}
	}

	// spec §8 S3 — confirmation promotion.
	#[test]
	fn s3_fast_promotes_at_required_depth() {
		let confirmations = BlockConfirmations { fast: 5, standard: 12 };
		let mut tx = tx(ConfirmationLabel::Fast, 150_000_000);

		apply_thresholds(&mut tx, 150_000_004, &confirmations);
		assert_eq!(tx.status, TxStatus::Pending);

		apply_thresholds(&mut tx, 150_000_005, &confirmations);
		assert_eq!(tx.status, TxStatus::FastConfirmed);
	}

	#[test]
	fn s3_standard_sibling_waits_for_deeper_threshold() {
		let confirmations = BlockConfirmations { fast: 5, standard: 12 };
		let mut tx = tx(ConfirmationLabel::Standard, 150_000_000);

		apply_thresholds(&mut tx, 150_000_011, &confirmations);
		assert_eq!(tx.status, TxStatus::Pending);

		apply_thresholds(&mut tx, 150_000_012, &confirmations);
		assert_eq!(tx.status, TxStatus::Confirmed);
	}

	#[test]
	fn confirmed_tx_never_regresses_without_reorg() {
		let confirmations = BlockConfirmations { fast: 5, standard: 12 };
		let mut tx = tx(ConfirmationLabel::Fast, 150_000_000);
		apply_thresholds(&mut tx, 150_000_010, &confirmations);
		assert_eq!(tx.status, TxStatus::FastConfirmed);

		// Re-applying thresholds at the same depth must not retract confirmation.
		apply_thresholds(&mut tx, 150_000_010, &confirmations);
		assert_eq!(tx.status, TxStatus::FastConfirmed);
	}

	#[test]
	fn reorged_and_failed_are_left_alone() {
		let confirmations = BlockConfirmations { fast: 5, standard: 12 };
		let mut tx = tx(ConfirmationLabel::Fast, 150_000_000);
		tx.status = TxStatus::Reorged;
		apply_thresholds(&mut tx, 150_000_010, &confirmations);
		assert_eq!(tx.status, TxStatus::Reorged);
		assert_eq!(tx.confirmations, 0);
	}
}
