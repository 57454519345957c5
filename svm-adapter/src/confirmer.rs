//! Event Confirmer (C6): promotes `PENDING` events to `CONFIRMED` once their required depth is
//! satisfied, and drives the Reorg Verifier / Confirmation Tracker over tracked transactions on
//! the same tick (spec §4.4).

use std::{str::FromStr, sync::Arc, time::Duration};

use solana_rpc::types::{Commitment, RpcTransactionConfig, UiTransactionEncoding};
use sol_prim::Signature;
use tokio_util::sync::CancellationToken;

use crate::{
	config::BlockConfirmations,
	db::{EventStore, TransactionStore},
	event::{ConfirmationLabel, EventStatus, TxStatus},
	reorg::ReorgVerifier,
	rpc_pool::RpcPool,
	tracker,
};

const MAX_EVENTS_PER_TICK: usize = 1000;

fn required_depth(label: ConfirmationLabel, confirmations: &BlockConfirmations) -> u64 {
	match label {
		ConfirmationLabel::Fast => confirmations.fast,
		ConfirmationLabel::Standard => confirmations.standard,
	}
}

pub struct EventConfirmer {
	pool: RpcPool,
	events: Arc<dyn EventStore>,
	transactions: Arc<dyn TransactionStore>,
	reorg: ReorgVerifier,
	confirmations: BlockConfirmations,
	poll_interval: Duration,
}

impl EventConfirmer {
	pub fn new(
		pool: RpcPool,
		events: Arc<dyn EventStore>,
		transactions: Arc<dyn TransactionStore>,
		confirmations: BlockConfirmations,
		poll_interval: Duration,
	) -> Self {
		Self { reorg: ReorgVerifier::new(pool.clone()), pool, events, transactions, confirmations, poll_interval }
	}

	pub async fn run(self, stop: CancellationToken) -> anyhow::Result<()> {
		let mut ticker = tokio::time::interval(self.poll_interval);
		loop {
			tokio::select! {
				_ = stop.cancelled() => return Ok(()),
				_ = ticker.tick() => {
					if let Err(e) = self.tick().await {
						tracing::warn!(error = %e, "confirmer tick failed, will retry next interval");
					}
				}
			}
		}
	}

	async fn tick(&self) -> anyhow::Result<()> {
		let latest_slot = self.pool.get_slot(Commitment::Finalized).await?;

		self.verify_and_promote_tracked(latest_slot).await?;
		self.promote_pending_events(latest_slot).await?;
		Ok(())
	}

	async fn verify_and_promote_tracked(&self, latest_slot: u64) -> anyhow::Result<()> {
		let tracked =
			self.transactions.list_tracked(&[TxStatus::Pending, TxStatus::FastConfirmed]).await?;
		for mut tx in tracked {
			if let Err(e) = self.reorg.verify(&mut tx).await {
				tracing::warn!(tx_hash = %tx.tx_hash, error = %e, "reorg check failed");
				continue;
			}
			tracker::apply_thresholds(&mut tx, latest_slot, &self.confirmations);
			if let Err(e) = self.transactions.update_chain_transaction(tx).await {
				tracing::warn!(error = %e, "failed to persist chain transaction update");
			}
		}
		Ok(())
	}

	async fn promote_pending_events(&self, latest_slot: u64) -> anyhow::Result<()> {
		let pending = self.events.get_pending_events(MAX_EVENTS_PER_TICK).await?;
		for event in pending {
			if event.block_height == 0 {
				continue;
			}
			let signature_str = event.signature().to_string();
			let Ok(signature) = Signature::from_str(&signature_str) else { continue };

			let config = RpcTransactionConfig {
				encoding: Some(UiTransactionEncoding::Base64),
				commitment: Some(Commitment::Finalized),
				max_supported_transaction_version: Some(0),
			};
			let tx = match self.pool.get_transaction(signature, config).await {
				Ok(Some(tx)) => tx,
				Ok(None) => continue,
				Err(e) => {
					tracing::warn!(signature = %signature_str, error = %e, "get_transaction failed during confirmation");
					continue;
				},
			};
			let tx_slot = if tx.slot > 0 { tx.slot } else { event.block_height };

			let required = required_depth(event.confirmation_type, &self.confirmations);
			if latest_slot.saturating_sub(tx_slot) >= required {
				match self
					.events
					.update_event_status(&event.event_id, EventStatus::Pending, EventStatus::Confirmed)
					.await
				{
					Ok(_) => {},
					Err(e) => tracing::warn!(event_id = %event.event_id, error = %e, "failed to promote event"),
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn required_depth_matches_configured_thresholds() {
		let confirmations = BlockConfirmations { fast: 5, standard: 12 };
		assert_eq!(required_depth(ConfirmationLabel::Fast, &confirmations), 5);
		assert_eq!(required_depth(ConfirmationLabel::Standard, &confirmations), 12);
	}
}
