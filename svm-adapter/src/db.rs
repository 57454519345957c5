//! The persistence surface this crate consumes, reduced to exactly the operations the
//! ingestion/confirmation pipeline needs (spec §9 "Interface abstraction for collaborators").
//! Modelled as a trait the way the teacher's `multisig::db::KeyDB` isolates storage behind a
//! narrow interface, so tests can swap in an in-memory double instead of a real database engine.

use async_trait::async_trait;

use crate::event::{ChainTransaction, Event};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("storage backend error: {0}")]
	Backend(#[from] anyhow::Error),
}

/// Outcome of an idempotent insert: duplicate `event_id`s are silently ignored (spec §3 Event
/// invariant, §8 property 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
	Inserted,
	AlreadyExists,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
	async fn insert_if_not_exists(&self, event: Event) -> Result<InsertOutcome, StoreError>;

	/// Conditional transition: succeeds only if the row is still in `from`. Returns `true` iff
	/// the row was transitioned.
	async fn update_event_status(
		&self,
		event_id: &str,
		from: crate::event::EventStatus,
		to: crate::event::EventStatus,
	) -> Result<bool, StoreError>;

	async fn get_pending_events(&self, limit: usize) -> Result<Vec<Event>, StoreError>;

	async fn get_chain_height(&self, chain_id: &str) -> Result<u64, StoreError>;

	async fn update_chain_height(&self, chain_id: &str, block: u64) -> Result<(), StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
	async fn find_chain_transaction(&self, tx_hash: &str) -> Result<Option<ChainTransaction>, StoreError>;

	async fn save_chain_transaction(&self, tx: ChainTransaction) -> Result<(), StoreError>;

	async fn update_chain_transaction(&self, tx: ChainTransaction) -> Result<(), StoreError>;

	async fn list_tracked(
		&self,
		statuses: &[crate::event::TxStatus],
	) -> Result<Vec<ChainTransaction>, StoreError>;
}

/// The TSS signing surface reduced to the one call this crate needs (spec §9): produce a
/// signature over a digest this crate already constructed. Retrying a failed signing round is an
/// upstream responsibility (spec §1 Non-goals).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TssOracle: Send + Sync {
	async fn sign(&self, message_hash: [u8; 32]) -> Result<[u8; 64], StoreError>;
}
