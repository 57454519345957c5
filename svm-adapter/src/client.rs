//! Chain Client Facade (C11): the single entry point the universal client holds for this chain
//! (spec §4.7). Owns a long-lived internal cancellation context that background components run
//! under — deliberately never derived from a caller's short-lived request context, so a slow
//! caller cannot tear down the listener/confirmer loops out from under the adapter (spec §9).

use std::{str::FromStr, sync::Arc};

use sol_prim::{Address, Digest, Signature};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
	config::ChainConfig,
	confirmer::EventConfirmer,
	db::{EventStore, TransactionStore, TssOracle},
	errors::SvmAdapterError,
	event::{ChainTransaction, ConfirmationLabel, TxStatus},
	event_parser::EventParser,
	listener::EventListener,
	outbound::{
		assembler::OutboundAssembler,
		message::{GatewayPdas, MessageTail},
	},
	relayer_key,
	rpc_pool::RpcPool,
};

pub struct ChainClient {
	config: ChainConfig,
	pool: RpcPool,
	events: Arc<dyn EventStore>,
	transactions: Arc<dyn TransactionStore>,
	tss: Arc<dyn TssOracle>,
	gateway_pdas: GatewayPdas,
	root_token: Option<CancellationToken>,
	tasks: Vec<JoinHandle<()>>,
	assembler: Option<OutboundAssembler>,
}

impl ChainClient {
	pub fn new(
		config: ChainConfig,
		events: Arc<dyn EventStore>,
		transactions: Arc<dyn TransactionStore>,
		tss: Arc<dyn TssOracle>,
	) -> Result<Self, SvmAdapterError> {
		let pool = RpcPool::new(config.rpc_urls.clone(), Some(config.chain_id.reference.clone()))
			.map_err(|e| SvmAdapterError::Other(e.into()))?;
		let ata_program = Address::from_str(sol_prim::consts::ATA_PROGRAM_ID_B58)
			.expect("hardcoded ATA program id is valid base58");
		let gateway_pdas = GatewayPdas { gateway_program: config.gateway_program, ata_program };

		Ok(Self {
			config,
			pool,
			events,
			transactions,
			tss,
			gateway_pdas,
			root_token: None,
			tasks: Vec::new(),
			assembler: None,
		})
	}

	/// Starts components in order C2 (already live at construction) -> C5 -> C6; C9/C10 are built
	/// here but only exercised on demand via [`Self::assemble_and_broadcast`].
	pub async fn start(&mut self) -> Result<(), SvmAdapterError> {
		let root_token = CancellationToken::new();

		let relayer = relayer_key::load(&self.config.relayer_key_path())?;
		self.assembler = Some(OutboundAssembler::new(self.gateway_pdas, self.pool.clone(), relayer));

		let parser = EventParser::new(
			self.config.chain_id.to_string(),
			self.config.gateway_program,
			self.config.discriminator_map(),
		);
		let listener = EventListener::new(
			self.pool.clone(),
			parser,
			self.events.clone(),
			self.config.gateway_program,
			self.config.chain_id.to_string(),
			std::time::Duration::from_secs(self.config.event_polling_interval_seconds),
			self.config.event_start_from,
		);
		let listener_token = root_token.child_token();
		self.tasks.push(tokio::spawn(async move {
			if let Err(e) = listener.run(listener_token).await {
				tracing::error!(error = %e, "event listener exited with error");
			}
		}));

		let confirmer = EventConfirmer::new(
			self.pool.clone(),
			self.events.clone(),
			self.transactions.clone(),
			self.config.confirmations.clone(),
			std::time::Duration::from_secs(self.config.poll_interval_seconds),
		);
		let confirmer_token = root_token.child_token();
		self.tasks.push(tokio::spawn(async move {
			if let Err(e) = confirmer.run(confirmer_token).await {
				tracing::error!(error = %e, "event confirmer exited with error");
			}
		}));

		let health_check_pool = self.pool.clone();
		let health_check_interval = std::time::Duration::from_secs(self.config.health_check_interval_seconds);
		let health_token = root_token.child_token();
		self.tasks.push(tokio::spawn(async move {
			health_check_pool.run_health_check_loop(health_check_interval, health_token).await;
		}));

		self.root_token = Some(root_token);
		Ok(())
	}

	/// Signals the stop token, then joins background tasks in reverse start order (spec §4.7).
	pub async fn stop(&mut self) {
		if let Some(token) = self.root_token.take() {
			token.cancel();
		}
		while let Some(task) = self.tasks.pop() {
			if let Err(e) = task.await {
				tracing::warn!(error = %e, "background task panicked during shutdown");
			}
		}
		self.assembler = None;
	}

	/// Healthy iff the internal context is live and enough endpoints are reachable (spec §4.7).
	pub async fn is_healthy(&self) -> bool {
		let context_live = self.root_token.as_ref().is_some_and(|t| !t.is_cancelled());
		context_live && self.pool.healthy_endpoint_count().await >= self.config.min_healthy_endpoints
	}

	pub async fn get_genesis_hash(&self) -> Result<Digest, SvmAdapterError> {
		self.pool.get_genesis_hash().await.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub async fn get_slot(&self) -> Result<u64, SvmAdapterError> {
		self.pool
			.get_slot(solana_rpc::types::Commitment::Finalized)
			.await
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	/// Solana has no separate "block" concept distinct from its slot sequence; this is the slot
	/// alias the facade's generic chain interface expects.
	pub async fn get_latest_block(&self) -> Result<u64, SvmAdapterError> {
		self.get_slot().await
	}

	#[allow(clippy::too_many_arguments)]
	pub async fn assemble_and_broadcast(
		&self,
		request: crate::outbound::assembler::OutboundRequest,
		message_hash: [u8; 32],
		tss_signature: [u8; 64],
		tss_eth_address: [u8; 20],
		nonce: u64,
	) -> Result<Signature, SvmAdapterError> {
		let assembler = self.assembler.as_ref().ok_or(SvmAdapterError::NilConfig)?;
		let method = request.method_name();
		let event_id = format!("outbound:{}", hex::encode(request.universal_tx_id()));
		let tx_hash = assembler.assemble_and_broadcast(request, message_hash, tss_signature, tss_eth_address, nonce).await?;

		let block_number = self.get_slot().await.unwrap_or(0);
		if let Err(e) = self
			.transactions
			.save_chain_transaction(ChainTransaction {
				tx_hash: tx_hash.to_string(),
				block_number,
				method: method.to_string(),
				event_id,
				confirmations: 0,
				status: TxStatus::Pending,
				confirmation_type: ConfirmationLabel::Standard,
				chain_id: self.config.chain_id.to_string(),
			})
			.await
		{
			tracing::warn!(error = %e, tx_hash = %tx_hash, "failed to persist broadcast transaction for confirmation tracking");
		}

		Ok(tx_hash)
	}

	pub async fn verify_broadcasted_tx(&self, tx_hash: &str) -> Result<Option<(u64, u8)>, SvmAdapterError> {
		let assembler = self.assembler.as_ref().ok_or(SvmAdapterError::NilConfig)?;
		assembler.verify_broadcasted_tx(tx_hash).await
	}

	/// Requests a signature from the TSS oracle over the message this request commits to, then
	/// assembles and broadcasts the resulting transaction in one call.
	pub async fn sign_and_broadcast(
		&self,
		request: crate::outbound::assembler::OutboundRequest,
		instruction_id: u8,
		nonce: u64,
		amount: u64,
		tss_eth_address: [u8; 20],
	) -> Result<Signature, SvmAdapterError> {
		let hash = self.construct_tss_message_hash(instruction_id, nonce, amount, &request.message_tail());
		let signature = self.tss.sign(hash).await.map_err(|e| SvmAdapterError::Other(e.into()))?;
		self.assemble_and_broadcast(request, hash, signature, tss_eth_address, nonce).await
	}

	/// Constructs the TSS message hash for a pending outbound request, ahead of requesting a
	/// signature from the TSS oracle (spec §4.5/§4.7).
	pub fn construct_tss_message_hash(
		&self,
		instruction_id: u8,
		nonce: u64,
		amount: u64,
		tail: &MessageTail,
	) -> [u8; 32] {
		crate::outbound::message::construct_tss_message(
			instruction_id,
			&self.config.chain_id.to_string(),
			nonce,
			amount,
			tail,
		)
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use crate::{
		chain_id::SolanaChainId,
		config::BlockConfirmations,
		db::{MockEventStore, MockTransactionStore, MockTssOracle},
	};

	use super::*;

	fn config() -> ChainConfig {
		ChainConfig {
			chain_id: SolanaChainId::parse("solana:H").unwrap(),
			gateway_program: Address::from_str("11111111111111111111111111111111").unwrap(),
			rpc_urls: vec!["http://localhost:8899".into()],
			methods: vec![],
			confirmations: BlockConfirmations::default(),
			event_polling_interval_seconds: 5,
			poll_interval_seconds: 5,
			event_start_from: -1,
			min_healthy_endpoints: 1,
			health_check_interval_seconds: 15,
			node_home: PathBuf::from("."),
		}
	}

	#[tokio::test]
	async fn unstarted_client_is_never_healthy() {
		let client = ChainClient::new(
			config(),
			Arc::new(MockEventStore::new()),
			Arc::new(MockTransactionStore::new()),
			Arc::new(MockTssOracle::new()),
		)
		.unwrap();
		assert!(!client.is_healthy().await);
	}
}
