use async_trait::async_trait;
use sol_prim::{Address, Digest, Signature};

use crate::{
	error::Error,
	responses::{
		EncodedConfirmedTransactionWithStatusMeta, LatestBlockhash, SignatureInfo,
		TransactionStatus, UiAccount,
	},
	types::{Commitment, Response, RpcSignatureStatusConfig, RpcSignaturesForAddressConfig,
		RpcTransactionConfig},
};

#[async_trait]
pub trait SolanaGetHealth {
	async fn get_health(&self) -> Result<(), Error>;
}

#[async_trait]
pub trait SolanaGetSlot {
	async fn get_slot(&self, commitment: Commitment) -> Result<u64, Error>;
}

#[async_trait]
pub trait SolanaGetGenesisHash {
	async fn get_genesis_hash(&self) -> Result<Digest, Error>;
}

#[async_trait]
pub trait SolanaGetSignaturesForAddress {
	async fn get_signatures_for_address(
		&self,
		address: &Address,
		config: RpcSignaturesForAddressConfig,
	) -> Result<Vec<SignatureInfo>, Error>;
}

#[async_trait]
pub trait SolanaGetTransaction {
	async fn get_transaction(
		&self,
		signature: &Signature,
		config: RpcTransactionConfig,
	) -> Result<Option<EncodedConfirmedTransactionWithStatusMeta>, Error>;
}

#[async_trait]
pub trait SolanaGetSignatureStatuses {
	async fn get_signature_statuses(
		&self,
		signatures: &[Signature],
		config: RpcSignatureStatusConfig,
	) -> Result<Response<Vec<Option<TransactionStatus>>>, Error>;
}

#[async_trait]
pub trait SolanaGetAccountInfo {
	async fn get_account_info(&self, address: &Address) -> Result<Option<UiAccount>, Error>;
}

#[async_trait]
pub trait SolanaGetLatestBlockhash {
	async fn get_latest_blockhash(
		&self,
		commitment: Commitment,
	) -> Result<Response<LatestBlockhash>, Error>;
}

#[async_trait]
pub trait SolanaSendTransaction {
	/// `transaction` is the wire-format (base64-encoded, fully signed) transaction body.
	async fn send_transaction(&self, transaction: String) -> Result<Signature, Error>;
}

blanket_impl!(
	SolanaApi,
	SolanaGetHealth,
	SolanaGetSlot,
	SolanaGetGenesisHash,
	SolanaGetSignaturesForAddress,
	SolanaGetTransaction,
	SolanaGetSignatureStatuses,
	SolanaGetAccountInfo,
	SolanaGetLatestBlockhash,
	SolanaSendTransaction
);
