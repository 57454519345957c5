use std::str::FromStr;

use async_trait::async_trait;
use jsonrpsee::{
	core::client::ClientT,
	http_client::{HttpClient, HttpClientBuilder},
	rpc_params,
};
use sol_prim::{Address, Digest, Signature};

use crate::{
	error::Error,
	responses::{
		EncodedConfirmedTransactionWithStatusMeta, LatestBlockhash, SignatureInfo,
		TransactionStatus, UiAccount,
	},
	traits::{
		SolanaGetAccountInfo, SolanaGetGenesisHash, SolanaGetHealth, SolanaGetLatestBlockhash,
		SolanaGetSignatureStatuses, SolanaGetSignaturesForAddress, SolanaGetSlot,
		SolanaGetTransaction, SolanaSendTransaction,
	},
	types::{Commitment, Response, RpcSignatureStatusConfig, RpcSignaturesForAddressConfig,
		RpcTransactionConfig},
};

/// A single Solana JSON-RPC HTTP endpoint. One [`SolanaClient`] per endpoint URL — pooling and
/// failover across endpoints is the RPC Pool Adapter's job, not this client's.
#[derive(Clone)]
pub struct SolanaClient {
	inner: HttpClient,
	url: String,
}

impl SolanaClient {
	pub fn new(url: impl Into<String>) -> Result<Self, Error> {
		let url = url.into();
		let inner = HttpClientBuilder::default()
			.build(&url)
			.map_err(|e| Error::transport(e.to_string()))?;
		Ok(Self { inner, url })
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	async fn call<T: serde::de::DeserializeOwned>(
		&self,
		method: &str,
		params: jsonrpsee::core::params::ArrayParams,
	) -> Result<T, Error> {
		self.inner.request(method, params).await.map_err(|e| Error::transport(e.to_string()))
	}
}

#[async_trait]
impl SolanaGetHealth for SolanaClient {
	async fn get_health(&self) -> Result<(), Error> {
		let status: String = self.call("getHealth", rpc_params![]).await?;
		if status == "ok" {
			Ok(())
		} else {
			Err(Error::Malformed(format!("unhealthy: {status}")))
		}
	}
}

#[async_trait]
impl SolanaGetSlot for SolanaClient {
	async fn get_slot(&self, commitment: Commitment) -> Result<u64, Error> {
		self.call("getSlot", rpc_params![serde_json::json!({ "commitment": commitment })]).await
	}
}

#[async_trait]
impl SolanaGetGenesisHash for SolanaClient {
	async fn get_genesis_hash(&self) -> Result<Digest, Error> {
		let hash: String = self.call("getGenesisHash", rpc_params![]).await?;
		Digest::from_str(&hash).map_err(|e| Error::Malformed(e.to_string()))
	}
}

#[async_trait]
impl SolanaGetSignaturesForAddress for SolanaClient {
	async fn get_signatures_for_address(
		&self,
		address: &Address,
		config: RpcSignaturesForAddressConfig,
	) -> Result<Vec<SignatureInfo>, Error> {
		self.call(
			"getSignaturesForAddress",
			rpc_params![address.to_string(), config],
		)
		.await
	}
}

#[async_trait]
impl SolanaGetTransaction for SolanaClient {
	async fn get_transaction(
		&self,
		signature: &Signature,
		config: RpcTransactionConfig,
	) -> Result<Option<EncodedConfirmedTransactionWithStatusMeta>, Error> {
		self.call("getTransaction", rpc_params![signature.to_string(), config]).await
	}
}

#[async_trait]
impl SolanaGetSignatureStatuses for SolanaClient {
	async fn get_signature_statuses(
		&self,
		signatures: &[Signature],
		config: RpcSignatureStatusConfig,
	) -> Result<Response<Vec<Option<TransactionStatus>>>, Error> {
		let sigs: Vec<String> = signatures.iter().map(ToString::to_string).collect();
		self.call("getSignatureStatuses", rpc_params![sigs, config]).await
	}
}

#[async_trait]
impl SolanaGetAccountInfo for SolanaClient {
	async fn get_account_info(&self, address: &Address) -> Result<Option<UiAccount>, Error> {
		self.call(
			"getAccountInfo",
			rpc_params![address.to_string(), serde_json::json!({ "encoding": "base64" })],
		)
		.await
	}
}

#[async_trait]
impl SolanaGetLatestBlockhash for SolanaClient {
	async fn get_latest_blockhash(
		&self,
		commitment: Commitment,
	) -> Result<Response<LatestBlockhash>, Error> {
		self.call(
			"getLatestBlockhash",
			rpc_params![serde_json::json!({ "commitment": commitment })],
		)
		.await
	}
}

#[async_trait]
impl SolanaSendTransaction for SolanaClient {
	async fn send_transaction(&self, transaction: String) -> Result<Signature, Error> {
		let sig: String = self
			.call(
				"sendTransaction",
				rpc_params![transaction, serde_json::json!({ "encoding": "base64" })],
			)
			.await?;
		Signature::from_str(&sig).map_err(|e| Error::Malformed(e.to_string()))
	}
}
