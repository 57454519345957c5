use serde::{Deserialize, Serialize};

use crate::types::JsValue;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlockhash {
	pub blockhash: String,
	pub last_valid_block_height: u64,
}

/// One entry returned by `getSignaturesForAddress`, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
	pub signature: String,
	pub slot: u64,
	pub err: Option<JsValue>,
	pub memo: Option<String>,
	pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
	pub slot: u64,
	pub confirmations: Option<u64>,
	pub err: Option<JsValue>,
	pub confirmation_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
	pub err: Option<JsValue>,
	pub log_messages: Option<Vec<String>>,
}

/// A transaction as returned by `getTransaction` with `encoding=base64`: only the pieces the
/// adapter actually reads are modeled (the raw encoded transaction body is not, since the
/// adapter never needs to deserialize it — only the log messages and metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedConfirmedTransactionWithStatusMeta {
	pub slot: u64,
	pub meta: Option<TransactionMeta>,
	pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAccount {
	pub lamports: u64,
	/// `[base64_data, "base64"]` as returned by the node with `encoding=base64`.
	pub data: (String, String),
	pub owner: String,
	pub executable: bool,
	pub rent_epoch: u64,
}
