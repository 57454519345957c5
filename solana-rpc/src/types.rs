use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const ACCOUNT_ADDRESS_LEN: usize = 32;

pub type JsValue = serde_json::Value;

/// Solana commitment levels, in increasing order of finality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
	Processed = 1,
	Confirmed = 2,
	Finalized = 3,
}

impl Default for Commitment {
	fn default() -> Self {
		Self::Finalized
	}
}

const PROCESSED: &str = "processed";
const CONFIRMED: &str = "confirmed";
const FINALIZED: &str = "finalized";

impl FromStr for Commitment {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			PROCESSED => Ok(Self::Processed),
			CONFIRMED => Ok(Self::Confirmed),
			FINALIZED => Ok(Self::Finalized),
			invalid => Err(format!(
				"Invalid commitment: {invalid}. Expected {PROCESSED}|{CONFIRMED}|{FINALIZED}"
			)),
		}
	}
}

impl fmt::Display for Commitment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Processed => PROCESSED,
			Self::Confirmed => CONFIRMED,
			Self::Finalized => FINALIZED,
		}
		.fmt(f)
	}
}

/// Required confirmation depth (in slots) for a given confirmation type, and the commitment
/// level used when the depth is queried against a live node rather than computed locally.
impl Commitment {
	pub fn required_depth_fast(self) -> u64 {
		match self {
			Self::Processed => 1,
			Self::Confirmed => 5,
			Self::Finalized => 12,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseContext {
	pub slot: u64,
	#[serde(flatten)]
	pub extra: HashMap<String, JsValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response<Value> {
	pub context: ResponseContext,
	pub value: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum UiTransactionEncoding {
	Base58,
	Base64,
	Json,
	JsonParsed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransactionConfig {
	pub encoding: Option<UiTransactionEncoding>,
	pub commitment: Option<Commitment>,
	pub max_supported_transaction_version: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSignaturesForAddressConfig {
	pub before: Option<String>,
	pub until: Option<String>,
	pub limit: Option<usize>,
	pub commitment: Option<Commitment>,
	pub min_context_slot: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSignatureStatusConfig {
	pub search_transaction_history: bool,
}
