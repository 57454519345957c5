//! Configuration surface, layered with the `config` crate the way `engine/src/settings.rs`
//! layers a TOML file over defaults. Constructing a [`ChainConfig`] either yields a fully
//! validated configuration or fails loudly (spec §3, ChainConfig invariant).

use std::{path::PathBuf, str::FromStr};

use serde::Deserialize;
use sol_prim::Address;

use crate::{chain_id::SolanaChainId, errors::SvmAdapterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfirmationType {
	Fast,
	Standard,
}

impl ConfirmationType {
	pub fn as_label(self) -> &'static str {
		match self {
			Self::Fast => "FAST",
			Self::Standard => "STANDARD",
		}
	}
}

/// One entry of the gateway program's event table: an 8-byte discriminator (hex-encoded in
/// config) mapped to a human name and a confirmation type.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayMethod {
	pub name: String,
	#[serde(deserialize_with = "deserialize_hex_discriminator")]
	pub event_identifier: [u8; 8],
	pub confirmation_type: ConfirmationType,
}

fn deserialize_hex_discriminator<'de, D>(deserializer: D) -> Result<[u8; 8], D::Error>
where
	D: serde::Deserializer<'de>,
{
	let s = String::deserialize(deserializer)?;
	let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
	bytes.try_into().map_err(|_| serde::de::Error::custom("discriminator must be 8 bytes"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockConfirmations {
	pub fast: u64,
	pub standard: u64,
}

impl Default for BlockConfirmations {
	fn default() -> Self {
		Self { fast: 5, standard: 12 }
	}
}

fn default_event_poll_secs() -> u64 {
	5
}
fn default_confirmer_poll_secs() -> u64 {
	5
}
fn default_event_start_from() -> i64 {
	-1
}
fn default_min_healthy_endpoints() -> usize {
	1
}
fn default_health_check_interval_secs() -> u64 {
	15
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChainConfig {
	pub chain_id: String,
	pub gateway_program: String,
	pub rpc_urls: Vec<String>,
	pub methods: Vec<GatewayMethod>,
	#[serde(default)]
	pub confirmations: BlockConfirmations,
	#[serde(default = "default_event_poll_secs")]
	pub event_polling_interval_seconds: u64,
	#[serde(default = "default_confirmer_poll_secs")]
	pub poll_interval_seconds: u64,
	#[serde(default = "default_event_start_from")]
	pub event_start_from: i64,
	#[serde(default = "default_min_healthy_endpoints")]
	pub min_healthy_endpoints: usize,
	#[serde(default = "default_health_check_interval_secs")]
	pub health_check_interval_seconds: u64,
	pub node_home: Option<PathBuf>,
}

/// Validated chain configuration. Every field here is guaranteed well-formed; invalid input is
/// rejected in [`ChainConfig::try_from_raw`], never at use time.
#[derive(Debug, Clone)]
pub struct ChainConfig {
	pub chain_id: SolanaChainId,
	pub gateway_program: Address,
	pub rpc_urls: Vec<String>,
	pub methods: Vec<GatewayMethod>,
	pub confirmations: BlockConfirmations,
	pub event_polling_interval_seconds: u64,
	pub poll_interval_seconds: u64,
	pub event_start_from: i64,
	pub min_healthy_endpoints: usize,
	pub health_check_interval_seconds: u64,
	pub node_home: PathBuf,
}

impl ChainConfig {
	pub fn try_from_raw(raw: RawChainConfig) -> Result<Self, SvmAdapterError> {
		let chain_id = SolanaChainId::parse(&raw.chain_id)?;
		let gateway_program = Address::from_str(&raw.gateway_program)
			.map_err(|e| SvmAdapterError::InvalidAddress(e.to_string()))?;
		if raw.rpc_urls.is_empty() {
			return Err(SvmAdapterError::NoRpcUrlsConfigured);
		}
		Ok(Self {
			chain_id,
			gateway_program,
			rpc_urls: raw.rpc_urls,
			methods: raw.methods,
			confirmations: raw.confirmations,
			event_polling_interval_seconds: raw.event_polling_interval_seconds,
			poll_interval_seconds: raw.poll_interval_seconds,
			event_start_from: raw.event_start_from,
			min_healthy_endpoints: raw.min_healthy_endpoints,
			health_check_interval_seconds: raw.health_check_interval_seconds,
			node_home: raw.node_home.unwrap_or_else(|| PathBuf::from(".")),
		})
	}

	/// Discriminator -> confirmation type map the Event Parser filters on (spec §4.3).
	pub fn discriminator_map(&self) -> std::collections::HashMap<[u8; 8], ConfirmationType> {
		self.methods.iter().map(|m| (m.event_identifier, m.confirmation_type)).collect()
	}

	pub fn required_confirmations(&self, ty: ConfirmationType) -> u64 {
		match ty {
			ConfirmationType::Fast => self.confirmations.fast,
			ConfirmationType::Standard => self.confirmations.standard,
		}
	}

	/// The namespace part of the CAIP-2 chain id (`"solana"`), used to locate the relayer key
	/// file at `<node_home>/relayer/<namespace>.json`.
	pub fn relayer_key_path(&self) -> PathBuf {
		self.node_home.join("relayer").join(format!("{}.json", "solana"))
	}
}

/// Layers a config file (TOML/YAML/JSON, by extension) under `SVM_ADAPTER_*` environment
/// overrides, the way `engine/src/settings.rs` layers the node's settings file over defaults.
pub fn load_raw_config(path: &std::path::Path) -> Result<RawChainConfig, SvmAdapterError> {
	let layered = config::Config::builder()
		.add_source(config::File::from(path.to_path_buf()))
		.add_source(config::Environment::with_prefix("SVM_ADAPTER").separator("__"))
		.build()
		.map_err(|e| SvmAdapterError::Other(e.into()))?;
	layered.try_deserialize().map_err(|e| SvmAdapterError::Other(e.into()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw() -> RawChainConfig {
		RawChainConfig {
			chain_id: "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d".into(),
			gateway_program: "11111111111111111111111111111111".into(),
			rpc_urls: vec!["http://localhost:8899".into()],
			methods: vec![],
			confirmations: BlockConfirmations::default(),
			event_polling_interval_seconds: 5,
			poll_interval_seconds: 5,
			event_start_from: -1,
			min_healthy_endpoints: 1,
			health_check_interval_seconds: 15,
			node_home: None,
		}
	}

	#[test]
	fn accepts_well_formed_config() {
		assert!(ChainConfig::try_from_raw(raw()).is_ok());
	}

	#[test]
	fn rejects_no_rpc_urls() {
		let mut r = raw();
		r.rpc_urls.clear();
		assert!(matches!(
			ChainConfig::try_from_raw(r),
			Err(SvmAdapterError::NoRpcUrlsConfigured)
		));
	}

	#[test]
	fn rejects_bad_chain_id() {
		let mut r = raw();
		r.chain_id = "ethereum:1".into();
		assert!(matches!(ChainConfig::try_from_raw(r), Err(SvmAdapterError::NotSolanaChain)));
	}

	#[test]
	fn loads_layered_config_from_toml_file() {
		let dir = std::env::temp_dir().join(format!("svm-adapter-config-test-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("chain.toml");
		std::fs::write(
			&path,
			r#"
chain_id = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d"
gateway_program = "11111111111111111111111111111111"
rpc_urls = ["http://localhost:8899"]
methods = []
"#,
		)
		.unwrap();

		let raw = load_raw_config(&path).unwrap();
		assert_eq!(raw.rpc_urls, vec!["http://localhost:8899".to_string()]);
		assert!(ChainConfig::try_from_raw(raw).is_ok());

		std::fs::remove_file(&path).ok();
		std::fs::remove_dir(&dir).ok();
	}
}
