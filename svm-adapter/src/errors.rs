//! The closed set of errors a caller is expected to match on. Steady-state errors (decode,
//! reorg, transport) are always recoverable; only the configuration-error family can be fatal,
//! and only at construction time (spec §7).

#[derive(Debug, thiserror::Error)]
pub enum SvmAdapterError {
	#[error("invalid CAIP-2 format")]
	InvalidCaip2,
	#[error("not a Solana chain")]
	NotSolanaChain,
	#[error("empty genesis hash")]
	EmptyGenesisHash,
	#[error("config is nil")]
	NilConfig,
	#[error("invalid VM type for Solana client")]
	InvalidVmType,
	#[error("no RPC URLs configured")]
	NoRpcUrlsConfigured,
	#[error("unknown event discriminator")]
	UnknownDiscriminator,
	#[error("not enough data for {field}")]
	Truncated { field: &'static str },
	#[error("rent_fee exceeds gas_fee")]
	RentFeeExceedsGasFee,
	#[error("invalid instruction_id")]
	InvalidInstructionId,
	#[error("failed to determine recovery ID for signature")]
	RecoveryIdNotFound,
	#[error("invalid base58 address: {0}")]
	InvalidAddress(String),
	#[error("invalid recipient: {0}")]
	InvalidRecipient(String),
	#[error("amount out of range: {0}")]
	AmountOutOfRange(String),
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}
