//! Outbound TSS Message Builder (C9): reconstructs the exact byte layout the TSS group signs
//! (spec §4.5).
//!
//! Endianness is deliberately asymmetric (spec §9 "Endianness"): decoded on-chain events are
//! little-endian, but every multi-byte integer in the TSS message is big-endian. Getting this
//! backwards anywhere makes the on-chain `secp256k1_recover` derive the wrong address.

use sha3::{Digest as _, Keccak256};
use sol_prim::{pda, Address};

use crate::errors::SvmAdapterError;

const MESSAGE_PREFIX: &[u8] = b"PUSH_CHAIN_SVM";
const MAX_EXECUTE_PAYLOAD_ACCOUNTS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundTxType {
	Funds,
	FundsAndPayload,
	GasAndPayload,
	InboundRevert,
}

/// The asset being moved: native SOL, or an SPL mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
	NativeSol,
	Spl(Address),
}

impl Asset {
	pub fn is_native(self) -> bool {
		matches!(self, Self::NativeSol)
	}
}

/// One decoded entry of an Execute payload's accounts list (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadAccount {
	pub pubkey: Address,
	pub is_writable: bool,
}

/// The Execute payload's decoded fields (spec §6 "Execute payload layout").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutePayload {
	pub accounts: Vec<PayloadAccount>,
	pub ix_data: Vec<u8>,
	pub rent_fee: u64,
	pub instruction_id: u8,
}

/// Parses the big-endian, length-prefixed Execute payload and validates it against spec §6:
/// total length must be at least 17 bytes, `instruction_id` must be 1 or 2, `rent_fee <=
/// gas_fee`, and for `instruction_id == 1` every variable-length part must be empty/zero.
pub fn parse_execute_payload(bytes: &[u8], gas_fee: u64) -> Result<ExecutePayload, SvmAdapterError> {
	if bytes.len() < 17 {
		return Err(SvmAdapterError::Truncated { field: "execute_payload" });
	}
	let mut pos = 0usize;
	let take = |pos: &mut usize, n: usize| -> Result<&[u8], SvmAdapterError> {
		if bytes.len() < *pos + n {
			return Err(SvmAdapterError::Truncated { field: "execute_payload" });
		}
		let slice = &bytes[*pos..*pos + n];
		*pos += n;
		Ok(slice)
	};

	let accounts_count = u32::from_be_bytes(take(&mut pos, 4)?.try_into().unwrap()) as usize;
	if accounts_count > MAX_EXECUTE_PAYLOAD_ACCOUNTS {
		return Err(SvmAdapterError::Truncated { field: "execute_payload.accounts_count" });
	}
	let mut accounts = Vec::with_capacity(accounts_count);
	for _ in 0..accounts_count {
		let pubkey_bytes: [u8; 32] = take(&mut pos, 32)?.try_into().unwrap();
		let is_writable = take(&mut pos, 1)?[0] != 0;
		accounts.push(PayloadAccount { pubkey: Address::new(pubkey_bytes), is_writable });
	}

	let ix_data_len = u32::from_be_bytes(take(&mut pos, 4)?.try_into().unwrap()) as usize;
	let ix_data = take(&mut pos, ix_data_len)?.to_vec();

	let rent_fee = u64::from_be_bytes(take(&mut pos, 8)?.try_into().unwrap());
	let instruction_id = take(&mut pos, 1)?[0];

	if instruction_id != 1 && instruction_id != 2 {
		return Err(SvmAdapterError::InvalidInstructionId);
	}
	if rent_fee > gas_fee {
		return Err(SvmAdapterError::RentFeeExceedsGasFee);
	}
	if instruction_id == 1 && (accounts_count != 0 || ix_data_len != 0 || rent_fee != 0) {
		return Err(SvmAdapterError::InvalidInstructionId);
	}

	Ok(ExecutePayload { accounts, ix_data, rent_fee, instruction_id })
}

/// Picks the instruction id per spec §4.5's table, letting a non-empty/non-zero pre-encoded
/// Execute payload supersede the TxType-derived id 1/2.
pub fn determine_instruction_id(
	tx_type: OutboundTxType,
	asset: Asset,
	payload: &[u8],
	gas_fee: u64,
	amount: u64,
) -> Result<(u8, Option<ExecutePayload>), SvmAdapterError> {
	let payload_is_present = payload.iter().any(|&b| b != 0);

	if payload_is_present {
		let parsed = parse_execute_payload(payload, gas_fee)?;
		if parsed.instruction_id == 1 && amount == 0 {
			return Err(SvmAdapterError::InvalidInstructionId);
		}
		return Ok((parsed.instruction_id, Some(parsed)));
	}

	let id = match tx_type {
		OutboundTxType::Funds => 1,
		OutboundTxType::FundsAndPayload | OutboundTxType::GasAndPayload => 2,
		OutboundTxType::InboundRevert if asset.is_native() => 3,
		OutboundTxType::InboundRevert => 4,
	};
	Ok((id, None))
}

/// Reads the on-chain TSS PDA account's raw layout (spec §4.5 "TssPda read layout"):
/// `discriminator(8) | tss_eth_address(20) | chain_id (Borsh string) | nonce(8) | authority(32) |
/// bump(1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TssPdaState {
	pub tss_eth_address: [u8; 20],
	pub chain_id: String,
	pub nonce: u64,
	pub authority: [u8; 32],
	pub bump: u8,
}

impl TssPdaState {
	pub fn read(data: &[u8]) -> Result<Self, SvmAdapterError> {
		let mut pos = 0usize;
		let take = |pos: &mut usize, n: usize| -> Result<&[u8], SvmAdapterError> {
			if data.len() < *pos + n {
				return Err(SvmAdapterError::Truncated { field: "tss_pda" });
			}
			let slice = &data[*pos..*pos + n];
			*pos += n;
			Ok(slice)
		};

		let _discriminator = take(&mut pos, 8)?;
		let tss_eth_address: [u8; 20] = take(&mut pos, 20)?.try_into().unwrap();
		let chain_id_len = u32::from_le_bytes(take(&mut pos, 4)?.try_into().unwrap()) as usize;
		let chain_id = String::from_utf8(take(&mut pos, chain_id_len)?.to_vec())
			.map_err(|_| SvmAdapterError::Truncated { field: "tss_pda.chain_id" })?;
		let nonce = u64::from_le_bytes(take(&mut pos, 8)?.try_into().unwrap());
		let authority: [u8; 32] = take(&mut pos, 32)?.try_into().unwrap();
		let bump = take(&mut pos, 1)?[0];

		Ok(Self { tss_eth_address, chain_id, nonce, authority, bump })
	}
}

/// All program-derived addresses the builder and assembler need, grounded under one gateway
/// program id (spec §4.5 PDA table).
#[derive(Debug, Clone, Copy)]
pub struct GatewayPdas {
	pub gateway_program: Address,
	pub ata_program: Address,
}

impl GatewayPdas {
	pub fn config(&self) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_program_address(&[b"config"], &self.gateway_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub fn vault(&self) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_program_address(&[b"vault"], &self.gateway_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub fn tss(&self) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_program_address(&[b"tsspda"], &self.gateway_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub fn whitelist(&self) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_program_address(&[b"whitelist"], &self.gateway_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub fn executed_tx(&self, tx_id: &[u8; 32]) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_program_address(&[b"executed_tx", tx_id], &self.gateway_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub fn cea_authority(&self, sender20: &[u8; 20]) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_program_address(&[b"push_identity", sender20], &self.gateway_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub fn token_vault(&self, mint: &Address) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_program_address(&[b"token_vault", mint.as_bytes()], &self.gateway_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	pub fn associated_token_account(
		&self,
		owner: &Address,
		token_program: &Address,
		mint: &Address,
	) -> Result<(Address, u8), SvmAdapterError> {
		pda::find_associated_token_address(owner, token_program, mint, &self.ata_program)
			.map_err(|e| SvmAdapterError::Other(e.into()))
	}
}

fn push_be32(buf: &mut Vec<u8>, address: &Address) {
	buf.extend_from_slice(address.as_bytes());
}

/// Builds the id-1/id-2 tail shared by withdraw and execute (spec §4.5): `tx_id | universal_tx_id
/// | sender | token | gas_fee BE | target_program`, with the execute-only accounts/ix_data/rent_fee
/// suffix appended when `execute` is `Some`.
#[allow(clippy::too_many_arguments)]
fn withdraw_or_execute_tail(
	tx_id: &[u8; 32],
	universal_tx_id: &[u8; 32],
	sender: &[u8; 20],
	token: Option<&Address>,
	gas_fee: u64,
	target_program: &Address,
	execute: Option<&ExecutePayload>,
) -> Vec<u8> {
	let mut buf = Vec::new();
	buf.extend_from_slice(tx_id);
	buf.extend_from_slice(universal_tx_id);
	buf.extend_from_slice(sender);
	match token {
		Some(mint) => push_be32(&mut buf, mint),
		None => buf.extend_from_slice(&[0u8; 32]),
	}
	buf.extend_from_slice(&gas_fee.to_be_bytes());
	push_be32(&mut buf, target_program);

	if let Some(payload) = execute {
		buf.extend_from_slice(&(payload.accounts.len() as u32).to_be_bytes());
		for account in &payload.accounts {
			push_be32(&mut buf, &account.pubkey);
			buf.push(u8::from(account.is_writable));
		}
		buf.extend_from_slice(&(payload.ix_data.len() as u32).to_be_bytes());
		buf.extend_from_slice(&payload.ix_data);
		buf.extend_from_slice(&payload.rent_fee.to_be_bytes());
	}
	buf
}

/// Builds the id-3 (revert native SOL) tail: `universal_tx_id | tx_id | recipient | gas_fee BE`.
/// Note the reversed id order versus ids 1/2 (spec §4.5).
fn revert_sol_tail(universal_tx_id: &[u8; 32], tx_id: &[u8; 32], recipient: &Address, gas_fee: u64) -> Vec<u8> {
	let mut buf = Vec::new();
	buf.extend_from_slice(universal_tx_id);
	buf.extend_from_slice(tx_id);
	push_be32(&mut buf, recipient);
	buf.extend_from_slice(&gas_fee.to_be_bytes());
	buf
}

/// Builds the id-4 (revert SPL) tail: `universal_tx_id | tx_id | mint | recipient | gas_fee BE`.
fn revert_spl_tail(
	universal_tx_id: &[u8; 32],
	tx_id: &[u8; 32],
	mint: &Address,
	recipient: &Address,
	gas_fee: u64,
) -> Vec<u8> {
	let mut buf = Vec::new();
	buf.extend_from_slice(universal_tx_id);
	buf.extend_from_slice(tx_id);
	push_be32(&mut buf, mint);
	push_be32(&mut buf, recipient);
	buf.extend_from_slice(&gas_fee.to_be_bytes());
	buf
}

pub enum MessageTail<'a> {
	WithdrawOrExecute {
		tx_id: &'a [u8; 32],
		universal_tx_id: &'a [u8; 32],
		sender: &'a [u8; 20],
		token: Option<&'a Address>,
		gas_fee: u64,
		target_program: &'a Address,
		execute: Option<&'a ExecutePayload>,
	},
	RevertSol {
		universal_tx_id: &'a [u8; 32],
		tx_id: &'a [u8; 32],
		recipient: &'a Address,
		gas_fee: u64,
	},
	RevertSpl {
		universal_tx_id: &'a [u8; 32],
		tx_id: &'a [u8; 32],
		mint: &'a Address,
		recipient: &'a Address,
		gas_fee: u64,
	},
}

/// Constructs the exact byte layout the TSS group signs and returns its keccak256 digest (spec
/// §4.5): `"PUSH_CHAIN_SVM" | instruction_id | chain_id (raw UTF-8) | nonce BE | amount BE | tail`.
pub fn construct_tss_message(
	instruction_id: u8,
	chain_id: &str,
	nonce: u64,
	amount: u64,
	tail: &MessageTail,
) -> [u8; 32] {
	let mut buf = Vec::new();
	buf.extend_from_slice(MESSAGE_PREFIX);
	buf.push(instruction_id);
	buf.extend_from_slice(chain_id.as_bytes());
	buf.extend_from_slice(&nonce.to_be_bytes());
	buf.extend_from_slice(&amount.to_be_bytes());

	let tail_bytes = match tail {
		MessageTail::WithdrawOrExecute { tx_id, universal_tx_id, sender, token, gas_fee, target_program, execute } =>
			withdraw_or_execute_tail(tx_id, universal_tx_id, sender, *token, *gas_fee, target_program, *execute),
		MessageTail::RevertSol { universal_tx_id, tx_id, recipient, gas_fee } =>
			revert_sol_tail(universal_tx_id, tx_id, recipient, *gas_fee),
		MessageTail::RevertSpl { universal_tx_id, tx_id, mint, recipient, gas_fee } =>
			revert_spl_tail(universal_tx_id, tx_id, mint, recipient, *gas_fee),
	};
	buf.extend_from_slice(&tail_bytes);

	let digest = Keccak256::digest(&buf);
	digest.as_slice().try_into().expect("keccak256 digest is always 32 bytes")
}
