//! Outbound Assembler (C10): turns a TSS signature into a fully signed, broadcast Solana
//! transaction (spec §4.6).

use std::str::FromStr;

use borsh::BorshSerialize;
use ed25519_dalek::SigningKey;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use sha2::{Digest as _, Sha256};
use sha3::Keccak256;
use sol_prim::{Address, Signature as TxSignature};

use super::{
	message::{determine_instruction_id, Asset, ExecutePayload, GatewayPdas, MessageTail, OutboundTxType},
	wire::{self, Instruction, Message},
};
use crate::{errors::SvmAdapterError, rpc_pool::RpcPool};

const COMPUTE_BUDGET_PROGRAM_ID: &str = "ComputeBudget111111111111111111111111111111";
const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
const RENT_SYSVAR_ID: &str = "SysvarRent111111111111111111111111111111111";
const SET_COMPUTE_UNIT_LIMIT_IX: u8 = 2;
const ATA_CREATE_IDEMPOTENT_IX: u8 = 1;
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 200_000;

fn well_known(addr: &str) -> Address {
	addr.parse().expect("hardcoded program id is valid base58")
}

/// Brute-forces `v ∈ {0,1,2,3}` until the recovered public key's derived Ethereum address matches
/// `expected` (spec §4.6 "Recovery id search", property 8).
pub fn determine_recovery_id(
	hash: [u8; 32],
	sig: &[u8; 64],
	expected: &[u8; 20],
) -> Result<u8, SvmAdapterError> {
	let secp = secp256k1::Secp256k1::new();
	let message = secp256k1::Message::from_digest(hash);

	for v in 0..4u8 {
		let Ok(recid) = RecoveryId::from_i32(v as i32) else { continue };
		let Ok(recoverable) = RecoverableSignature::from_compact(sig, recid) else { continue };
		let Ok(pubkey) = secp.recover_ecdsa(&message, &recoverable) else { continue };
		let uncompressed = pubkey.serialize_uncompressed();
		let digest = Keccak256::digest(&uncompressed[1..]);
		let derived = &digest[12..32];
		if derived == expected {
			return Ok(v);
		}
	}
	Err(SvmAdapterError::RecoveryIdNotFound)
}

/// `sha256("global:" + method)[:8]` (spec §4.6 "Anchor discriminator").
pub fn anchor_discriminator(method: &str) -> [u8; 8] {
	let digest = Sha256::digest(format!("global:{method}").as_bytes());
	digest[..8].try_into().expect("sha256 digest is at least 8 bytes")
}

/// MSB-first bitpacking: for account index `i`, bit `(7 - i%8)` of byte `i/8` is 1 iff writable
/// (spec §8 property 9).
pub fn pack_writable_flags(writable: &[bool]) -> Vec<u8> {
	let mut out = vec![0u8; writable.len().div_ceil(8)];
	for (i, &is_writable) in writable.iter().enumerate() {
		if is_writable {
			out[i / 8] |= 1 << (7 - i % 8);
		}
	}
	out
}

/// Borsh's `Vec<u8>` encoding: u32 LE length prefix followed by the raw bytes — exactly the
/// `vec<u8>` fields in the instruction layout (spec §4.6).
fn borsh_vec(buf: &mut Vec<u8>, bytes: &[u8]) {
	bytes.to_vec().serialize(buf).expect("writing to a Vec<u8> cannot fail");
}

struct TssAuth {
	signature: [u8; 64],
	recovery_id: u8,
	message_hash: [u8; 32],
	nonce: u64,
}

fn push_tss_auth(buf: &mut Vec<u8>, auth: &TssAuth) {
	buf.extend_from_slice(&auth.signature);
	buf.push(auth.recovery_id);
	buf.extend_from_slice(&auth.message_hash);
	buf.extend_from_slice(&auth.nonce.to_le_bytes());
}

/// Encodes `withdraw_and_execute`'s Anchor instruction data (spec §4.6).
#[allow(clippy::too_many_arguments)]
fn build_withdraw_and_execute_data(
	instruction_id: u8,
	tx_id: &[u8; 32],
	universal_tx_id: &[u8; 32],
	amount: u64,
	sender: &[u8; 20],
	writable_flags: &[u8],
	ix_data: &[u8],
	gas_fee: u64,
	rent_fee: u64,
	auth: &TssAuth,
) -> Vec<u8> {
	let mut buf = anchor_discriminator("withdraw_and_execute").to_vec();
	buf.push(instruction_id);
	buf.extend_from_slice(tx_id);
	buf.extend_from_slice(universal_tx_id);
	buf.extend_from_slice(&amount.to_le_bytes());
	buf.extend_from_slice(sender);
	borsh_vec(&mut buf, writable_flags);
	borsh_vec(&mut buf, ix_data);
	buf.extend_from_slice(&gas_fee.to_le_bytes());
	buf.extend_from_slice(&rent_fee.to_le_bytes());
	push_tss_auth(&mut buf, auth);
	buf
}

/// Encodes `revert_universal_tx`/`revert_universal_tx_token`'s Anchor instruction data (spec
/// §4.6).
fn build_revert_data(
	method: &str,
	tx_id: &[u8; 32],
	universal_tx_id: &[u8; 32],
	amount: u64,
	fund_recipient: &[u8; 32],
	revert_msg: &[u8],
	gas_fee: u64,
	auth: &TssAuth,
) -> Vec<u8> {
	let mut buf = anchor_discriminator(method).to_vec();
	buf.extend_from_slice(tx_id);
	buf.extend_from_slice(universal_tx_id);
	buf.extend_from_slice(&amount.to_le_bytes());
	buf.extend_from_slice(fund_recipient);
	borsh_vec(&mut buf, revert_msg);
	buf.extend_from_slice(&gas_fee.to_le_bytes());
	push_tss_auth(&mut buf, auth);
	buf
}

fn compute_budget_instruction(units: u32) -> Instruction {
	let mut data = vec![SET_COMPUTE_UNIT_LIMIT_IX];
	data.extend_from_slice(&units.to_le_bytes());
	Instruction { program_id: well_known(COMPUTE_BUDGET_PROGRAM_ID), accounts: vec![], data }
}

/// `CreateIdempotent` ATA instruction: creates `associated_token_account` for `(wallet, mint)` if
/// it does not already exist (spec §4.6 "Transaction envelope").
fn create_idempotent_ata_instruction(
	funding: Address,
	associated_token_account: Address,
	wallet: Address,
	mint: Address,
	token_program: Address,
	ata_program: Address,
) -> Instruction {
	Instruction {
		program_id: ata_program,
		accounts: vec![
			wire::AccountMeta::new(funding, true, true),
			wire::AccountMeta::new(associated_token_account, false, true),
			wire::AccountMeta::new(wallet, false, false),
			wire::AccountMeta::new(mint, false, false),
			wire::AccountMeta::new(well_known(SYSTEM_PROGRAM_ID), false, false),
			wire::AccountMeta::new(token_program, false, false),
		],
		data: vec![ATA_CREATE_IDEMPOTENT_IX],
	}
}

/// One resolved outbound request, ready to be turned into an instruction and signed transaction.
pub enum OutboundRequest {
	WithdrawOrExecute {
		instruction_id: u8,
		tx_id: [u8; 32],
		universal_tx_id: [u8; 32],
		amount: u64,
		sender: [u8; 20],
		asset: Asset,
		recipient: Address,
		target_program: Address,
		execute: Option<ExecutePayload>,
		gas_fee: u64,
		rent_fee: u64,
		token_program: Address,
		compute_unit_limit: u32,
	},
	RevertSol {
		tx_id: [u8; 32],
		universal_tx_id: [u8; 32],
		amount: u64,
		recipient: Address,
		revert_msg: Vec<u8>,
		gas_fee: u64,
		compute_unit_limit: u32,
	},
	RevertSpl {
		tx_id: [u8; 32],
		universal_tx_id: [u8; 32],
		amount: u64,
		mint: Address,
		recipient: Address,
		revert_msg: Vec<u8>,
		gas_fee: u64,
		token_program: Address,
		compute_unit_limit: u32,
	},
}

impl OutboundRequest {
	/// The per-request compute-unit limit (spec §4.6: default 200000, else parsed from the
	/// request's own `gas_limit`, else default on parse failure — never a fixed adapter-wide value).
	pub fn compute_unit_limit(&self) -> u32 {
		match self {
			Self::WithdrawOrExecute { compute_unit_limit, .. }
			| Self::RevertSol { compute_unit_limit, .. }
			| Self::RevertSpl { compute_unit_limit, .. } => *compute_unit_limit,
		}
	}

	/// The gateway's Anchor method this request invokes, the same name its instruction data is
	/// discriminated under (spec §4.6).
	pub fn method_name(&self) -> &'static str {
		match self {
			Self::WithdrawOrExecute { .. } => "withdraw_and_execute",
			Self::RevertSol { .. } => "revert_universal_tx",
			Self::RevertSpl { .. } => "revert_universal_tx_token",
		}
	}

	pub fn universal_tx_id(&self) -> [u8; 32] {
		match self {
			Self::WithdrawOrExecute { universal_tx_id, .. }
			| Self::RevertSol { universal_tx_id, .. }
			| Self::RevertSpl { universal_tx_id, .. } => *universal_tx_id,
		}
	}

	/// Derives the TSS message tail from this request's own fields, so callers never hand-build a
	/// [`MessageTail`] independently of the request they are signing for.
	pub fn message_tail(&self) -> MessageTail<'_> {
		match self {
			Self::WithdrawOrExecute {
				tx_id,
				universal_tx_id,
				sender,
				asset,
				gas_fee,
				target_program,
				execute,
				..
			} => {
				let token = match asset {
					Asset::Spl(mint) => Some(mint),
					Asset::NativeSol => None,
				};
				MessageTail::WithdrawOrExecute {
					tx_id,
					universal_tx_id,
					sender,
					token,
					gas_fee: *gas_fee,
					target_program,
					execute: execute.as_ref(),
				}
			},
			Self::RevertSol { tx_id, universal_tx_id, recipient, gas_fee, .. } =>
				MessageTail::RevertSol { universal_tx_id, tx_id, recipient, gas_fee: *gas_fee },
			Self::RevertSpl { tx_id, universal_tx_id, mint, recipient, gas_fee, .. } =>
				MessageTail::RevertSpl { universal_tx_id, tx_id, mint, recipient, gas_fee: *gas_fee },
		}
	}
}

/// The outbound-transaction wire entity ingested from another chain (spec §3 `OutboundCreatedEvent`,
/// §4.6 inputs): string amount, base58-or-hex recipient/asset address, hex payload/revert_msg,
/// decimal-string gas_limit. Has no `gas_fee` field — the caller supplies `gas_fee` separately
/// (spec §9 Open Question) — and no `token_program` field, so the parser defaults to the canonical
/// SPL Token program.
#[derive(Debug, Clone)]
pub struct OutboundCreatedEvent {
	pub tx_id: [u8; 32],
	pub universal_tx_id: [u8; 32],
	pub sender: [u8; 20],
	pub recipient: String,
	pub asset_addr: String,
	pub amount: String,
	pub tx_type: String,
	pub payload: String,
	pub revert_msg: String,
	pub gas_limit: String,
}

/// Parses a base58 or `0x`-prefixed hex-encoded 32-byte pubkey field (spec §4.6).
fn parse_pubkey_field(field: &str) -> Result<Address, SvmAdapterError> {
	let trimmed = field.trim();
	if let Some(hex_str) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
		let bytes = hex::decode(hex_str).map_err(|_| SvmAdapterError::InvalidRecipient(field.to_string()))?;
		let array: [u8; 32] =
			bytes.try_into().map_err(|_| SvmAdapterError::InvalidRecipient(field.to_string()))?;
		return Ok(Address::new(array));
	}
	Address::from_str(trimmed).map_err(|_| SvmAdapterError::InvalidRecipient(field.to_string()))
}

/// Parses the asset address field: empty or an all-zero pubkey means native SOL (spec §3).
fn parse_asset_field(field: &str) -> Result<Asset, SvmAdapterError> {
	let trimmed = field.trim();
	if trimmed.is_empty() {
		return Ok(Asset::NativeSol);
	}
	let address = parse_pubkey_field(trimmed)?;
	if address.as_bytes().iter().all(|&b| b == 0) {
		return Ok(Asset::NativeSol);
	}
	Ok(Asset::Spl(address))
}

/// Parses a decimal-string amount, rejecting anything that does not fit in a `u64` (spec §3
/// `amount <= u64::MAX`).
fn parse_amount_field(field: &str) -> Result<u64, SvmAdapterError> {
	field.trim().parse::<u64>().map_err(|_| SvmAdapterError::AmountOutOfRange(field.to_string()))
}

/// Parses a hex-encoded (optionally `0x`-prefixed) byte field; empty means no payload.
fn parse_hex_field(field: &str, name: &'static str) -> Result<Vec<u8>, SvmAdapterError> {
	let trimmed = field.trim();
	let stripped = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
	if stripped.is_empty() {
		return Ok(Vec::new());
	}
	hex::decode(stripped).map_err(|_| SvmAdapterError::Truncated { field: name })
}

/// Parses the decimal-string `gas_limit` into a compute-unit limit: 200000 when absent, the parsed
/// value when present, 200000 again if parsing fails (spec §4.6 — never an error, always a unit
/// count).
fn parse_gas_limit_field(field: &str) -> u32 {
	let trimmed = field.trim();
	if trimmed.is_empty() {
		return DEFAULT_COMPUTE_UNIT_LIMIT;
	}
	trimmed.parse::<u32>().unwrap_or(DEFAULT_COMPUTE_UNIT_LIMIT)
}

fn parse_tx_type_field(field: &str) -> Result<OutboundTxType, SvmAdapterError> {
	match field.trim() {
		"FUNDS" => Ok(OutboundTxType::Funds),
		"FUNDS_AND_PAYLOAD" => Ok(OutboundTxType::FundsAndPayload),
		"GAS_AND_PAYLOAD" => Ok(OutboundTxType::GasAndPayload),
		"INBOUND_REVERT" => Ok(OutboundTxType::InboundRevert),
		_ => Err(SvmAdapterError::InvalidInstructionId),
	}
}

/// Validates and decodes an [`OutboundCreatedEvent`] into an [`OutboundRequest`] (spec §3/§4.6).
/// `gas_fee` is supplied by the caller: the wire schema carries no such field (spec §9 Open
/// Question — "do not guess a value").
pub fn parse_outbound_created_event(
	event: &OutboundCreatedEvent,
	gas_fee: u64,
) -> Result<OutboundRequest, SvmAdapterError> {
	let recipient = parse_pubkey_field(&event.recipient)?;
	let asset = parse_asset_field(&event.asset_addr)?;
	let amount = parse_amount_field(&event.amount)?;
	let tx_type = parse_tx_type_field(&event.tx_type)?;
	let payload = parse_hex_field(&event.payload, "payload")?;
	let revert_msg = parse_hex_field(&event.revert_msg, "revert_msg")?;
	let compute_unit_limit = parse_gas_limit_field(&event.gas_limit);
	let token_program = well_known(sol_prim::consts::TOKEN_PROGRAM_ID_B58);

	let (instruction_id, execute) = determine_instruction_id(tx_type, asset, &payload, gas_fee, amount)?;

	match instruction_id {
		1 | 2 => Ok(OutboundRequest::WithdrawOrExecute {
			instruction_id,
			tx_id: event.tx_id,
			universal_tx_id: event.universal_tx_id,
			amount,
			sender: event.sender,
			asset,
			recipient,
			target_program: recipient,
			rent_fee: execute.as_ref().map(|e| e.rent_fee).unwrap_or(0),
			execute,
			gas_fee,
			token_program,
			compute_unit_limit,
		}),
		3 => Ok(OutboundRequest::RevertSol {
			tx_id: event.tx_id,
			universal_tx_id: event.universal_tx_id,
			amount,
			recipient,
			revert_msg,
			gas_fee,
			compute_unit_limit,
		}),
		4 => {
			let mint = match asset {
				Asset::Spl(mint) => mint,
				Asset::NativeSol => return Err(SvmAdapterError::InvalidRecipient(event.asset_addr.clone())),
			};
			Ok(OutboundRequest::RevertSpl {
				tx_id: event.tx_id,
				universal_tx_id: event.universal_tx_id,
				amount,
				mint,
				recipient,
				revert_msg,
				gas_fee,
				token_program,
				compute_unit_limit,
			})
		},
		_ => Err(SvmAdapterError::InvalidInstructionId),
	}
}

pub struct OutboundAssembler {
	pdas: GatewayPdas,
	pool: RpcPool,
	relayer: SigningKey,
	relayer_address: Address,
}

impl OutboundAssembler {
	pub fn new(pdas: GatewayPdas, pool: RpcPool, relayer: SigningKey) -> Self {
		let relayer_address = Address::new(relayer.verifying_key().to_bytes());
		Self { pdas, pool, relayer, relayer_address }
	}

	fn build_instruction(
		&self,
		request: &OutboundRequest,
		auth: TssAuth,
	) -> Result<Instruction, SvmAdapterError> {
		match request {
			OutboundRequest::WithdrawOrExecute {
				instruction_id,
				tx_id,
				universal_tx_id,
				amount,
				sender,
				asset,
				recipient,
				target_program,
				execute,
				gas_fee,
				rent_fee,
				token_program,
				..
			} => {
				let (config, _) = self.pdas.config()?;
				let (vault, _) = self.pdas.vault()?;
				let (cea_authority, _) = self.pdas.cea_authority(sender)?;
				let (tss_pda, _) = self.pdas.tss()?;
				let (executed_tx, _) = self.pdas.executed_tx(tx_id)?;
				let system_program = well_known(SYSTEM_PROGRAM_ID);

				let mut accounts = vec![
					wire::AccountMeta::new(self.relayer_address, true, true),
					wire::AccountMeta::new(config, false, false),
					wire::AccountMeta::new(vault, false, true),
					wire::AccountMeta::new(cea_authority, false, true),
					wire::AccountMeta::new(tss_pda, false, true),
					wire::AccountMeta::new(executed_tx, false, true),
					wire::AccountMeta::new(system_program, false, false),
					wire::AccountMeta::new(*target_program, false, false),
				];

				let gateway_id = self.pdas.gateway_program;
				if asset.is_native() {
					for _ in 0..8 {
						accounts.push(wire::AccountMeta::new(gateway_id, false, false));
					}
				} else {
					let mint = match asset {
						Asset::Spl(mint) => *mint,
						Asset::NativeSol => unreachable!(),
					};
					let (vault_ata, _) = self.pdas.associated_token_account(&vault, token_program, &mint)?;
					let (cea_ata, _) = self.pdas.associated_token_account(&cea_authority, token_program, &mint)?;
					let (recipient_ata, _) = self.pdas.associated_token_account(recipient, token_program, &mint)?;
					accounts.push(wire::AccountMeta::new(*recipient, false, false));
					accounts.push(wire::AccountMeta::new(vault_ata, false, true));
					accounts.push(wire::AccountMeta::new(cea_ata, false, true));
					accounts.push(wire::AccountMeta::new(mint, false, false));
					accounts.push(wire::AccountMeta::new(*token_program, false, false));
					accounts.push(wire::AccountMeta::new(well_known(RENT_SYSVAR_ID), false, false));
					accounts.push(wire::AccountMeta::new(self.pdas.ata_program, false, false));
					accounts.push(wire::AccountMeta::new(recipient_ata, false, true));
				}

				let (writable_flags, ix_data) = match execute {
					Some(payload) => {
						for account in &payload.accounts {
							accounts.push(wire::AccountMeta::new(account.pubkey, false, account.is_writable));
						}
						let flags: Vec<bool> = payload.accounts.iter().map(|a| a.is_writable).collect();
						(pack_writable_flags(&flags), payload.ix_data.clone())
					},
					None => (Vec::new(), Vec::new()),
				};

				let data = build_withdraw_and_execute_data(
					*instruction_id,
					tx_id,
					universal_tx_id,
					*amount,
					sender,
					&writable_flags,
					&ix_data,
					*gas_fee,
					*rent_fee,
					&auth,
				);

				Ok(Instruction { program_id: gateway_id, accounts, data })
			},
			OutboundRequest::RevertSol { tx_id, universal_tx_id, amount, recipient, revert_msg, gas_fee, .. } => {
				let (config, _) = self.pdas.config()?;
				let (vault, _) = self.pdas.vault()?;
				let (tss, _) = self.pdas.tss()?;
				let (executed_tx, _) = self.pdas.executed_tx(tx_id)?;
				let system_program = well_known(SYSTEM_PROGRAM_ID);

				let accounts = vec![
					wire::AccountMeta::new(config, false, false),
					wire::AccountMeta::new(vault, false, true),
					wire::AccountMeta::new(tss, false, true),
					wire::AccountMeta::new(*recipient, false, true),
					wire::AccountMeta::new(executed_tx, false, true),
					wire::AccountMeta::new(self.relayer_address, true, true),
					wire::AccountMeta::new(system_program, false, false),
				];

				let mut fund_recipient = [0u8; 32];
				fund_recipient.copy_from_slice(recipient.as_bytes());
				let data = build_revert_data(
					"revert_universal_tx",
					tx_id,
					universal_tx_id,
					*amount,
					&fund_recipient,
					revert_msg,
					*gas_fee,
					&auth,
				);

				Ok(Instruction { program_id: self.pdas.gateway_program, accounts, data })
			},
			OutboundRequest::RevertSpl {
				tx_id,
				universal_tx_id,
				amount,
				mint,
				recipient,
				revert_msg,
				gas_fee,
				token_program,
				..
			} => {
				let (config, _) = self.pdas.config()?;
				let (vault, _) = self.pdas.vault()?;
				let (token_vault, _) = self.pdas.token_vault(mint)?;
				let (tss, _) = self.pdas.tss()?;
				let (recipient_ata, _) = self.pdas.associated_token_account(recipient, token_program, mint)?;
				let (executed_tx, _) = self.pdas.executed_tx(tx_id)?;
				let system_program = well_known(SYSTEM_PROGRAM_ID);

				let accounts = vec![
					wire::AccountMeta::new(config, false, false),
					wire::AccountMeta::new(vault, false, true),
					wire::AccountMeta::new(token_vault, false, true),
					wire::AccountMeta::new(tss, false, true),
					wire::AccountMeta::new(recipient_ata, false, true),
					wire::AccountMeta::new(*mint, false, false),
					wire::AccountMeta::new(executed_tx, false, true),
					wire::AccountMeta::new(self.relayer_address, true, true),
					wire::AccountMeta::new(vault, false, true),
					wire::AccountMeta::new(*token_program, false, false),
					wire::AccountMeta::new(system_program, false, false),
				];

				let mut fund_recipient = [0u8; 32];
				fund_recipient.copy_from_slice(recipient.as_bytes());
				let data = build_revert_data(
					"revert_universal_tx_token",
					tx_id,
					universal_tx_id,
					*amount,
					&fund_recipient,
					revert_msg,
					*gas_fee,
					&auth,
				);

				Ok(Instruction { program_id: self.pdas.gateway_program, accounts, data })
			},
		}
	}

	/// Assembles, signs and broadcasts the outbound transaction; returns the broadcast signature.
	pub async fn assemble_and_broadcast(
		&self,
		request: OutboundRequest,
		message_hash: [u8; 32],
		tss_signature: [u8; 64],
		tss_eth_address: [u8; 20],
		nonce: u64,
	) -> Result<TxSignature, SvmAdapterError> {
		let recovery_id = determine_recovery_id(message_hash, &tss_signature, &tss_eth_address)?;
		let auth = TssAuth { signature: tss_signature, recovery_id, message_hash, nonce };
		let gateway_ix = self.build_instruction(&request, auth)?;

		let mut instructions = vec![compute_budget_instruction(request.compute_unit_limit())];
		if let Some(ata_ix) = self.maybe_create_ata_instruction(&request) {
			instructions.push(ata_ix);
		}
		instructions.push(gateway_ix);

		let blockhash_response = self
			.pool
			.get_latest_blockhash(solana_rpc::types::Commitment::Finalized)
			.await
			.map_err(|e| SvmAdapterError::Other(e.into()))?;
		let recent_blockhash: [u8; 32] = bs58::decode(&blockhash_response.value.blockhash)
			.into_vec()
			.map_err(|e| SvmAdapterError::Other(anyhow::anyhow!(e)))?
			.try_into()
			.map_err(|_| SvmAdapterError::Truncated { field: "recent_blockhash" })?;

		let message = Message::new(self.relayer_address, &instructions, recent_blockhash);
		let wire_bytes = wire::Transaction::sign_and_serialize(message, &self.relayer);
		let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, wire_bytes);

		self.pool.send_transaction(encoded).await.map_err(|e| SvmAdapterError::Other(e.into()))
	}

	fn maybe_create_ata_instruction(&self, request: &OutboundRequest) -> Option<Instruction> {
		match request {
			OutboundRequest::WithdrawOrExecute { asset: Asset::Spl(mint), recipient, token_program, .. } => {
				let (recipient_ata, _) =
					self.pdas.associated_token_account(recipient, token_program, mint).ok()?;
				Some(create_idempotent_ata_instruction(
					self.relayer_address,
					recipient_ata,
					*recipient,
					*mint,
					*token_program,
					self.pdas.ata_program,
				))
			},
			OutboundRequest::RevertSpl { mint, recipient, token_program, .. } => {
				let (recipient_ata, _) =
					self.pdas.associated_token_account(recipient, token_program, mint).ok()?;
				Some(create_idempotent_ata_instruction(
					self.relayer_address,
					recipient_ata,
					*recipient,
					*mint,
					*token_program,
					self.pdas.ata_program,
				))
			},
			_ => None,
		}
	}

	/// `verify_broadcasted_tx` (spec §4.6 "Verification"): `confirmations = max(0, latest_slot -
	/// tx.slot + 1)`, `status = 0` iff `tx.meta.err != nil`.
	pub async fn verify_broadcasted_tx(
		&self,
		tx_hash: &str,
	) -> Result<Option<(u64, u8)>, SvmAdapterError> {
		let signature: TxSignature =
			tx_hash.parse().map_err(|_| SvmAdapterError::InvalidAddress(tx_hash.to_string()))?;
		let config = solana_rpc::types::RpcTransactionConfig {
			encoding: Some(solana_rpc::types::UiTransactionEncoding::Base64),
			commitment: Some(solana_rpc::types::Commitment::Finalized),
			max_supported_transaction_version: Some(0),
		};
		let tx = self.pool.get_transaction(signature, config).await.map_err(|e| SvmAdapterError::Other(e.into()))?;
		let Some(tx) = tx else { return Ok(None) };

		let latest_slot =
			self.pool.get_slot(solana_rpc::types::Commitment::Finalized).await.map_err(|e| SvmAdapterError::Other(e.into()))?;
		let confirmations = latest_slot.saturating_sub(tx.slot).saturating_add(1);
		let status = if tx.meta.as_ref().and_then(|m| m.err.as_ref()).is_some() { 0 } else { 1 };
		Ok(Some((confirmations, status)))
	}
}

#[cfg(test)]
mod tests {
	use secp256k1::{Secp256k1, SecretKey};

	use super::*;

	// spec §8 property 9.
	#[test]
	fn s9_writable_flag_packing_eight_accounts() {
		let writable = [true, false, true, false, false, false, false, false];
		assert_eq!(pack_writable_flags(&writable), vec![0xA0]);
	}

	#[test]
	fn s9_writable_flag_packing_nine_accounts() {
		let writable = [true, false, true, false, false, false, false, false, true];
		assert_eq!(pack_writable_flags(&writable), vec![0xA0, 0x80]);
	}

	// spec §8 S6.
	#[test]
	fn s6_execute_writable_flags_byte_is_0xc0() {
		let writable = [true, true, false];
		assert_eq!(pack_writable_flags(&writable), vec![0xC0]);
	}

	// spec §8 property 8.
	#[test]
	fn s8_recovery_id_search_finds_the_correct_v() {
		let secp = Secp256k1::new();
		let secret_key = SecretKey::from_slice(&[0x11; 32]).unwrap();
		let public_key = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
		let uncompressed = public_key.serialize_uncompressed();
		let digest = Keccak256::digest(&uncompressed[1..]);
		let expected: [u8; 20] = digest[12..32].try_into().unwrap();

		let hash = [0x42; 32];
		let message = secp256k1::Message::from_digest(hash);
		let recoverable = secp.sign_ecdsa_recoverable(&message, &secret_key);
		let (recid, compact) = recoverable.serialize_compact();

		let found = determine_recovery_id(hash, &compact, &expected).unwrap();
		assert_eq!(found, recid.to_i32() as u8);
	}

	#[test]
	fn anchor_discriminator_is_deterministic_and_method_specific() {
		let a = anchor_discriminator("withdraw_and_execute");
		let b = anchor_discriminator("withdraw_and_execute");
		let c = anchor_discriminator("revert_universal_tx");
		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	fn wire_event() -> OutboundCreatedEvent {
		OutboundCreatedEvent {
			tx_id: [1u8; 32],
			universal_tx_id: [2u8; 32],
			sender: [3u8; 20],
			recipient: "11111111111111111111111111111111".into(),
			asset_addr: String::new(),
			amount: "1000".into(),
			tx_type: "FUNDS".into(),
			payload: String::new(),
			revert_msg: String::new(),
			gas_limit: "300000".into(),
		}
	}

	#[test]
	fn parses_native_sol_withdraw_event() {
		let event = wire_event();
		let request = parse_outbound_created_event(&event, 0).unwrap();
		match request {
			OutboundRequest::WithdrawOrExecute { instruction_id, asset, compute_unit_limit, .. } => {
				assert_eq!(instruction_id, 1);
				assert_eq!(asset, Asset::NativeSol);
				assert_eq!(compute_unit_limit, 300_000);
			},
			_ => panic!("expected WithdrawOrExecute"),
		}
	}

	#[test]
	fn gas_limit_falls_back_to_default_on_parse_failure() {
		let mut event = wire_event();
		event.gas_limit = "not-a-number".into();
		let request = parse_outbound_created_event(&event, 0).unwrap();
		assert_eq!(request.compute_unit_limit(), DEFAULT_COMPUTE_UNIT_LIMIT);
	}

	#[test]
	fn parses_spl_revert_event() {
		let mut event = wire_event();
		event.tx_type = "INBOUND_REVERT".into();
		event.asset_addr = "So11111111111111111111111111111111111111112".into();
		event.revert_msg = "0x7465737400".into();
		event.gas_limit = String::new();
		let request = parse_outbound_created_event(&event, 10).unwrap();
		match request {
			OutboundRequest::RevertSpl { revert_msg, compute_unit_limit, gas_fee, .. } => {
				assert_eq!(revert_msg, hex::decode("7465737400").unwrap());
				assert_eq!(compute_unit_limit, DEFAULT_COMPUTE_UNIT_LIMIT);
				assert_eq!(gas_fee, 10);
			},
			_ => panic!("expected RevertSpl"),
		}
	}

	#[test]
	fn rejects_malformed_recipient() {
		let mut event = wire_event();
		event.recipient = "not-base58-or-hex!!".into();
		assert!(matches!(
			parse_outbound_created_event(&event, 0),
			Err(SvmAdapterError::InvalidRecipient(_))
		));
	}

	#[test]
	fn rejects_non_numeric_amount() {
		let mut event = wire_event();
		event.amount = "not-a-number".into();
		assert!(matches!(
			parse_outbound_created_event(&event, 0),
			Err(SvmAdapterError::AmountOutOfRange(_))
		));
	}

	#[test]
	fn rejects_unrecognized_tx_type() {
		let mut event = wire_event();
		event.tx_type = "WHAT_IS_THIS".into();
		assert!(matches!(
			parse_outbound_created_event(&event, 0),
			Err(SvmAdapterError::InvalidInstructionId)
		));
	}
}
