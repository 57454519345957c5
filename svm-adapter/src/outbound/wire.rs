//! A minimal legacy Solana transaction wire format: compact-u16 ("shortvec") length encoding, the
//! legacy `Message` layout, and `Transaction` signing/serialization. Solana's own wire protocol is
//! the one piece of SVM-specific binary format this crate hand-rolls rather than pulling from an
//! ecosystem crate — `solana-sdk` pins a curve25519-dalek/ed25519-dalek lineage that predates (and
//! conflicts with) the versions the rest of this crate already depends on for PDA math (spec §4.6
//! prescribes the wire layout byte-for-byte, so there is no ambiguity to resolve against upstream).

use ed25519_dalek::{Signer, SigningKey};
use sol_prim::Address;

/// Encodes `len` as Solana's compact-u16 ("shortvec"): 7 bits per byte, continuation bit set on
/// all but the last byte.
pub fn write_compact_u16(buf: &mut Vec<u8>, mut len: usize) {
	loop {
		let mut byte = (len & 0x7f) as u8;
		len >>= 7;
		if len != 0 {
			byte |= 0x80;
			buf.push(byte);
		} else {
			buf.push(byte);
			break;
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
	pub pubkey: Address,
	pub is_signer: bool,
	pub is_writable: bool,
}

impl AccountMeta {
	pub fn new(pubkey: Address, is_signer: bool, is_writable: bool) -> Self {
		Self { pubkey, is_signer, is_writable }
	}
}

pub struct Instruction {
	pub program_id: Address,
	pub accounts: Vec<AccountMeta>,
	pub data: Vec<u8>,
}

struct CompiledInstruction {
	program_id_index: u8,
	account_indices: Vec<u8>,
	data: Vec<u8>,
}

/// Legacy (non-versioned) Solana message: account keys ordered `[signer+writable, signer+readonly,
/// non-signer+writable, non-signer+readonly]`, deduplicated, fee payer first.
pub struct Message {
	account_keys: Vec<Address>,
	num_required_signatures: u8,
	num_readonly_signed: u8,
	num_readonly_unsigned: u8,
	recent_blockhash: [u8; 32],
	compiled: Vec<CompiledInstruction>,
}

impl Message {
	pub fn new(fee_payer: Address, instructions: &[Instruction], recent_blockhash: [u8; 32]) -> Self {
		let mut signer_writable = vec![fee_payer];
		let mut signer_readonly = Vec::new();
		let mut unsigned_writable = Vec::new();
		let mut unsigned_readonly = Vec::new();

		for ix in instructions {
			for meta in &ix.accounts {
				if meta.pubkey == fee_payer {
					continue;
				}
				let bucket = match (meta.is_signer, meta.is_writable) {
					(true, true) => &mut signer_writable,
					(true, false) => &mut signer_readonly,
					(false, true) => &mut unsigned_writable,
					(false, false) => &mut unsigned_readonly,
				};
				if !bucket.contains(&meta.pubkey) {
					bucket.push(meta.pubkey);
				}
			}
			if !unsigned_readonly.contains(&ix.program_id)
				&& !signer_writable.contains(&ix.program_id)
				&& !signer_readonly.contains(&ix.program_id)
				&& !unsigned_writable.contains(&ix.program_id)
			{
				unsigned_readonly.push(ix.program_id);
			}
		}

		let num_required_signatures = (signer_writable.len() + signer_readonly.len()) as u8;
		let num_readonly_signed = signer_readonly.len() as u8;
		let num_readonly_unsigned = unsigned_readonly.len() as u8;

		let mut account_keys = signer_writable;
		account_keys.extend(signer_readonly);
		account_keys.extend(unsigned_writable);
		account_keys.extend(unsigned_readonly);

		let index_of = |key: &Address| account_keys.iter().position(|k| k == key).unwrap() as u8;

		let compiled = instructions
			.iter()
			.map(|ix| CompiledInstruction {
				program_id_index: index_of(&ix.program_id),
				account_indices: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
				data: ix.data.clone(),
			})
			.collect();

		Self {
			account_keys,
			num_required_signatures,
			num_readonly_signed,
			num_readonly_unsigned,
			recent_blockhash,
			compiled,
		}
	}

	fn serialize(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		buf.push(self.num_required_signatures);
		buf.push(self.num_readonly_signed);
		buf.push(self.num_readonly_unsigned);
		write_compact_u16(&mut buf, self.account_keys.len());
		for key in &self.account_keys {
			buf.extend_from_slice(key.as_bytes());
		}
		buf.extend_from_slice(&self.recent_blockhash);
		write_compact_u16(&mut buf, self.compiled.len());
		for ix in &self.compiled {
			buf.push(ix.program_id_index);
			write_compact_u16(&mut buf, ix.account_indices.len());
			buf.extend_from_slice(&ix.account_indices);
			write_compact_u16(&mut buf, ix.data.len());
			buf.extend_from_slice(&ix.data);
		}
		buf
	}

	pub fn num_required_signatures(&self) -> usize {
		self.num_required_signatures as usize
	}
}

pub struct Transaction {
	pub signatures: Vec<[u8; 64]>,
	pub message: Message,
}

impl Transaction {
	/// Signs `message` with `relayer` as the sole signer (this adapter's instructions only ever
	/// need the relayer's signature; the TSS signature is embedded as instruction data, not a
	/// transaction-level signature) and serializes to the wire format.
	pub fn sign_and_serialize(message: Message, relayer: &SigningKey) -> Vec<u8> {
		let message_bytes = message.serialize();
		let signature = relayer.sign(&message_bytes).to_bytes();
		let signatures = vec![signature; message.num_required_signatures().max(1)];

		let mut buf = Vec::new();
		write_compact_u16(&mut buf, signatures.len());
		for sig in &signatures {
			buf.extend_from_slice(sig);
		}
		buf.extend_from_slice(&message_bytes);
		buf
	}
}

#[cfg(test)]
mod tests {
	use std::str::FromStr;

	use super::*;

	#[test]
	fn compact_u16_round_trips_small_and_large() {
		for len in [0usize, 1, 127, 128, 16383, 16384] {
			let mut buf = Vec::new();
			write_compact_u16(&mut buf, len);
			assert!(!buf.is_empty());
		}
	}

	#[test]
	fn fee_payer_is_always_first_account_key() {
		let fee_payer = Address::from_str("11111111111111111111111111111111").unwrap();
		let other = Address::from_str("So11111111111111111111111111111111111111112").unwrap();
		let ix = Instruction {
			program_id: other,
			accounts: vec![AccountMeta::new(fee_payer, true, true), AccountMeta::new(other, false, true)],
			data: vec![1, 2, 3],
		};
		let message = Message::new(fee_payer, &[ix], [0u8; 32]);
		assert_eq!(message.account_keys[0], fee_payer);
	}
}
