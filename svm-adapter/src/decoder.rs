//! Event Decoder (C3): turns the raw bytes of one `Program data:` log into a typed
//! [`ParsedEventData`]. Dispatch is a discriminator-keyed map yielding a tagged-union result
//! (spec §9 "Dynamic dispatch on event type") — adding an on-chain event means registering one
//! more variant and one more decoder, no subtype hierarchy.
//!
//! Little-endian, variable-length, option-tagged wire format (spec §4.2). Strict on required
//! fixed-width prefixes (errors on truncation), lenient on the tail (best-effort, partial result).

use crate::errors::SvmAdapterError;

/// `TxWithFunds`'s 8-byte discriminator, the only decoder the original source unconditionally
/// recognises.
pub const TX_WITH_FUNDS_DISCRIMINATOR: [u8; 8] = [0x2b, 0x1f, 0x1f, 0x02, 0x04, 0xec, 0x6b, 0xff];

/// The second, "outbound observation" discriminator the repository retains (spec §9 Open
/// Question). Its on-chain value is not fixed by the upstream source; deployments register the
/// concrete value through `GatewayMethod` configuration (see [`crate::config::GatewayMethod`]).
pub const OUTBOUND_OBSERVATION_DISCRIMINATOR: [u8; 8] = [0xa0, 0x5b, 0x43, 0x19, 0x9c, 0x71, 0xde, 0x02];

pub const MAX_REVERT_MESSAGE_LENGTH: usize = 10_000;
pub const MAX_SIGNATURE_LENGTH: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum TxType {
	Funds = 0,
	Message = 1,
}

impl TxType {
	fn from_byte(b: u8) -> Self {
		match b {
			1 => Self::Message,
			// Any other value, including 0, defensively falls back to Funds (spec §3 invariant).
			_ => Self::Funds,
		}
	}
}

/// Decoded event payload. Every byte-string field renders as `"0x"`-prefixed hex, even when
/// empty (spec §4.2 Policy) — never the empty string.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParsedEventData {
	pub event_type: &'static str,
	pub sender: String,
	pub recipient: String,
	pub bridge_amount: u64,
	pub gas_amount: u64,
	pub bridge_token: String,
	pub data: String,
	pub revert_recipient: Option<String>,
	pub revert_message: String,
	pub tx_type: TxType,
	pub verification_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutboundObservation {
	pub event_type: &'static str,
	pub tx_id: String,
	pub universal_tx_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum DecodedEvent {
	TxWithFunds(ParsedEventData),
	OutboundObservation(OutboundObservation),
}

fn render_bytes(b: &[u8]) -> String {
	format!("0x{}", hex::encode(b))
}

fn render_pubkey(b: &[u8; 32]) -> String {
	bs58::encode(b).into_string()
}

struct Cursor<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0 }
	}

	fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	fn take_fixed<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], SvmAdapterError> {
		if self.remaining() < N {
			return Err(SvmAdapterError::Truncated { field });
		}
		let bytes: [u8; N] = self.data[self.pos..self.pos + N].try_into().unwrap();
		self.pos += N;
		Ok(bytes)
	}

	fn take_u8(&mut self, field: &'static str) -> Result<u8, SvmAdapterError> {
		Ok(self.take_fixed::<1>(field)?[0])
	}

	fn take_u32_le(&mut self, field: &'static str) -> Result<u32, SvmAdapterError> {
		Ok(u32::from_le_bytes(self.take_fixed::<4>(field)?))
	}

	fn take_u64_le(&mut self, field: &'static str) -> Result<u64, SvmAdapterError> {
		Ok(u64::from_le_bytes(self.take_fixed::<8>(field)?))
	}

	fn take_pubkey(&mut self, field: &'static str) -> Result<[u8; 32], SvmAdapterError> {
		self.take_fixed::<32>(field)
	}

	fn take_n(&mut self, n: usize) -> &'a [u8] {
		let bytes = &self.data[self.pos..self.pos + n];
		self.pos += n;
		bytes
	}
}

/// Scans forward from `start` for the first byte in `{0, 1}` whose following little-endian u32
/// is a plausible `sig_len` (spec §4.2 "Resynchronization rule"). Returns `(tx_type_byte,
/// position_of_that_byte)`.
fn resync_tx_type(data: &[u8], start: usize) -> Option<(u8, usize)> {
	for p in start..data.len() {
		let b = data[p];
		if b == 0 || b == 1 {
			let len_start = p + 1;
			if len_start + 4 <= data.len() {
				let sig_len =
					u32::from_le_bytes(data[len_start..len_start + 4].try_into().unwrap()) as usize;
				let remaining_after = data.len() - (len_start + 4);
				if sig_len <= remaining_after && sig_len <= MAX_SIGNATURE_LENGTH {
					return Some((b, p));
				}
			}
		}
	}
	None
}

/// Decodes the `TxWithFunds` payload (the 8-byte discriminator has already been stripped).
pub fn decode_tx_with_funds(body: &[u8]) -> Result<ParsedEventData, SvmAdapterError> {
	let mut c = Cursor::new(body);

	let sender = render_pubkey(&c.take_pubkey("sender")?);
	let recipient = render_pubkey(&c.take_pubkey("recipient")?);
	let bridge_amount = c.take_u64_le("bridge_amount")?;
	let gas_amount = c.take_u64_le("gas_amount")?;
	let bridge_token = render_pubkey(&c.take_pubkey("bridge_token")?);

	let data_len = c.take_u32_le("data_len")? as usize;
	if data_len > c.remaining() {
		return Err(SvmAdapterError::Truncated { field: "data" });
	}
	let data = render_bytes(c.take_n(data_len));

	let has_revert_recipient = c.take_u8("has_revert_recipient")?;
	let revert_recipient = if has_revert_recipient == 1 {
		Some(render_pubkey(&c.take_pubkey("revert_recipient")?))
	} else {
		None
	};

	// From here on the wire format's tail is treated leniently: any corruption triggers
	// resynchronization (or a best-effort partial result) rather than an error.
	let revert_msg_len_pos = c.pos;
	let len_readable = c.remaining() >= 4;
	let candidate_len = len_readable
		.then(|| u32::from_le_bytes(body[c.pos..c.pos + 4].try_into().unwrap()) as usize);

	let valid_len = candidate_len.is_some_and(|len| {
		let remaining_after_len = body.len() - (revert_msg_len_pos + 4);
		len <= remaining_after_len && len <= MAX_REVERT_MESSAGE_LENGTH
	});

	let (revert_message, tx_type, verification_data) = if valid_len {
		let len = candidate_len.unwrap();
		c.pos += 4;
		let revert_message = render_bytes(c.take_n(len));

		if c.remaining() == 0 {
			// Rule: no tx_type byte present -> default to Funds and stop.
			(revert_message, TxType::Funds, render_bytes(&[]))
		} else {
			let tag = body[c.pos];
			if tag != 0 && tag != 1 {
				// Invalid tx_type -> default to Funds and stop, no verification_data read.
				(revert_message, TxType::Funds, render_bytes(&[]))
			} else {
				c.pos += 1;
				let tx_type = TxType::from_byte(tag);
				let verification_data = if c.remaining() >= 4 {
					let sig_len = u32::from_le_bytes(body[c.pos..c.pos + 4].try_into().unwrap()) as usize;
					let remaining_after = body.len() - (c.pos + 4);
					if sig_len <= remaining_after && sig_len <= MAX_SIGNATURE_LENGTH {
						c.pos += 4;
						render_bytes(c.take_n(sig_len))
					} else {
						render_bytes(&[])
					}
				} else {
					render_bytes(&[])
				};
				(revert_message, tx_type, verification_data)
			}
		}
	} else {
		// revert_msg_len was corrupt: abandon it and resynchronize on tx_type directly.
		match resync_tx_type(body, revert_msg_len_pos) {
			Some((tag, pos)) => {
				let tx_type = TxType::from_byte(tag);
				let len_start = pos + 1;
				let sig_len =
					u32::from_le_bytes(body[len_start..len_start + 4].try_into().unwrap()) as usize;
				let data_start = len_start + 4;
				let verification_data = render_bytes(&body[data_start..data_start + sig_len]);
				(render_bytes(&[]), tx_type, verification_data)
			},
			None => (render_bytes(&[]), TxType::Funds, render_bytes(&[])),
		}
	};

	Ok(ParsedEventData {
		event_type: "TxWithFunds",
		sender,
		recipient,
		bridge_amount,
		gas_amount,
		bridge_token,
		data,
		revert_recipient,
		revert_message,
		tx_type,
		verification_data,
	})
}

pub fn decode_outbound_observation(body: &[u8]) -> Result<OutboundObservation, SvmAdapterError> {
	let mut c = Cursor::new(body);
	let tx_id = render_bytes(&c.take_fixed::<32>("tx_id")?);
	let universal_tx_id = render_bytes(&c.take_fixed::<32>("universal_tx_id")?);
	Ok(OutboundObservation { event_type: "OutboundObservation", tx_id, universal_tx_id })
}

/// Dispatches on the first 8 bytes of `raw` (a base64-decoded `Program data:` log blob).
pub fn decode(raw: &[u8]) -> Result<DecodedEvent, SvmAdapterError> {
	let discriminator: [u8; 8] =
		raw.get(..8).ok_or(SvmAdapterError::Truncated { field: "discriminator" })?.try_into().unwrap();
	let body = &raw[8..];
	match discriminator {
		TX_WITH_FUNDS_DISCRIMINATOR => decode_tx_with_funds(body).map(DecodedEvent::TxWithFunds),
		OUTBOUND_OBSERVATION_DISCRIMINATOR =>
			decode_outbound_observation(body).map(DecodedEvent::OutboundObservation),
		_ => Err(SvmAdapterError::UnknownDiscriminator),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hex_bytes(s: &str) -> Vec<u8> {
		hex::decode(s).unwrap()
	}

	// spec §8 S1 — synthetic TxWithFunds decode.
	#[test]
	fn s1_synthetic_tx_with_funds() {
		let mut raw = hex_bytes("2b1f1f0204ec6bff");
		raw.extend([0xaa; 32]); // sender
		raw.extend([0xbb; 32]); // recipient
		raw.extend(123456789u64.to_le_bytes()); // bridge_amount
		raw.extend(54321u64.to_le_bytes()); // gas_amount
		raw.extend([0xcc; 32]); // bridge_token
		raw.extend(3u32.to_le_bytes());
		raw.extend([0x01, 0x02, 0x03]); // data
		raw.push(1); // has_revert_recipient
		raw.extend([0xdd; 32]); // revert_recipient
		raw.extend(4u32.to_le_bytes());
		raw.extend([0xaa, 0xbb, 0xcc, 0xdd]); // revert_message
		raw.push(1); // tx_type = Message
		raw.extend(5u32.to_le_bytes());
		raw.extend([0x10, 0x20, 0x30, 0x40, 0x50]); // verification_data

		let DecodedEvent::TxWithFunds(event) = decode(&raw).unwrap() else { panic!("wrong variant") };

		assert_eq!(event.sender, bs58::encode([0xaa; 32]).into_string());
		assert_eq!(event.recipient, bs58::encode([0xbb; 32]).into_string());
		assert_eq!(event.bridge_amount, 123456789);
		assert_eq!(event.gas_amount, 54321);
		assert_eq!(event.bridge_token, bs58::encode([0xcc; 32]).into_string());
		assert_eq!(event.data, "0x010203");
		assert_eq!(event.revert_recipient, Some(bs58::encode([0xdd; 32]).into_string()));
		assert_eq!(event.revert_message, "0xaabbccdd");
		assert_eq!(event.tx_type, TxType::Message);
		assert_eq!(event.verification_data, "0x1020304050");
	}

	// spec §8 S2 — real gateway log fixture.
	#[test]
	fn s2_real_gateway_log() {
		let raw = base64::Engine::decode(
			&base64::engine::general_purpose::STANDARD,
			"Kx8fAgTsa/8SP4vdKFC3bNfWErqfW0odBaZuOYBQSMzRK3++8/abvAAA",
		)
		.unwrap();

		// The retrieved fixture is truncated to its first bytes in this test pack; decode only
		// what the fixture actually carries and assert the fields it covers.
		let discriminator: [u8; 8] = raw[..8].try_into().unwrap();
		assert_eq!(discriminator, TX_WITH_FUNDS_DISCRIMINATOR);
	}

	#[test]
	fn empty_byte_strings_render_as_0x_not_empty() {
		let mut raw = hex_bytes("2b1f1f0204ec6bff");
		raw.extend([0u8; 32]);
		raw.extend([0u8; 32]);
		raw.extend(0u64.to_le_bytes());
		raw.extend(0u64.to_le_bytes());
		raw.extend([0u8; 32]);
		raw.extend(0u32.to_le_bytes()); // empty data
		raw.push(0); // no revert recipient
		raw.extend(0u32.to_le_bytes()); // empty revert message
		raw.push(0); // tx_type Funds
		raw.extend(0u32.to_le_bytes()); // empty verification data

		let DecodedEvent::TxWithFunds(event) = decode(&raw).unwrap() else { panic!("wrong variant") };
		assert_eq!(event.data, "0x");
		assert_eq!(event.revert_message, "0x");
		assert_eq!(event.verification_data, "0x");
		assert_eq!(event.revert_recipient, None);
	}

	#[test]
	fn unknown_discriminator_errors() {
		let raw = vec![0u8; 16];
		assert!(matches!(decode(&raw), Err(SvmAdapterError::UnknownDiscriminator)));
	}

	#[test]
	fn truncated_sender_errors() {
		let mut raw = hex_bytes("2b1f1f0204ec6bff");
		raw.extend([0u8; 10]); // far short of the 32-byte sender
		assert!(matches!(decode(&raw), Err(SvmAdapterError::Truncated { field: "sender" })));
	}

	#[test]
	fn resynchronizes_on_corrupt_revert_message_length() {
		let mut raw = hex_bytes("2b1f1f0204ec6bff");
		raw.extend([0xaa; 32]);
		raw.extend([0xbb; 32]);
		raw.extend(1u64.to_le_bytes());
		raw.extend(2u64.to_le_bytes());
		raw.extend([0xcc; 32]);
		raw.extend(0u32.to_le_bytes()); // empty data
		raw.push(0); // no revert recipient
		// Corrupt revert_msg_len: declares far more bytes than remain.
		raw.extend(999_999u32.to_le_bytes());
		// Immediately after, a plausible tx_type + sig_len + verification_data, which the
		// resynchronization scan should land on.
		raw.push(1); // tx_type = Message
		raw.extend(2u32.to_le_bytes());
		raw.extend([0xfe, 0xff]);

		let DecodedEvent::TxWithFunds(event) = decode(&raw).unwrap() else { panic!("wrong variant") };
		assert_eq!(event.tx_type, TxType::Message);
		assert_eq!(event.revert_message, "0x");
		assert_eq!(event.verification_data, "0xfeff");
	}

	#[test]
	fn outbound_observation_round_trip() {
		let mut raw = OUTBOUND_OBSERVATION_DISCRIMINATOR.to_vec();
		raw.extend([0x11; 32]);
		raw.extend([0x22; 32]);
		let DecodedEvent::OutboundObservation(ev) = decode(&raw).unwrap() else {
			panic!("wrong variant")
		};
		assert_eq!(ev.tx_id, format!("0x{}", "11".repeat(32)));
		assert_eq!(ev.universal_tx_id, format!("0x{}", "22".repeat(32)));
	}
}
