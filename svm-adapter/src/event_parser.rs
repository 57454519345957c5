//! Event Parser (C4): attaches chain-level identity to decoded payloads and filters by the
//! configured discriminator whitelist (spec §4.3).

use std::collections::HashMap;

use base64::Engine as _;
use solana_rpc::responses::EncodedConfirmedTransactionWithStatusMeta;
use sol_prim::Address;

use crate::{
	config::ConfirmationType,
	decoder,
	event::{ConfirmationLabel, Event},
};

const LOG_PREFIX: &str = "Program data: ";

fn as_label(ty: ConfirmationType) -> ConfirmationLabel {
	match ty {
		ConfirmationType::Fast => ConfirmationLabel::Fast,
		ConfirmationType::Standard => ConfirmationLabel::Standard,
	}
}

/// Holds the gateway identity and the discriminator whitelist; stateless otherwise.
pub struct EventParser {
	pub chain_id: String,
	pub gateway_program: Address,
	pub discriminator_map: HashMap<[u8; 8], ConfirmationType>,
}

impl EventParser {
	pub fn new(
		chain_id: String,
		gateway_program: Address,
		discriminator_map: HashMap<[u8; 8], ConfirmationType>,
	) -> Self {
		Self { chain_id, gateway_program, discriminator_map }
	}

	/// Parses every whitelisted `"Program data: <base64>"` log of `tx` into a persistable
	/// [`Event`]. Returns an empty vec if `tx`/`tx.meta`/`tx.meta.log_messages` is missing, per
	/// spec §4.3 — this is not an error, just nothing to ingest from this transaction.
	pub fn parse_gateway_event(
		&self,
		tx: &EncodedConfirmedTransactionWithStatusMeta,
		signature: &str,
		created_at: i64,
	) -> Vec<Event> {
		let Some(meta) = &tx.meta else { return Vec::new() };
		let Some(logs) = &meta.log_messages else { return Vec::new() };

		let mut events = Vec::new();
		for (log_index, log) in logs.iter().enumerate() {
			let Some(b64) = log.strip_prefix(LOG_PREFIX) else { continue };
			let Ok(raw) = base64::engine::general_purpose::STANDARD.decode(b64) else { continue };
			if raw.len() < 8 {
				continue;
			}
			let discriminator: [u8; 8] = raw[..8].try_into().unwrap();
			let Some(&confirmation_type) = self.discriminator_map.get(&discriminator) else {
				continue;
			};

			let decoded = match decoder::decode(&raw) {
				Ok(d) => d,
				Err(e) => {
					tracing::warn!(signature, log_index, error = %e, "failed to decode gateway event, skipping");
					continue;
				},
			};

			let (event_type, event_data) = match &decoded {
				decoder::DecodedEvent::TxWithFunds(d) => ("TxWithFunds", serde_json::to_value(d)),
				decoder::DecodedEvent::OutboundObservation(d) =>
					("OutboundObservation", serde_json::to_value(d)),
			};
			let event_data = match event_data {
				Ok(v) => v,
				Err(e) => {
					tracing::warn!(signature, log_index, error = %e, "failed to serialize decoded event");
					continue;
				},
			};

			events.push(Event::new(
				signature,
				log_index as u32,
				&self.chain_id,
				event_type,
				tx.slot,
				as_label(confirmation_type),
				event_data,
				created_at,
			));
		}
		events
	}
}

#[cfg(test)]
mod tests {
	use std::str::FromStr;

	use solana_rpc::responses::TransactionMeta;

	use super::*;
	use crate::decoder::TX_WITH_FUNDS_DISCRIMINATOR;

	fn synthetic_log() -> String {
		let mut raw = TX_WITH_FUNDS_DISCRIMINATOR.to_vec();
		raw.extend([0xaa; 32]);
		raw.extend([0xbb; 32]);
		raw.extend(1u64.to_le_bytes());
		raw.extend(2u64.to_le_bytes());
		raw.extend([0xcc; 32]);
		raw.extend(0u32.to_le_bytes());
		raw.push(0);
		raw.extend(0u32.to_le_bytes());
		raw.push(0);
		raw.extend(0u32.to_le_bytes());
		let b64 = base64::engine::general_purpose::STANDARD.encode(raw);
		format!("{LOG_PREFIX}{b64}")
	}

	fn parser() -> EventParser {
		let mut map = HashMap::new();
		map.insert(TX_WITH_FUNDS_DISCRIMINATOR, ConfirmationType::Fast);
		EventParser::new(
			"solana:H".to_string(),
			Address::from_str("11111111111111111111111111111111").unwrap(),
			map,
		)
	}

	#[test]
	fn missing_meta_yields_no_events() {
		let tx =
			EncodedConfirmedTransactionWithStatusMeta { slot: 10, meta: None, block_time: None };
		assert!(parser().parse_gateway_event(&tx, "sig", 0).is_empty());
	}

	#[test]
	fn whitelisted_log_produces_one_event() {
		let tx = EncodedConfirmedTransactionWithStatusMeta {
			slot: 42,
			meta: Some(TransactionMeta { err: None, log_messages: Some(vec![synthetic_log()]) }),
			block_time: None,
		};
		let events = parser().parse_gateway_event(&tx, "sig5", 100);
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].event_id, "sig5:0");
		assert_eq!(events[0].block_height, 42);
		assert_eq!(events[0].confirmation_type, ConfirmationLabel::Fast);
	}

	#[test]
	fn non_whitelisted_discriminator_is_skipped() {
		let mut raw = [0xff; 8].to_vec();
		raw.extend([0u8; 32]);
		let b64 = base64::engine::general_purpose::STANDARD.encode(raw);
		let tx = EncodedConfirmedTransactionWithStatusMeta {
			slot: 1,
			meta: Some(TransactionMeta {
				err: None,
				log_messages: Some(vec![format!("{LOG_PREFIX}{b64}")]),
			}),
			block_time: None,
		};
		assert!(parser().parse_gateway_event(&tx, "sig", 0).is_empty());
	}

	#[test]
	fn non_program_data_logs_are_ignored() {
		let tx = EncodedConfirmedTransactionWithStatusMeta {
			slot: 1,
			meta: Some(TransactionMeta {
				err: None,
				log_messages: Some(vec!["Program 1111 invoke [1]".to_string()]),
			}),
			block_time: None,
		};
		assert!(parser().parse_gateway_event(&tx, "sig", 0).is_empty());
	}
}
