//! Schema-driven event decoding.
//!
//! An [`AbiEventDecoder`] is built once from a JSON ABI document and one event
//! name. It owns the canonical signature, its keccak256 hash (`topic0`) and
//! the declared inputs split into indexed (topic slots 1..=3) and non-indexed
//! (ABI-encoded payload) lists, both in declaration order.

use std::path::Path;

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{Event, JsonAbi},
    primitives::{Address, B256, I256, U256},
};
use serde::Deserialize;

use super::{DecodeRejection, LogView};
use crate::error::AppError;

/// Topic slots after `topic0` available to indexed inputs.
pub const MAX_INDEXED_INPUTS: usize = 3;

/// Accepts a bare ABI array or a compiler artifact with an `abi` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum AbiDocument {
    Bare(JsonAbi),
    Artifact { abi: JsonAbi },
}

pub fn parse_abi(json: &str) -> Result<JsonAbi, AppError> {
    let document: AbiDocument = serde_json::from_str(json)
        .map_err(|err| AppError::Abi(format!("unsupported ABI document: {err}")))?;

    Ok(match document {
        AbiDocument::Bare(abi) | AbiDocument::Artifact { abi } => abi,
    })
}

pub fn read_abi_file(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path)
        .map_err(|err| AppError::Abi(format!("cannot read ABI file {}: {err}", path.display())))
}

#[derive(Debug, Clone)]
struct Input {
    name: String,
    ty: DynSolType,
}

/// Decoded fields in declaration order: indexed inputs first, then payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFields {
    pub indexed: Vec<(String, DynSolValue)>,
    pub payload: Vec<(String, DynSolValue)>,
}

impl DecodedFields {
    /// First payload field matching any of `names`.
    pub fn payload_field(&self, names: &[&str]) -> Option<&DynSolValue> {
        names
            .iter()
            .find_map(|name| self.payload.iter().find(|(field, _)| field == name))
            .map(|(_, value)| value)
    }

    pub fn indexed_at(&self, position: usize) -> Option<&DynSolValue> {
        self.indexed.get(position).map(|(_, value)| value)
    }
}

#[derive(Debug, Clone)]
pub struct AbiEventDecoder {
    name: String,
    signature: String,
    topic0: B256,
    indexed: Vec<Input>,
    non_indexed: Vec<Input>,
    payload_type: DynSolType,
}

impl AbiEventDecoder {
    pub fn from_abi_json(json: &str, event_name: &str) -> Result<Self, AppError> {
        let abi = parse_abi(json)?;

        match abi.events.get(event_name).map(Vec::as_slice) {
            Some([event]) => Self::from_event(event),
            Some(overloads) => Err(AppError::Abi(format!(
                "event `{event_name}` is ambiguous ({} overloads)",
                overloads.len()
            ))),
            None => Err(AppError::Abi(format!("event `{event_name}` not found in ABI"))),
        }
    }

    pub fn from_event(event: &Event) -> Result<Self, AppError> {
        if event.anonymous {
            return Err(AppError::Abi(format!(
                "event `{}` is anonymous and has no topic0",
                event.name
            )));
        }

        let mut indexed = Vec::new();
        let mut non_indexed = Vec::new();

        for param in &event.inputs {
            let ty = param.resolve().map_err(|err| {
                AppError::Abi(format!(
                    "event `{}` input `{}` has unsupported type `{}`: {err}",
                    event.name, param.name, param.ty
                ))
            })?;
            let input = Input {
                name: param.name.clone(),
                ty,
            };

            if param.indexed {
                indexed.push(input);
            } else {
                non_indexed.push(input);
            }
        }

        if indexed.len() > MAX_INDEXED_INPUTS {
            return Err(AppError::Abi(format!(
                "event `{}` declares {} indexed inputs, at most {MAX_INDEXED_INPUTS} fit in topics",
                event.name,
                indexed.len()
            )));
        }

        let payload_type = DynSolType::Tuple(non_indexed.iter().map(|input| input.ty.clone()).collect());

        let decoder = Self {
            name: event.name.clone(),
            signature: event.signature(),
            topic0: event.selector(),
            indexed,
            non_indexed,
            payload_type,
        };
        tracing::debug!(
            event = decoder.signature(),
            indexed = ?decoder.indexed_names().collect::<Vec<_>>(),
            payload = ?decoder.payload_names().collect::<Vec<_>>(),
            "Built event decoder"
        );

        Ok(decoder)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical `Name(type1,type2,...)`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn topic0(&self) -> B256 {
        self.topic0
    }

    pub fn indexed_count(&self) -> usize {
        self.indexed.len()
    }

    pub fn indexed_names(&self) -> impl Iterator<Item = &str> {
        self.indexed.iter().map(|input| input.name.as_str())
    }

    pub fn payload_names(&self) -> impl Iterator<Item = &str> {
        self.non_indexed.iter().map(|input| input.name.as_str())
    }

    /// Structural decode: event identity, topic presence and payload shape.
    /// Whether the result is usable is left to the caller.
    pub fn decode(&self, log: &LogView<'_>) -> Result<DecodedFields, DecodeRejection> {
        let topic0 = log.topic0.ok_or(DecodeRejection::MissingTopic0)?;
        if topic0 != self.topic0.as_slice() {
            return Err(DecodeRejection::WrongEvent);
        }

        let topics = [log.topic1, log.topic2, log.topic3];
        let mut indexed = Vec::with_capacity(self.indexed.len());

        for (slot, input) in self.indexed.iter().enumerate() {
            let raw = topics[slot].ok_or(DecodeRejection::MissingIndexedTopic(slot + 1))?;
            if raw.len() != 32 {
                return Err(DecodeRejection::MalformedTopic(slot + 1));
            }

            indexed.push((input.name.clone(), decode_topic(&input.ty, B256::from_slice(raw))));
        }

        let values = match self.payload_type.abi_decode_sequence(log.data) {
            Ok(DynSolValue::Tuple(values)) => values,
            Ok(_) => return Err(DecodeRejection::Payload("expected a tuple".to_string())),
            Err(err) => return Err(DecodeRejection::Payload(err.to_string())),
        };

        let payload = self
            .non_indexed
            .iter()
            .zip(values)
            .map(|(input, value)| (input.name.clone(), value))
            .collect();

        Ok(DecodedFields { indexed, payload })
    }
}

/// Indexed values occupy one word each. Value types are read in place;
/// dynamic and composite types are stored as their keccak256 hash and are
/// returned as that raw word.
fn decode_topic(ty: &DynSolType, word: B256) -> DynSolValue {
    match ty {
        // High 12 bytes are padding.
        DynSolType::Address => DynSolValue::Address(Address::from_word(word)),
        DynSolType::Bool => DynSolValue::Bool(!word.is_zero()),
        DynSolType::Uint(bits) => DynSolValue::Uint(U256::from_be_bytes(word.0), *bits),
        DynSolType::Int(bits) => DynSolValue::Int(I256::from_be_bytes(word.0), *bits),
        DynSolType::FixedBytes(size) => DynSolValue::FixedBytes(word, *size),
        _ => DynSolValue::FixedBytes(word, 32),
    }
}

/// Canonical 20-byte address from an address value, a big-endian integer,
/// a 20/32-byte byte string or a hex string.
pub fn as_address(value: &DynSolValue) -> Option<Address> {
    match value {
        DynSolValue::Address(address) => Some(*address),
        DynSolValue::Uint(value, _) => {
            (*value <= U256::from_be_slice(&[0xff; 20])).then(|| Address::from_word(B256::from(*value)))
        }
        DynSolValue::FixedBytes(word, 20) => Some(Address::from_slice(&word[..20])),
        DynSolValue::FixedBytes(word, 32) => Some(Address::from_word(*word)),
        DynSolValue::Bytes(bytes) if bytes.len() == 20 => Some(Address::from_slice(bytes)),
        DynSolValue::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_bytes32(value: &DynSolValue) -> Option<B256> {
    match value {
        DynSolValue::FixedBytes(word, 32) => Some(*word),
        DynSolValue::Bytes(bytes) if bytes.len() == 32 => Some(B256::from_slice(bytes)),
        DynSolValue::Uint(value, _) => Some(B256::from(*value)),
        _ => None,
    }
}

/// Unsigned integers, and signed integers that are non-negative.
pub fn as_u256(value: &DynSolValue) -> Option<U256> {
    match value {
        DynSolValue::Uint(value, _) => Some(*value),
        DynSolValue::Int(value, _) => U256::try_from(*value).ok(),
        _ => None,
    }
}

/// Signed integers as declared; unsigned ones when they fit.
pub fn as_i256(value: &DynSolValue) -> Option<I256> {
    match value {
        DynSolValue::Int(value, _) => Some(*value),
        DynSolValue::Uint(value, _) => I256::try_from(*value).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::keccak256;

    use super::*;
    use crate::events::test_utils::*;

    #[test]
    fn test_signature_and_topic0_follow_declaration() {
        let decoder = AbiEventDecoder::from_abi_json(POOL_MANAGER_ABI, "Initialize").unwrap();

        assert_eq!(
            decoder.signature(),
            "Initialize(bytes32,address,address,uint24,int24,address,uint160,int24)"
        );
        assert_eq!(decoder.topic0(), keccak256(decoder.signature()));
        assert_eq!(decoder.indexed_names().collect::<Vec<_>>(), ["id", "currency0", "currency1"]);
        assert_eq!(
            decoder.payload_names().collect::<Vec<_>>(),
            ["fee", "tickSpacing", "hooks", "sqrtPriceX96", "tick"]
        );
    }

    #[test]
    fn test_bare_array_document_is_accepted() {
        let bare = r#"[{"type":"event","name":"Ping","anonymous":false,"inputs":[
            {"name":"who","type":"address","indexed":true},
            {"name":"value","type":"uint256","indexed":false}
        ]}]"#;

        let decoder = AbiEventDecoder::from_abi_json(bare, "Ping").unwrap();
        assert_eq!(decoder.signature(), "Ping(address,uint256)");
        assert_eq!(decoder.indexed_count(), 1);
    }

    #[test]
    fn test_construction_failures() {
        assert!(matches!(
            AbiEventDecoder::from_abi_json(POOL_MANAGER_ABI, "Burn"),
            Err(AppError::Abi(_))
        ));
        assert!(matches!(
            AbiEventDecoder::from_abi_json("{\"not\": \"an abi\"}", "Swap"),
            Err(AppError::Abi(_))
        ));
        assert!(matches!(
            read_abi_file(Path::new("does/not/exist.json")),
            Err(AppError::Abi(_))
        ));

        let overloaded = r#"[
            {"type":"event","name":"Ping","anonymous":false,"inputs":[]},
            {"type":"event","name":"Ping","anonymous":false,"inputs":[{"name":"a","type":"uint8","indexed":false}]}
        ]"#;
        let err = AbiEventDecoder::from_abi_json(overloaded, "Ping").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_foreign_topic0_is_always_rejected() {
        let decoder = AbiEventDecoder::from_abi_json(POOL_MANAGER_ABI, "Swap").unwrap();
        let foreign = keccak256("Transfer(address,address,uint256)");
        let topic = word_addr(ALICE);
        let data = [word_i(-5), word_i(7)].concat();

        for (topic1, topic2) in [(None, None), (Some(&topic[..]), Some(&topic[..]))] {
            let log = LogView {
                topic0: Some(foreign.as_slice()),
                topic1,
                topic2,
                topic3: None,
                data: &data,
            };
            assert_eq!(decoder.decode(&log), Err(DecodeRejection::WrongEvent));
        }

        let anonymous = LogView {
            topic0: None,
            topic1: None,
            topic2: None,
            topic3: None,
            data: &[],
        };
        assert_eq!(decoder.decode(&anonymous), Err(DecodeRejection::MissingTopic0));
    }

    #[test]
    fn test_missing_and_malformed_topics() {
        let decoder = AbiEventDecoder::from_abi_json(POOL_MANAGER_ABI, "Swap").unwrap();
        let topic0 = decoder.topic0();
        let pool = [0x11u8; 32];

        let missing_sender = LogView {
            topic0: Some(topic0.as_slice()),
            topic1: Some(&pool),
            topic2: None,
            topic3: None,
            data: &[],
        };
        assert_eq!(decoder.decode(&missing_sender), Err(DecodeRejection::MissingIndexedTopic(2)));

        let short = [0u8; 20];
        let malformed = LogView {
            topic2: Some(&short),
            ..missing_sender
        };
        assert_eq!(decoder.decode(&malformed), Err(DecodeRejection::MalformedTopic(2)));
    }

    #[test]
    fn test_indexed_address_ignores_padding() {
        let decoder = AbiEventDecoder::from_abi_json(POOL_MANAGER_ABI, "Donate").unwrap();
        let topic0 = decoder.topic0();
        let pool = [0x22u8; 32];
        let mut dirty = word_addr(ALICE);
        dirty[..12].copy_from_slice(&[0xaa; 12]);
        let data = [word_u(1), word_u(2)].concat();

        let fields = decoder
            .decode(&LogView {
                topic0: Some(topic0.as_slice()),
                topic1: Some(&pool),
                topic2: Some(&dirty),
                topic3: None,
                data: &data,
            })
            .unwrap();

        assert_eq!(fields.indexed_at(1).and_then(as_address), Some(ALICE));
        assert_eq!(fields.indexed_at(0).and_then(as_bytes32), Some(B256::from(pool)));
        assert_eq!(fields.payload_field(&["amount1"]).and_then(as_u256), Some(U256::from(2)));
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let decoder = AbiEventDecoder::from_abi_json(POOL_MANAGER_ABI, "Donate").unwrap();
        let topic0 = decoder.topic0();
        let pool = [0x22u8; 32];
        let sender = word_addr(ALICE);
        let data = word_u(1);

        let result = decoder.decode(&LogView {
            topic0: Some(topic0.as_slice()),
            topic1: Some(&pool),
            topic2: Some(&sender),
            topic3: None,
            data: &data,
        });

        assert!(matches!(result, Err(DecodeRejection::Payload(_))));
    }

    #[test]
    fn test_address_coercions() {
        let from_uint = DynSolValue::Uint(U256::from_be_slice(ALICE.as_slice()), 256);
        let from_hex = DynSolValue::String(format!("{ALICE:#x}"));
        let too_wide = DynSolValue::Uint(U256::MAX, 256);

        assert_eq!(as_address(&from_uint), Some(ALICE));
        assert_eq!(as_address(&from_hex), Some(ALICE));
        assert_eq!(as_address(&too_wide), None);
        assert_eq!(as_i256(&DynSolValue::Uint(U256::MAX, 256)), None);
    }
}
