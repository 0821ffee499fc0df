use std::collections::HashMap;

use alloy::primitives::B256;
use indexer_db::EventSignature;

use crate::{events::abi::parse_abi, error::AppError};

#[cfg(test)]
pub const UNKNOWN_EVENT: &str = "unknown";

/// `topic0 -> (event_name, event_signature)` lookup used to enrich analytics
/// rows. Misses are tolerated and fall back to the raw hash.
#[derive(Debug, Clone, Default)]
pub struct EventSignatureRegistry {
    entries: HashMap<B256, (String, String)>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub event_name: String,
    pub event_signature: String,
}

impl EventSignatureRegistry {
    /// Every non-anonymous event declared in the ABI document.
    pub fn from_abi_json(json: &str) -> Result<Self, AppError> {
        let abi = parse_abi(json)?;

        let entries = abi
            .events()
            .filter(|event| !event.anonymous)
            .map(|event| (event.selector(), (event.name.clone(), event.signature())))
            .collect();

        Ok(Self { entries })
    }

    #[cfg(test)]
    pub fn from_entries<'a>(signatures: impl IntoIterator<Item = &'a EventSignature>) -> Self {
        let entries = signatures
            .into_iter()
            .filter(|entry| entry.topic0.len() == 32)
            .map(|entry| {
                (
                    B256::from_slice(&entry.topic0),
                    (entry.event_name.clone(), entry.event_signature.clone()),
                )
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same fallbacks as the analytics projection SQL.
    #[cfg(test)]
    pub fn resolve(&self, topic0: Option<&[u8]>) -> ResolvedEvent {
        let Some(topic0) = topic0 else {
            return ResolvedEvent {
                event_name: UNKNOWN_EVENT.to_string(),
                event_signature: UNKNOWN_EVENT.to_string(),
            };
        };

        let known = (topic0.len() == 32)
            .then(|| B256::from_slice(topic0))
            .and_then(|hash| self.entries.get(&hash));

        match known {
            Some((event_name, event_signature)) => ResolvedEvent {
                event_name: event_name.clone(),
                event_signature: event_signature.clone(),
            },
            None => ResolvedEvent {
                event_name: UNKNOWN_EVENT.to_string(),
                event_signature: alloy::primitives::hex::encode_prefixed(topic0),
            },
        }
    }

    /// Dictionary rows ordered by signature, ready for seeding.
    pub fn to_rows(&self) -> Vec<EventSignature> {
        let mut rows: Vec<EventSignature> = self
            .entries
            .iter()
            .map(|(topic0, (event_name, event_signature))| EventSignature {
                topic0: topic0.to_vec(),
                event_name: event_name.clone(),
                event_signature: event_signature.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.event_signature.cmp(&b.event_signature));

        rows
    }
}
