//! In-memory storage backend.
//!
//! Mirrors the Postgres adapter's semantics (join rules, conflict keys,
//! merge upsert, one all-or-nothing write per call) so indexers can be
//! exercised without a database.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use indexer_db::{
    EventLogRow, EventSignature, EvmEvent, EvmEventLog, Layer, Token, UniswapV4Pool, WalletSwap,
};
use sqlx::types::BigDecimal;

use super::{
    BlockBounds, EventSource, PageQuery, Positioned, ProjectionSink, SetLayer, SetProjectionStore,
    SignatureStore, TokenStore,
};
use crate::{block_range::BlockRange, error::AppError, signatures::EventSignatureRegistry};

#[derive(Debug, Clone)]
pub struct RawLog {
    pub chain_id: i32,
    pub block_number: i64,
    pub transaction_hash: Vec<u8>,
    pub log_index: i32,
    pub address: Vec<u8>,
    pub topics: [Option<Vec<u8>>; 4],
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RawTransaction {
    pub chain_id: i32,
    pub hash: Vec<u8>,
    pub transaction_index: i32,
    pub from: Vec<u8>,
    pub to: Option<Vec<u8>>,
    pub value: BigDecimal,
    pub tx_type: Option<i16>,
}

#[derive(Debug, Clone)]
pub struct RawReceipt {
    pub chain_id: i32,
    pub transaction_hash: Vec<u8>,
    pub status: Option<i16>,
    pub gas_used: Option<i64>,
    pub cumulative_gas_used: Option<i64>,
    pub effective_gas_price: Option<BigDecimal>,
}

#[derive(Default)]
struct Tables {
    raw_logs: Vec<RawLog>,
    raw_transactions: Vec<RawTransaction>,
    raw_receipts: Vec<RawReceipt>,
    block_timestamps: HashMap<(i32, i64), DateTime<Utc>>,
    signatures: BTreeMap<Vec<u8>, EventSignature>,
    staging: BTreeMap<(i32, i64, i32), EvmEventLog>,
    analytics: BTreeMap<(i32, Vec<u8>, i32), EvmEvent>,
    pools: BTreeMap<(i32, Vec<u8>), UniswapV4Pool>,
    swaps: BTreeMap<(i32, Vec<u8>, i32), WalletSwap>,
    tokens: BTreeMap<(i32, Vec<u8>), Token>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    bounds_queries: AtomicUsize,
    successful_writes: AtomicUsize,
    fail_writes_after: Mutex<Option<usize>>,
}

pub fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of block-bounds lookups served so far.
    pub fn bounds_queries(&self) -> usize {
        self.bounds_queries.load(Ordering::SeqCst)
    }

    /// Let `writes` more write calls succeed, then fail every later one.
    pub fn fail_writes_after(&self, writes: usize) {
        let done = self.successful_writes.load(Ordering::SeqCst);
        *self.fail_writes_after.lock().unwrap() = Some(done + writes);
    }

    pub fn heal(&self) {
        *self.fail_writes_after.lock().unwrap() = None;
    }

    fn check_write(&self) -> Result<(), AppError> {
        let limit = *self.fail_writes_after.lock().unwrap();
        if let Some(limit) = limit {
            if self.successful_writes.load(Ordering::SeqCst) >= limit {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
        }

        Ok(())
    }

    fn record_write(&self) {
        self.successful_writes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn push_raw_log(&self, log: RawLog, transaction: RawTransaction, receipt: RawReceipt) {
        let mut tables = self.tables.lock().unwrap();
        tables.raw_logs.push(log);
        tables.raw_transactions.push(transaction);
        tables.raw_receipts.push(receipt);
    }

    /// A single log with its transaction and receipt at `block_number`.
    pub fn push_raw_block(&self, chain_id: i32, block_number: i64) {
        let hash = block_number.to_be_bytes().repeat(4);

        self.push_raw_log(
            RawLog {
                chain_id,
                block_number,
                transaction_hash: hash.clone(),
                log_index: 0,
                address: vec![0x11; 20],
                topics: [Some(vec![0xee; 32]), None, None, None],
                data: Vec::new(),
            },
            RawTransaction {
                chain_id,
                hash: hash.clone(),
                transaction_index: 0,
                from: vec![0x22; 20],
                to: Some(vec![0x11; 20]),
                value: BigDecimal::from(0),
                tx_type: Some(2),
            },
            RawReceipt {
                chain_id,
                transaction_hash: hash,
                status: Some(1),
                gas_used: Some(21_000),
                cumulative_gas_used: Some(21_000),
                effective_gas_price: Some(BigDecimal::from(1_000_000_000)),
            },
        );
    }

    pub fn set_block_timestamp(&self, chain_id: i32, block_number: i64, at: DateTime<Utc>) {
        self.tables
            .lock()
            .unwrap()
            .block_timestamps
            .insert((chain_id, block_number), at);
    }

    pub fn push_pool(&self, pool: UniswapV4Pool) {
        let key = (pool.chain_id, pool.pool_id.clone());
        self.tables.lock().unwrap().pools.insert(key, pool);
    }

    pub fn push_token(&self, token: Token) {
        let key = (token.chain_id, token.token_address.clone());
        self.tables.lock().unwrap().tokens.insert(key, token);
    }

    pub fn staging_rows(&self) -> Vec<EvmEventLog> {
        self.tables.lock().unwrap().staging.values().cloned().collect()
    }

    pub fn analytics_rows(&self) -> Vec<EvmEvent> {
        self.tables.lock().unwrap().analytics.values().cloned().collect()
    }

    pub fn pools(&self) -> Vec<UniswapV4Pool> {
        self.tables.lock().unwrap().pools.values().cloned().collect()
    }

    pub fn swaps(&self) -> Vec<WalletSwap> {
        self.tables.lock().unwrap().swaps.values().cloned().collect()
    }

    pub fn token(&self, chain_id: i32, address: Address) -> Option<Token> {
        self.tables
            .lock()
            .unwrap()
            .tokens
            .get(&(chain_id, address.to_vec()))
            .cloned()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.tables.lock().unwrap().tokens.values().cloned().collect()
    }

    pub fn signatures(&self) -> Vec<EventSignature> {
        self.tables.lock().unwrap().signatures.values().cloned().collect()
    }
}

fn project_staging(tables: &Tables, chain_id: i32, range: BlockRange) -> Vec<EvmEventLog> {
    tables
        .raw_logs
        .iter()
        .filter(|log| log.chain_id == chain_id && range.contains(log.block_number))
        .filter_map(|log| {
            let transaction = tables
                .raw_transactions
                .iter()
                .find(|tx| tx.chain_id == chain_id && tx.hash == log.transaction_hash)?;
            let receipt = tables
                .raw_receipts
                .iter()
                .find(|r| r.chain_id == chain_id && r.transaction_hash == log.transaction_hash)?;
            let [topic0, topic1, topic2, topic3] = log.topics.clone();

            Some(EvmEventLog {
                chain_id,
                block_number: log.block_number,
                transaction_hash: log.transaction_hash.clone(),
                transaction_index: transaction.transaction_index,
                log_index: log.log_index,
                tx_from: transaction.from.clone(),
                tx_to: transaction.to.clone(),
                tx_value: transaction.value.clone(),
                tx_type: transaction.tx_type,
                tx_status: receipt.status,
                tx_gas_used: receipt.gas_used,
                tx_cumulative_gas_used: receipt.cumulative_gas_used,
                tx_effective_gas_price: receipt.effective_gas_price.clone(),
                address: log.address.clone(),
                topic0,
                topic1,
                topic2,
                topic3,
                data: log.data.clone(),
            })
        })
        .collect()
}

fn project_analytics(tables: &Tables, chain_id: i32, range: BlockRange) -> Vec<EvmEvent> {
    let registry = EventSignatureRegistry::from_entries(tables.signatures.values());

    tables
        .staging
        .values()
        .filter(|log| log.chain_id == chain_id && range.contains(log.block_number))
        .map(|log| {
            let resolved = registry.resolve(log.topic0.as_deref());

            EvmEvent {
                chain_id,
                block_number: log.block_number,
                transaction_hash: log.transaction_hash.clone(),
                transaction_index: log.transaction_index,
                log_index: log.log_index,
                tx_gas_used: log.tx_gas_used,
                tx_effective_gas_price: log.tx_effective_gas_price.clone(),
                tx_value: log.tx_value.clone(),
                tx_from_address: log.tx_from.clone(),
                tx_to_address: log.tx_to.clone(),
                contract_address: log.address.clone(),
                topic0: log.topic0.clone(),
                topic1: log.topic1.clone(),
                topic2: log.topic2.clone(),
                topic3: log.topic3.clone(),
                data: log.data.clone(),
                event_name: resolved.event_name,
                event_signature: resolved.event_signature,
            }
        })
        .collect()
}

#[async_trait]
impl BlockBounds for InMemoryStore {
    async fn block_bounds(&self, chain_id: i32, layer: Layer) -> Result<Option<(i64, i64)>, AppError> {
        self.bounds_queries.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();

        let blocks: Vec<i64> = match layer {
            Layer::Raw => tables
                .raw_logs
                .iter()
                .filter(|log| log.chain_id == chain_id)
                .map(|log| log.block_number)
                .collect(),
            Layer::Staging => tables
                .staging
                .values()
                .filter(|log| log.chain_id == chain_id)
                .map(|log| log.block_number)
                .collect(),
            Layer::Analytics => tables
                .analytics
                .values()
                .filter(|event| event.chain_id == chain_id)
                .map(|event| event.block_number)
                .collect(),
        };

        Ok(blocks.iter().min().copied().zip(blocks.iter().max().copied()))
    }
}

#[async_trait]
impl SetProjectionStore for InMemoryStore {
    async fn project_range(&self, target: SetLayer, chain_id: i32, range: BlockRange) -> Result<u64, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let mut inserted = 0;

        match target {
            SetLayer::Staging => {
                for row in project_staging(&tables, chain_id, range) {
                    let key = (row.chain_id, row.block_number, row.log_index);
                    if !tables.staging.contains_key(&key) {
                        tables.staging.insert(key, row);
                        inserted += 1;
                    }
                }
            }
            SetLayer::Analytics => {
                for row in project_analytics(&tables, chain_id, range) {
                    let key = (row.chain_id, row.transaction_hash.clone(), row.log_index);
                    if !tables.analytics.contains_key(&key) {
                        tables.analytics.insert(key, row);
                        inserted += 1;
                    }
                }
            }
        }

        self.record_write();
        Ok(inserted)
    }
}

#[async_trait]
impl EventSource for InMemoryStore {
    async fn select_events(&self, query: &PageQuery) -> Result<Vec<EventLogRow>, AppError> {
        let tables = self.tables.lock().unwrap();

        let mut rows: Vec<EventLogRow> = tables
            .analytics
            .values()
            .filter(|event| event.chain_id == query.chain_id && query.range.contains(event.block_number))
            .filter(|event| match query.topic0 {
                Some(topic0) => event.topic0.as_deref() == Some(topic0.as_slice()),
                None => true,
            })
            .filter_map(|event| {
                let block_timestamp = *tables.block_timestamps.get(&(event.chain_id, event.block_number))?;

                Some(EventLogRow {
                    chain_id: event.chain_id,
                    block_number: event.block_number,
                    block_timestamp,
                    transaction_hash: event.transaction_hash.clone(),
                    transaction_index: event.transaction_index,
                    log_index: event.log_index,
                    tx_from_address: event.tx_from_address.clone(),
                    contract_address: event.contract_address.clone(),
                    event_signature: event.event_signature.clone(),
                    topic0: event.topic0.clone(),
                    topic1: event.topic1.clone(),
                    topic2: event.topic2.clone(),
                    topic3: event.topic3.clone(),
                    data: event.data.clone(),
                })
            })
            .filter(|row| query.after.map_or(true, |after| row.position() > after))
            .collect();

        rows.sort_by_key(|row| row.position());
        rows.truncate(query.limit);

        Ok(rows)
    }
}

#[async_trait]
impl ProjectionSink<UniswapV4Pool> for InMemoryStore {
    async fn insert_ignore(&self, rows: &[UniswapV4Pool]) -> Result<u64, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let mut inserted = 0;

        for pool in rows {
            let key = (pool.chain_id, pool.pool_id.clone());
            if !tables.pools.contains_key(&key) {
                tables.pools.insert(key, pool.clone());
                inserted += 1;
            }
        }

        self.record_write();
        Ok(inserted)
    }
}

#[async_trait]
impl ProjectionSink<WalletSwap> for InMemoryStore {
    async fn insert_ignore(&self, rows: &[WalletSwap]) -> Result<u64, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let mut inserted = 0;

        for swap in rows {
            let key = (swap.chain_id, swap.transaction_hash.clone(), swap.log_index);
            if !tables.swaps.contains_key(&key) {
                tables.swaps.insert(key, swap.clone());
                inserted += 1;
            }
        }

        self.record_write();
        Ok(inserted)
    }
}

#[async_trait]
impl TokenStore for InMemoryStore {
    async fn token_candidates(&self, chain_id: i32, limit: Option<usize>) -> Result<Vec<Address>, AppError> {
        let tables = self.tables.lock().unwrap();

        let referenced: BTreeSet<&Vec<u8>> = tables
            .pools
            .values()
            .filter(|pool| pool.chain_id == chain_id)
            .flat_map(|pool| [&pool.token0_address, &pool.token1_address])
            .collect();

        let candidates = referenced
            .into_iter()
            .filter(|address| address.as_slice() != Address::ZERO.as_slice())
            .filter(|address| {
                match tables.tokens.get(&(chain_id, (*address).clone())) {
                    None => true,
                    Some(token) => token.symbol.is_none() || token.decimals.is_none(),
                }
            })
            .filter(|address| address.len() == 20)
            .map(|address| Address::from_slice(address))
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        Ok(candidates)
    }

    async fn upsert_tokens(&self, tokens: &[Token]) -> Result<u64, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();

        for token in tokens {
            let key = (token.chain_id, token.token_address.clone());
            match tables.tokens.get_mut(&key) {
                Some(existing) => {
                    existing.symbol = token.symbol.clone().or(existing.symbol.take());
                    existing.name = token.name.clone().or(existing.name.take());
                    existing.decimals = token.decimals.or(existing.decimals);
                    existing.updated_at = token.updated_at;
                }
                None => {
                    tables.tokens.insert(key, token.clone());
                }
            }
        }

        self.record_write();
        Ok(tokens.len() as u64)
    }
}

#[async_trait]
impl SignatureStore for InMemoryStore {
    async fn insert_signatures(&self, signatures: &[EventSignature]) -> Result<u64, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let mut inserted = 0;

        for signature in signatures {
            if !tables.signatures.contains_key(&signature.topic0) {
                tables.signatures.insert(signature.topic0.clone(), signature.clone());
                inserted += 1;
            }
        }

        self.record_write();
        Ok(inserted)
    }
}
