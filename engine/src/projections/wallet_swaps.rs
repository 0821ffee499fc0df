use alloy::primitives::B256;
use indexer_db::{EventLogRow, WalletSwap};

use super::to_numeric;
use crate::{
    events::{DecodedEvent, EventDecoder, LogView},
    indexer::Projection,
};

/// `Swap` events into per-wallet swap rows.
///
/// The wallet is the transaction's top-level sender. For router or
/// multicall transactions this is the caller of the outer contract, not
/// necessarily the account that initiated this particular swap.
pub struct WalletSwapsProjection<D> {
    decoder: D,
}

impl<D: EventDecoder> WalletSwapsProjection<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }
}

impl<D: EventDecoder> Projection for WalletSwapsProjection<D> {
    type Target = WalletSwap;

    fn name(&self) -> &'static str {
        "uniswap_v4_wallet_swaps"
    }

    fn topic0(&self) -> Option<B256> {
        Some(self.decoder.topic0())
    }

    fn project(&self, row: &EventLogRow) -> Option<WalletSwap> {
        let swap = match self.decoder.decode(&LogView::from(row)) {
            Ok(DecodedEvent::Swap(swap)) => swap,
            Ok(_) => return None,
            Err(rejection) => {
                tracing::trace!(
                    block_number = row.block_number,
                    log_index = row.log_index,
                    %rejection,
                    "Skipping log"
                );
                return None;
            }
        };

        Some(WalletSwap {
            chain_id: row.chain_id,
            block_number: row.block_number,
            block_timestamp: row.block_timestamp,
            transaction_hash: row.transaction_hash.clone(),
            transaction_index: row.transaction_index,
            log_index: row.log_index,
            wallet_address: row.tx_from_address.clone(),
            pool_manager: row.contract_address.clone(),
            pool_id: swap.pool_id.to_vec(),
            sender: Some(swap.sender.to_vec()),
            amount0: to_numeric(swap.amount0)?,
            amount1: to_numeric(swap.amount1)?,
            sqrt_price_x96: swap.sqrt_price_x96.and_then(to_numeric),
            liquidity: swap.liquidity.and_then(to_numeric),
            tick: swap.tick,
            event_signature: Some(row.event_signature.clone()),
        })
    }
}
