use alloy::primitives::B256;
use indexer_db::{EventLogRow, UniswapV4Pool};

use crate::{
    events::{DecodedEvent, EventDecoder, LogView},
    indexer::Projection,
};

/// `Initialize` events into the pool registry.
pub struct PoolsProjection<D> {
    decoder: D,
}

impl<D: EventDecoder> PoolsProjection<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }
}

impl<D: EventDecoder> Projection for PoolsProjection<D> {
    type Target = UniswapV4Pool;

    fn name(&self) -> &'static str {
        "uniswap_v4_pools"
    }

    fn topic0(&self) -> Option<B256> {
        Some(self.decoder.topic0())
    }

    fn project(&self, row: &EventLogRow) -> Option<UniswapV4Pool> {
        let pool = match self.decoder.decode(&LogView::from(row)) {
            Ok(DecodedEvent::PoolInitialized(pool)) => pool,
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

        Some(UniswapV4Pool {
            chain_id: row.chain_id,
            pool_id: pool.pool_id.to_vec(),
            pool_manager: row.contract_address.clone(),
            token0_address: pool.currency0.to_vec(),
            token1_address: pool.currency1.to_vec(),
            fee: pool.fee.and_then(|fee| i32::try_from(fee).ok()),
            tick_spacing: pool.tick_spacing,
            hooks: pool.hooks.map(|hooks| hooks.to_vec()),
            created_block: row.block_number,
            created_timestamp: row.block_timestamp,
        })
    }
}
