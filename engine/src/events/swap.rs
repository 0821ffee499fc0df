//! Swap event decoder
//!
//! Event signature: Swap(bytes32 indexed id, address indexed sender, int128 amount0, int128 amount1, uint160 sqrtPriceX96, uint128 liquidity, int24 tick, uint24 fee)
//! Topic0: 0x40e9cecb9f5f1f1c5b9c97dec2917b7ee92e57ba5563708daca94dd84ad7112f

use alloy::primitives::{Address, B256, I256, U256};

use super::{
    abi::{as_address, as_bytes32, as_i256, as_u256, AbiEventDecoder},
    DecodeRejection, DecodedEvent, EventDecoder, LogView,
};
use crate::error::AppError;

/// Decoded Swap event payload. Amounts are signed balance deltas of the
/// pool from the swapper's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapEvent {
    pub pool_id: B256,
    pub sender: Address,
    pub amount0: I256,
    pub amount1: I256,
    pub sqrt_price_x96: Option<U256>,
    pub liquidity: Option<U256>,
    pub tick: Option<i32>,
    pub fee: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SwapDecoder {
    abi: AbiEventDecoder,
}

impl SwapDecoder {
    pub const EVENT_NAME: &'static str = "Swap";

    pub fn new(abi: AbiEventDecoder) -> Result<Self, AppError> {
        if abi.indexed_count() < 2 {
            return Err(AppError::Abi(format!(
                "{} must declare at least 2 indexed inputs (id, sender), found {}",
                abi.name(),
                abi.indexed_count()
            )));
        }

        Ok(Self { abi })
    }

    pub fn from_abi_json(json: &str) -> Result<Self, AppError> {
        Self::new(AbiEventDecoder::from_abi_json(json, Self::EVENT_NAME)?)
    }

    pub fn decode_swap(&self, log: &LogView<'_>) -> Result<SwapEvent, DecodeRejection> {
        let fields = self.abi.decode(log)?;

        let pool_id = fields
            .indexed_at(0)
            .and_then(as_bytes32)
            .ok_or(DecodeRejection::MissingField("id"))?;
        let sender = fields
            .indexed_at(1)
            .and_then(as_address)
            .ok_or(DecodeRejection::MissingField("sender"))?;
        let amount0 = fields
            .payload_field(&["amount0"])
            .and_then(as_i256)
            .ok_or(DecodeRejection::MissingField("amount0"))?;
        let amount1 = fields
            .payload_field(&["amount1"])
            .and_then(as_i256)
            .ok_or(DecodeRejection::MissingField("amount1"))?;

        Ok(SwapEvent {
            pool_id,
            sender,
            amount0,
            amount1,
            sqrt_price_x96: fields
                .payload_field(&["sqrtPriceX96", "sqrt_price_x96"])
                .and_then(as_u256),
            liquidity: fields.payload_field(&["liquidity"]).and_then(as_u256),
            tick: fields
                .payload_field(&["tick"])
                .and_then(as_i256)
                .and_then(|tick| i32::try_from(tick).ok()),
            fee: fields
                .payload_field(&["fee"])
                .and_then(as_u256)
                .and_then(|fee| u32::try_from(fee).ok()),
        })
    }
}

impl EventDecoder for SwapDecoder {
    fn topic0(&self) -> B256 {
        self.abi.topic0()
    }

    fn decode(&self, log: &LogView<'_>) -> Result<DecodedEvent, DecodeRejection> {
        self.decode_swap(log).map(DecodedEvent::Swap)
    }
}
