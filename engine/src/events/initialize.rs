//! Initialize event decoder
//!
//! Event signature: Initialize(bytes32 indexed id, address indexed currency0, address indexed currency1, uint24 fee, int24 tickSpacing, address hooks, uint160 sqrtPriceX96, int24 tick)
//! Topic0: 0xdd466e674ea557f56295e2d0218a125ea4b4f0f6f3307b95f85e6110838d6438

use alloy::primitives::{Address, B256, U256};

use super::{
    abi::{as_address, as_bytes32, as_i256, as_u256, AbiEventDecoder},
    DecodeRejection, DecodedEvent, EventDecoder, LogView,
};
use crate::error::AppError;

/// Decoded Initialize event payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolInitialized {
    pub pool_id: B256,
    pub currency0: Address,
    pub currency1: Address,
    pub fee: Option<u32>,
    pub tick_spacing: Option<i32>,
    pub hooks: Option<Address>,
    pub sqrt_price_x96: Option<U256>,
    pub tick: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct InitializeDecoder {
    abi: AbiEventDecoder,
}

impl InitializeDecoder {
    pub const EVENT_NAME: &'static str = "Initialize";

    /// The pool id and both currencies must be the three indexed inputs;
    /// any other shape is a broken ABI, not a per-row condition.
    pub fn new(abi: AbiEventDecoder) -> Result<Self, AppError> {
        if abi.indexed_count() != 3 {
            return Err(AppError::Abi(format!(
                "{} must declare exactly 3 indexed inputs (id, currency0, currency1), found {}",
                abi.name(),
                abi.indexed_count()
            )));
        }

        Ok(Self { abi })
    }

    pub fn from_abi_json(json: &str) -> Result<Self, AppError> {
        Self::new(AbiEventDecoder::from_abi_json(json, Self::EVENT_NAME)?)
    }

    pub fn decode_initialize(&self, log: &LogView<'_>) -> Result<PoolInitialized, DecodeRejection> {
        let fields = self.abi.decode(log)?;

        let pool_id = fields
            .indexed_at(0)
            .and_then(as_bytes32)
            .ok_or(DecodeRejection::MissingField("id"))?;
        let currency0 = fields
            .indexed_at(1)
            .and_then(as_address)
            .ok_or(DecodeRejection::MissingField("currency0"))?;
        let currency1 = fields
            .indexed_at(2)
            .and_then(as_address)
            .ok_or(DecodeRejection::MissingField("currency1"))?;

        Ok(PoolInitialized {
            pool_id,
            currency0,
            currency1,
            fee: fields
                .payload_field(&["fee"])
                .and_then(as_u256)
                .and_then(|fee| u32::try_from(fee).ok()),
            tick_spacing: fields
                .payload_field(&["tickSpacing", "tick_spacing"])
                .and_then(as_i256)
                .and_then(|spacing| i32::try_from(spacing).ok()),
            hooks: fields.payload_field(&["hooks"]).and_then(as_address),
            sqrt_price_x96: fields
                .payload_field(&["sqrtPriceX96", "sqrt_price_x96"])
                .and_then(as_u256),
            tick: fields
                .payload_field(&["tick"])
                .and_then(as_i256)
                .and_then(|tick| i32::try_from(tick).ok()),
        })
    }
}

impl EventDecoder for InitializeDecoder {
    fn topic0(&self) -> B256 {
        self.abi.topic0()
    }

    fn decode(&self, log: &LogView<'_>) -> Result<DecodedEvent, DecodeRejection> {
        self.decode_initialize(log).map(DecodedEvent::PoolInitialized)
    }
}
