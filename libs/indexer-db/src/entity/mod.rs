// Staging and analytics layers
pub mod event_signature;
pub mod evm_event;
pub mod evm_event_log;

// Domain layer
pub mod token;
pub mod uniswap_v4_pool;
pub mod wallet_swap;

// Re-exports for convenience
pub use event_signature::EventSignature;
pub use evm_event::{EventLogRow, EventPage, EvmEvent};
pub use evm_event_log::EvmEventLog;
pub use token::Token;
pub use uniswap_v4_pool::UniswapV4Pool;
pub use wallet_swap::WalletSwap;
