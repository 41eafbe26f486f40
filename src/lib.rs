//! Oracle Prediction Market Program
//!
//! Binary prediction markets on Solana, resolved against a Switchboard price feed.
//!
//! ## Architecture
//!
//! - A singleton `Global` account holds the fee policy and the fee authority
//! - One `Market` per creator binds two outcome mints to an oracle feed and a
//!   strike threshold
//! - Liquidity and bets are paid in lamports; a flat fee per action is routed
//!   to the fee authority
//!
//! ## Key Features
//!
//! - Staleness-checked oracle reads (`GetRes`)
//! - Market creation with outcome mint and feed validation
//! - Proportional two-sided liquidity
//! - Forward-only lifecycle: Open -> Resolved -> Settled
//! - Structured events via `sol_log_data`

pub mod cpi;
pub mod error;
pub mod events;
pub mod fees;
pub mod instruction;
pub mod oracle;
pub mod processor;
pub mod state;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

// Re-export commonly used items
pub use error::PredictionMarketError;
pub use instruction::PredictionMarketInstruction;
pub use state::*;

solana_program::declare_id!("FW9KvGkRcnibqm5LSE4J8sq3homgVizKGBoNA511gR2s");
