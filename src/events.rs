//! Program events
//!
//! Each event is written to the transaction log as
//! `sol_log_data([discriminator (u64 LE), borsh(event)])`. Emission is
//! best-effort: a payload that fails to serialize is logged and dropped,
//! never turned into an instruction error.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

use crate::state::MarketOutcome;

pub const GLOBAL_INITIALIZED_DISCRIMINATOR: u64 = 0x45565F474C42494E; // "EV_GLBIN"
pub const GLOBAL_UPDATED_DISCRIMINATOR: u64 = 0x45565F474C425550; // "EV_GLBUP"
pub const MARKET_CREATED_DISCRIMINATOR: u64 = 0x45565F4D4B54434E; // "EV_MKTCN"
pub const ORACLE_RES_UPDATED_DISCRIMINATOR: u64 = 0x45565F4F52434C55; // "EV_ORCLU"
pub const LIQUIDITY_ADDED_DISCRIMINATOR: u64 = 0x45565F4C49514144; // "EV_LIQAD"
pub const BET_PLACED_DISCRIMINATOR: u64 = 0x45565F4245545043; // "EV_BETPC"
pub const MARKET_RESOLVED_DISCRIMINATOR: u64 = 0x45565F4D4B545253; // "EV_MKTRS"
pub const MARKET_SETTLED_DISCRIMINATOR: u64 = 0x45565F4D4B545354; // "EV_MKTST"

/// A typed log record with a stable discriminator
pub trait Event: BorshSerialize {
    const DISCRIMINATOR: u64;
    const NAME: &'static str;
}

/// Publish an event to the transaction log
pub fn emit<E: Event>(event: &E) {
    match event.try_to_vec() {
        Ok(payload) => {
            sol_log_data(&[&E::DISCRIMINATOR.to_le_bytes(), &payload]);
        }
        Err(err) => {
            msg!("Event {} dropped: {}", E::NAME, err);
        }
    }
}

/// Split a `sol_log_data` record back into an event, for off-chain readers
pub fn decode<E: Event + BorshDeserialize>(discriminator: &[u8], payload: &[u8]) -> Option<E> {
    let tag: [u8; 8] = discriminator.try_into().ok()?;
    if u64::from_le_bytes(tag) != E::DISCRIMINATOR {
        return None;
    }
    E::try_from_slice(payload).ok()
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct GlobalInitialized {
    pub global: Pubkey,
    pub admin: Pubkey,
    pub fee_authority: Pubkey,
    pub creator_fee_amount: u64,
    pub liquidity_user_fee_amount: u64,
    pub betting_user_fee_amount: u64,
}

impl Event for GlobalInitialized {
    const DISCRIMINATOR: u64 = GLOBAL_INITIALIZED_DISCRIMINATOR;
    const NAME: &'static str = "GlobalInitialized";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct GlobalUpdated {
    pub global: Pubkey,
    pub fee_authority: Pubkey,
    pub creator_fee_amount: u64,
    pub liquidity_user_fee_amount: u64,
    pub betting_user_fee_amount: u64,
}

impl Event for GlobalUpdated {
    const DISCRIMINATOR: u64 = GLOBAL_UPDATED_DISCRIMINATOR;
    const NAME: &'static str = "GlobalUpdated";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketCreated {
    pub market: Pubkey,
    pub creator: Pubkey,
    pub token_a: Pubkey,
    pub token_b: Pubkey,
    pub oracle_feed: Pubkey,
    pub threshold: u64,
    pub market_index: u64,
}

impl Event for MarketCreated {
    const DISCRIMINATOR: u64 = MARKET_CREATED_DISCRIMINATOR;
    const NAME: &'static str = "MarketCreated";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OracleResUpdated {
    pub feed: Pubkey,
    pub price: u64,
    pub round_open_timestamp: i64,
}

impl Event for OracleResUpdated {
    const DISCRIMINATOR: u64 = ORACLE_RES_UPDATED_DISCRIMINATOR;
    const NAME: &'static str = "OracleResUpdated";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct LiquidityAdded {
    pub market: Pubkey,
    pub provider: Pubkey,
    pub amount: u64,
    pub fee: u64,
    pub reserve_a: u64,
    pub reserve_b: u64,
}

impl Event for LiquidityAdded {
    const DISCRIMINATOR: u64 = LIQUIDITY_ADDED_DISCRIMINATOR;
    const NAME: &'static str = "LiquidityAdded";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BetPlaced {
    pub market: Pubkey,
    pub user: Pubkey,
    pub outcome: MarketOutcome,
    pub amount: u64,
    pub fee: u64,
}

impl Event for BetPlaced {
    const DISCRIMINATOR: u64 = BET_PLACED_DISCRIMINATOR;
    const NAME: &'static str = "BetPlaced";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketResolved {
    pub market: Pubkey,
    pub price: u64,
    pub outcome: MarketOutcome,
}

impl Event for MarketResolved {
    const DISCRIMINATOR: u64 = MARKET_RESOLVED_DISCRIMINATOR;
    const NAME: &'static str = "MarketResolved";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketSettled {
    pub market: Pubkey,
    pub outcome: MarketOutcome,
}

impl Event for MarketSettled {
    const DISCRIMINATOR: u64 = MARKET_SETTLED_DISCRIMINATOR;
    const NAME: &'static str = "MarketSettled";
}
