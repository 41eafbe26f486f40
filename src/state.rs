//! State definitions for the Oracle Prediction Market Program
//!
//! All account structures used by the program, plus the seed derivations
//! that locate them.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::PredictionMarketError;
use crate::fees::FeeKind;
use crate::utils::{safe_add_u64, safe_mul_u64};

// ============================================================================
// Discriminators
// ============================================================================

pub const GLOBAL_DISCRIMINATOR: u64 = 0x474C4F42414C5F5F; // "GLOBAL__"
pub const MARKET_DISCRIMINATOR: u64 = 0x4D41524B45545F5F; // "MARKET__"

// ============================================================================
// PDA Seeds
// ============================================================================

pub const GLOBAL_SEED: &[u8] = b"global";
pub const MARKET_SEED: &[u8] = b"market";

// ============================================================================
// Constants
// ============================================================================

/// Normalized oracle price precision (1.00 = 1_000_000)
pub const PRICE_PRECISION: u64 = 1_000_000;

/// Oldest acceptable oracle round, in seconds
pub const ORACLE_MAX_STALENESS_SECS: i64 = 300;

/// Switchboard V2 program (owner of aggregator feed accounts)
pub const SWITCHBOARD_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("SW1TCH7qEPTdLsDHRgPuMQjbQxKdH2aBStViMFnt64f");

// ============================================================================
// Enums
// ============================================================================

/// Market lifecycle status. Only moves forward.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    /// Accepting liquidity and bets
    Open = 0,
    /// Oracle price observed, outcome fixed
    Resolved = 1,
    /// Closed out by the fee authority
    Settled = 2,
}

impl MarketStatus {
    /// Open -> Resolved -> Settled, nothing else
    pub fn can_transition_to(self, next: MarketStatus) -> bool {
        matches!(
            (self, next),
            (MarketStatus::Open, MarketStatus::Resolved)
                | (MarketStatus::Resolved, MarketStatus::Settled)
        )
    }
}

/// Which outcome token won
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketOutcome {
    /// Oracle price at or above the threshold
    TokenA = 0,
    /// Oracle price below the threshold
    TokenB = 1,
}

// ============================================================================
// Account Structures
// ============================================================================

/// Program-wide fee policy and market counter
///
/// PDA Seeds: ["global"]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Global {
    /// Account discriminator
    pub discriminator: u64,

    /// Payer of `Initialize`
    pub admin: Pubkey,

    /// Receives every fee and may update the fee policy
    pub fee_authority: Pubkey,

    /// Flat fee charged when a market is created
    pub creator_fee_amount: u64,

    /// Flat fee charged per liquidity deposit
    pub liquidity_user_fee_amount: u64,

    /// Flat fee charged per bet
    pub betting_user_fee_amount: u64,

    /// Markets created so far
    pub market_count: u64,

    /// Running total of fees routed to the fee authority
    pub total_fees_collected: u64,

    /// PDA bump
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl Global {
    pub const SIZE: usize = 8   // discriminator
        + 32  // admin
        + 32  // fee_authority
        + 8   // creator_fee_amount
        + 8   // liquidity_user_fee_amount
        + 8   // betting_user_fee_amount
        + 8   // market_count
        + 8   // total_fees_collected
        + 1   // bump
        + 32; // reserved (= 145 total)

    /// Derive the Global address; reproducible by any caller
    pub fn find_address(program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[GLOBAL_SEED], program_id)
    }

    pub fn new(
        admin: Pubkey,
        fee_authority: Pubkey,
        creator_fee_amount: u64,
        liquidity_user_fee_amount: u64,
        betting_user_fee_amount: u64,
        bump: u8,
    ) -> Self {
        Self {
            discriminator: GLOBAL_DISCRIMINATOR,
            admin,
            fee_authority,
            creator_fee_amount,
            liquidity_user_fee_amount,
            betting_user_fee_amount,
            market_count: 0,
            total_fees_collected: 0,
            bump,
            reserved: [0u8; 32],
        }
    }

    /// Configured flat fee for an action kind
    pub fn fee_amount(&self, kind: FeeKind) -> u64 {
        match kind {
            FeeKind::Creator => self.creator_fee_amount,
            FeeKind::Liquidity => self.liquidity_user_fee_amount,
            FeeKind::Betting => self.betting_user_fee_amount,
        }
    }

    /// Reserve the next market index and bump the counter
    pub fn next_market_index(&mut self) -> Result<u64, PredictionMarketError> {
        let index = self.market_count;
        self.market_count = self
            .market_count
            .checked_add(1)
            .ok_or(PredictionMarketError::ArithmeticOverflow)?;
        Ok(index)
    }

    pub fn record_fee(&mut self, fee: u64) -> Result<(), PredictionMarketError> {
        self.total_fees_collected = self
            .total_fees_collected
            .checked_add(fee)
            .ok_or(PredictionMarketError::ArithmeticOverflow)?;
        Ok(())
    }
}

/// A price-threshold market, one per creator
///
/// PDA Seeds: ["market", creator]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Account discriminator
    pub discriminator: u64,

    /// Market creator (immutable)
    pub creator: Pubkey,

    /// Outcome token A mint (wins at or above threshold)
    pub token_a: Pubkey,

    /// Outcome token B mint (wins below threshold)
    pub token_b: Pubkey,

    /// Switchboard aggregator consulted at resolution
    pub oracle_feed: Pubkey,

    /// Strike in whole quote units (190 = 190.00)
    pub threshold: u64,

    /// Pooled liquidity, side A
    pub reserve_a: u64,

    /// Pooled liquidity, side B
    pub reserve_b: u64,

    /// Net stakes on A
    pub bet_a: u64,

    /// Net stakes on B
    pub bet_b: u64,

    /// Lifecycle status
    pub status: MarketStatus,

    /// Set once the market leaves Open
    pub resolved_outcome: Option<MarketOutcome>,

    /// Normalized oracle price used at resolution (e6)
    pub resolved_price: u64,

    /// Position of this market in the global counter
    pub market_index: u64,

    pub created_at: i64,

    pub updated_at: i64,

    /// PDA bump
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl Market {
    pub const SIZE: usize = 8   // discriminator
        + 32  // creator
        + 32  // token_a
        + 32  // token_b
        + 32  // oracle_feed
        + 8   // threshold
        + 8   // reserve_a
        + 8   // reserve_b
        + 8   // bet_a
        + 8   // bet_b
        + 1   // status
        + 1 + 1 // resolved_outcome (Option<MarketOutcome>)
        + 8   // resolved_price
        + 8   // market_index
        + 8   // created_at
        + 8   // updated_at
        + 1   // bump
        + 32; // reserved (= 244 total)

    /// Derive a creator's market address; reproducible by any caller
    pub fn find_address(creator: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[MARKET_SEED, creator.as_ref()], program_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        creator: Pubkey,
        token_a: Pubkey,
        token_b: Pubkey,
        oracle_feed: Pubkey,
        threshold: u64,
        market_index: u64,
        bump: u8,
        created_at: i64,
    ) -> Self {
        Self {
            discriminator: MARKET_DISCRIMINATOR,
            creator,
            token_a,
            token_b,
            oracle_feed,
            threshold,
            reserve_a: 0,
            reserve_b: 0,
            bet_a: 0,
            bet_b: 0,
            status: MarketStatus::Open,
            resolved_outcome: None,
            resolved_price: 0,
            market_index,
            created_at,
            updated_at: created_at,
            bump,
            reserved: [0u8; 32],
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == MarketStatus::Open
    }

    pub fn total_reserves(&self) -> Result<u64, PredictionMarketError> {
        self.reserve_a
            .checked_add(self.reserve_b)
            .ok_or(PredictionMarketError::ArithmeticOverflow)
    }

    /// Split a net deposit across both reserves.
    ///
    /// An empty pool takes `net / 2` on side A and the remainder on side B.
    /// Otherwise side A takes `floor(net * reserve_a / total)` and side B the
    /// remainder, so the current ratio is kept and the sum is exact.
    pub fn liquidity_split(&self, net: u64) -> Result<(u64, u64), PredictionMarketError> {
        let total = self.total_reserves()?;
        let add_a = if total == 0 {
            net / 2
        } else {
            ((net as u128) * (self.reserve_a as u128) / (total as u128)) as u64
        };
        Ok((add_a, net - add_a))
    }

    /// Record a net deposit; returns the per-side amounts added
    pub fn add_liquidity(
        &mut self,
        net: u64,
        current_time: i64,
    ) -> Result<(u64, u64), PredictionMarketError> {
        if !self.is_open() {
            return Err(PredictionMarketError::MarketNotOpen);
        }
        let (add_a, add_b) = self.liquidity_split(net)?;
        self.reserve_a = self
            .reserve_a
            .checked_add(add_a)
            .ok_or(PredictionMarketError::ArithmeticOverflow)?;
        self.reserve_b = self
            .reserve_b
            .checked_add(add_b)
            .ok_or(PredictionMarketError::ArithmeticOverflow)?;
        self.updated_at = current_time;
        Ok((add_a, add_b))
    }

    pub fn record_bet(
        &mut self,
        outcome: MarketOutcome,
        net: u64,
        current_time: i64,
    ) -> Result<(), PredictionMarketError> {
        if !self.is_open() {
            return Err(PredictionMarketError::MarketNotOpen);
        }
        let side = match outcome {
            MarketOutcome::TokenA => &mut self.bet_a,
            MarketOutcome::TokenB => &mut self.bet_b,
        };
        *side = side
            .checked_add(net)
            .ok_or(PredictionMarketError::ArithmeticOverflow)?;
        self.updated_at = current_time;
        Ok(())
    }

    /// Outcome implied by a normalized (e6) oracle price
    pub fn outcome_for_price(&self, price: u64) -> Result<MarketOutcome, PredictionMarketError> {
        let strike = safe_mul_u64(self.threshold, PRICE_PRECISION)
            .map_err(|_| PredictionMarketError::ArithmeticOverflow)?;
        if price >= strike {
            Ok(MarketOutcome::TokenA)
        } else {
            Ok(MarketOutcome::TokenB)
        }
    }

    pub fn resolve(
        &mut self,
        price: u64,
        current_time: i64,
    ) -> Result<MarketOutcome, PredictionMarketError> {
        if !self.is_open() {
            return Err(PredictionMarketError::MarketNotOpen);
        }
        let outcome = self.outcome_for_price(price)?;
        self.transition(MarketStatus::Resolved)?;
        self.resolved_outcome = Some(outcome);
        self.resolved_price = price;
        self.updated_at = current_time;
        Ok(outcome)
    }

    pub fn settle(&mut self, current_time: i64) -> Result<(), PredictionMarketError> {
        if self.status != MarketStatus::Resolved {
            return Err(PredictionMarketError::MarketNotResolved);
        }
        self.transition(MarketStatus::Settled)?;
        self.updated_at = current_time;
        Ok(())
    }

    fn transition(&mut self, next: MarketStatus) -> Result<(), PredictionMarketError> {
        if !self.status.can_transition_to(next) {
            return Err(PredictionMarketError::InvalidStatusTransition);
        }
        self.status = next;
        Ok(())
    }

    /// Lamports held for liquidity and stakes
    pub fn pooled_total(&self) -> Result<u64, PredictionMarketError> {
        let reserves = self.total_reserves()?;
        let stakes = safe_add_u64(self.bet_a, self.bet_b)
            .map_err(|_| PredictionMarketError::ArithmeticOverflow)?;
        reserves
            .checked_add(stakes)
            .ok_or(PredictionMarketError::ArithmeticOverflow)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use borsh::BorshSerialize;

    fn open_market(threshold: u64) -> Market {
        Market::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            threshold,
            0,
            255,
            1_000,
        )
    }

    #[test]
    fn test_global_size() {
        let global = Global::new(Pubkey::new_unique(), Pubkey::new_unique(), 1, 2, 3, 255);
        assert_eq!(global.try_to_vec().unwrap().len(), Global::SIZE);
    }

    #[test]
    fn test_market_size_fits_resolved_layout() {
        let mut market = open_market(190);
        // None is one byte shorter than Some(_)
        assert_eq!(market.try_to_vec().unwrap().len(), Market::SIZE - 1);
        market.resolve(200 * PRICE_PRECISION, 2_000).unwrap();
        assert_eq!(market.try_to_vec().unwrap().len(), Market::SIZE);
    }

    #[test]
    fn test_find_address_matches_seeds() {
        let program_id = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let (expected, _) =
            Pubkey::find_program_address(&[MARKET_SEED, creator.as_ref()], &program_id);
        assert_eq!(Market::find_address(&creator, &program_id).0, expected);

        let other = Pubkey::new_unique();
        assert_ne!(
            Market::find_address(&creator, &program_id).0,
            Market::find_address(&other, &program_id).0
        );
    }

    #[test]
    fn test_global_counters() {
        let mut global = Global::new(Pubkey::new_unique(), Pubkey::new_unique(), 5, 6, 7, 255);
        assert_eq!(global.next_market_index().unwrap(), 0);
        assert_eq!(global.next_market_index().unwrap(), 1);
        assert_eq!(global.market_count, 2);

        global.record_fee(1_000_000).unwrap();
        global.record_fee(0).unwrap();
        assert_eq!(global.total_fees_collected, 1_000_000);

        global.market_count = u64::MAX;
        assert_eq!(
            global.next_market_index(),
            Err(PredictionMarketError::ArithmeticOverflow)
        );
        assert_eq!(global.market_count, u64::MAX);
    }

    #[test]
    fn test_fee_amount_by_kind() {
        let global = Global::new(Pubkey::new_unique(), Pubkey::new_unique(), 5, 6, 7, 255);
        assert_eq!(global.fee_amount(FeeKind::Creator), 5);
        assert_eq!(global.fee_amount(FeeKind::Liquidity), 6);
        assert_eq!(global.fee_amount(FeeKind::Betting), 7);
    }

    #[test]
    fn test_first_deposit_splits_evenly() {
        let mut market = open_market(190);
        let (a, b) = market.add_liquidity(49_000_000, 1_001).unwrap();
        assert_eq!((a, b), (24_500_000, 24_500_000));

        let mut odd = open_market(190);
        let (a, b) = odd.add_liquidity(7, 1_001).unwrap();
        assert_eq!((a, b), (3, 4));
        assert_eq!(odd.total_reserves().unwrap(), 7);
    }

    #[test]
    fn test_later_deposit_keeps_ratio() {
        let mut market = open_market(190);
        market.reserve_a = 300;
        market.reserve_b = 100;
        let (a, b) = market.add_liquidity(1_000, 1_001).unwrap();
        assert_eq!((a, b), (750, 250));
        assert_eq!(market.reserve_a, 1_050);
        assert_eq!(market.reserve_b, 350);

        // remainder lands on side B
        let (a, b) = market.add_liquidity(3, 1_002).unwrap();
        assert_eq!(a + b, 3);
        assert_eq!(market.total_reserves().unwrap(), 1_403);
    }

    #[test]
    fn test_deposit_rejected_when_not_open() {
        let mut market = open_market(190);
        market.resolve(100 * PRICE_PRECISION, 1_500).unwrap();
        assert_eq!(
            market.add_liquidity(10, 1_600),
            Err(PredictionMarketError::MarketNotOpen)
        );
        assert_eq!(market.total_reserves().unwrap(), 0);
    }

    #[test]
    fn test_outcome_by_threshold() {
        let market = open_market(190);
        assert_eq!(
            market.outcome_for_price(190 * PRICE_PRECISION).unwrap(),
            MarketOutcome::TokenA
        );
        assert_eq!(
            market.outcome_for_price(189_999_999).unwrap(),
            MarketOutcome::TokenB
        );
    }

    #[test]
    fn test_status_only_moves_forward() {
        let mut market = open_market(190);
        assert_eq!(market.settle(1_100), Err(PredictionMarketError::MarketNotResolved));

        let outcome = market.resolve(150 * PRICE_PRECISION, 1_200).unwrap();
        assert_eq!(outcome, MarketOutcome::TokenB);
        assert_eq!(market.status, MarketStatus::Resolved);
        assert_eq!(market.resolved_outcome, Some(MarketOutcome::TokenB));
        assert_eq!(market.resolved_price, 150 * PRICE_PRECISION);

        assert_eq!(
            market.resolve(250 * PRICE_PRECISION, 1_300),
            Err(PredictionMarketError::MarketNotOpen)
        );
        market.settle(1_400).unwrap();
        assert_eq!(market.status, MarketStatus::Settled);
        assert_eq!(market.settle(1_500), Err(PredictionMarketError::MarketNotResolved));

        assert!(!MarketStatus::Settled.can_transition_to(MarketStatus::Open));
        assert!(!MarketStatus::Resolved.can_transition_to(MarketStatus::Open));
        assert!(!MarketStatus::Open.can_transition_to(MarketStatus::Settled));
    }

    #[test]
    fn test_record_bet() {
        let mut market = open_market(190);
        market.record_bet(MarketOutcome::TokenA, 40, 1_001).unwrap();
        market.record_bet(MarketOutcome::TokenB, 15, 1_002).unwrap();
        market.record_bet(MarketOutcome::TokenA, 5, 1_003).unwrap();
        assert_eq!((market.bet_a, market.bet_b), (45, 15));
        assert_eq!(market.pooled_total().unwrap(), 60);
    }
}
