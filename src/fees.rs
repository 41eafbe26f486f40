//! Fee schedule application
//!
//! Every economic action goes through [`apply_fee`] so creation, liquidity
//! and betting fees share one rounding rule: the configured flat amount,
//! capped at the raw amount.

use crate::state::Global;

/// Action a fee is charged for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeKind {
    Creator,
    Liquidity,
    Betting,
}

/// Result of charging a fee against a raw amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// Routed to the fee authority
    pub fee: u64,
    /// Left for the action itself
    pub net: u64,
}

/// `fee = min(configured, raw)`, `net = raw - fee`
pub fn split_fee(configured: u64, raw: u64) -> FeeSplit {
    let fee = configured.min(raw);
    FeeSplit { fee, net: raw - fee }
}

/// Charge the Global fee schedule for `kind` against `raw`
pub fn apply_fee(global: &Global, kind: FeeKind, raw: u64) -> FeeSplit {
    split_fee(global.fee_amount(kind), raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::pubkey::Pubkey;

    #[test]
    fn test_split_fee() {
        // 0.05 SOL deposit with a 0.001 SOL fee
        assert_eq!(
            split_fee(1_000_000, 50_000_000),
            FeeSplit { fee: 1_000_000, net: 49_000_000 }
        );
        // fee larger than the amount takes everything, never underflows
        assert_eq!(split_fee(1_000_000, 400), FeeSplit { fee: 400, net: 0 });
        assert_eq!(split_fee(0, 123), FeeSplit { fee: 0, net: 123 });
        assert_eq!(split_fee(u64::MAX, u64::MAX), FeeSplit { fee: u64::MAX, net: 0 });
    }

    #[test]
    fn test_apply_fee_uses_kind() {
        let global = Global::new(Pubkey::new_unique(), Pubkey::new_unique(), 10, 20, 30, 255);
        assert_eq!(apply_fee(&global, FeeKind::Creator, 100).fee, 10);
        assert_eq!(apply_fee(&global, FeeKind::Liquidity, 100).net, 80);
        assert_eq!(apply_fee(&global, FeeKind::Betting, 100).net, 70);
    }
}
