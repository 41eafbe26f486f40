//! Error types for the Oracle Prediction Market Program

use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the Oracle Prediction Market Program
#[derive(Clone, Copy, Debug, Eq, Error, FromPrimitive, PartialEq)]
pub enum PredictionMarketError {
    // === General Errors (0-99) ===

    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    #[error("Invalid account data")]
    InvalidAccountData = 1,

    #[error("Account not initialized")]
    AccountNotInitialized = 2,

    #[error("Already initialized")]
    AlreadyInitialized = 3,

    #[error("Invalid signer")]
    InvalidSigner = 5,

    #[error("Unauthorized")]
    Unauthorized = 6,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 7,

    #[error("Insufficient balance")]
    InsufficientBalance = 8,

    #[error("Invalid PDA")]
    InvalidPDA = 10,

    #[error("Amount must be greater than zero")]
    ZeroAmount = 11,

    #[error("Invalid fee authority")]
    InvalidFeeAuthority = 12,

    // === Market Errors (100-199) ===

    #[error("Market already exists")]
    MarketAlreadyExists = 101,

    #[error("Market not open")]
    MarketNotOpen = 104,

    #[error("Market not resolved")]
    MarketNotResolved = 106,

    #[error("Outcome tokens must be distinct")]
    DuplicateOutcomeToken = 110,

    #[error("Invalid token mint")]
    InvalidTokenMint = 119,

    #[error("Invalid market status transition")]
    InvalidStatusTransition = 121,

    // === Oracle Errors (500-599) ===

    #[error("Invalid oracle feed")]
    InvalidOracleFeed = 500,

    #[error("Stale oracle data")]
    StaleOracleData = 501,

    #[error("Invalid feed account")]
    InvalidFeedAccount = 502,
}

impl From<PredictionMarketError> for ProgramError {
    fn from(e: PredictionMarketError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for PredictionMarketError {
    fn type_of() -> &'static str {
        "PredictionMarketError"
    }
}

impl PrintProgramError for PredictionMarketError {
    fn print<E>(&self)
    where
        E: 'static + std::error::Error + DecodeError<E> + PrintProgramError + num_traits::FromPrimitive,
    {
        msg!("Error: {}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            ProgramError::from(PredictionMarketError::AlreadyInitialized),
            ProgramError::Custom(3)
        );
        assert_eq!(
            ProgramError::from(PredictionMarketError::MarketAlreadyExists),
            ProgramError::Custom(101)
        );
        assert_eq!(
            ProgramError::from(PredictionMarketError::StaleOracleData),
            ProgramError::Custom(501)
        );
    }

    #[test]
    fn test_decode_from_code() {
        let decoded = PredictionMarketError::from_u32(104);
        assert_eq!(decoded, Some(PredictionMarketError::MarketNotOpen));
        assert_eq!(PredictionMarketError::from_u32(9999), None);
    }
}
