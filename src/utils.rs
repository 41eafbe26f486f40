//! Utility functions for the Oracle Prediction Market Program

use borsh::BorshDeserialize;
use solana_program::{
    account_info::AccountInfo,
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::error::PredictionMarketError;
use crate::state::{Global, Market, GLOBAL_DISCRIMINATOR, MARKET_DISCRIMINATOR};

/// Safely deserialize account data using BorshDeserialize::deserialize
/// This does NOT require the slice to be fully consumed, which is important
/// when the account has padding bytes at the end.
pub fn deserialize_account<T: BorshDeserialize>(data: &[u8]) -> Result<T, ProgramError> {
    T::deserialize(&mut &data[..])
        .map_err(|_| ProgramError::InvalidAccountData)
}

/// Check if a signer is authorized
pub fn check_signer(account: &AccountInfo) -> ProgramResult {
    if !account.is_signer {
        return Err(PredictionMarketError::InvalidSigner.into());
    }
    Ok(())
}

/// Check that an account was passed writable
pub fn check_writable(account: &AccountInfo) -> ProgramResult {
    if !account.is_writable {
        msg!("Account {} must be writable", account.key);
        return Err(PredictionMarketError::InvalidAccountData.into());
    }
    Ok(())
}

/// Verify PDA derivation
pub fn verify_pda(
    expected: &Pubkey,
    program_id: &Pubkey,
    seeds: &[&[u8]],
) -> Result<u8, ProgramError> {
    let (pda, bump) = Pubkey::find_program_address(seeds, program_id);
    if pda != *expected {
        msg!("PDA mismatch: expected {}, got {}", expected, pda);
        return Err(PredictionMarketError::InvalidPDA.into());
    }
    Ok(bump)
}

/// An account already holds state if it has data or belongs to a program
pub fn is_allocated(account: &AccountInfo) -> bool {
    !account.data_is_empty() || *account.owner != solana_program::system_program::ID
}

/// Get current timestamp from Clock sysvar
pub fn get_current_timestamp() -> Result<i64, ProgramError> {
    let clock = Clock::get()?;
    Ok(clock.unix_timestamp)
}

/// Create a PDA account.
///
/// An address that already holds lamports cannot go through `create_account`,
/// so it is topped up to rent exemption and then allocated and assigned.
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    pda: &AccountInfo<'a>,
    space: usize,
    owner: &Pubkey,
    system_program: &AccountInfo<'a>,
    seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let lamports = rent.minimum_balance(space);
    let current = pda.lamports();

    if current == 0 {
        invoke_signed(
            &system_instruction::create_account(
                payer.key,
                pda.key,
                lamports,
                space as u64,
                owner,
            ),
            &[payer.clone(), pda.clone(), system_program.clone()],
            &[seeds],
        )?;
        return Ok(());
    }

    let top_up = lamports.saturating_sub(current);
    if top_up > 0 {
        invoke(
            &system_instruction::transfer(payer.key, pda.key, top_up),
            &[payer.clone(), pda.clone(), system_program.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(pda.key, space as u64),
        &[pda.clone(), system_program.clone()],
        &[seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(pda.key, owner),
        &[pda.clone(), system_program.clone()],
        &[seeds],
    )?;

    Ok(())
}

/// Load the Global singleton, checking address, owner and discriminator
pub fn load_global(program_id: &Pubkey, global_info: &AccountInfo) -> Result<Global, ProgramError> {
    let (global_pda, _) = Global::find_address(program_id);
    if *global_info.key != global_pda {
        msg!("Error: Invalid Global PDA");
        return Err(PredictionMarketError::InvalidPDA.into());
    }
    if global_info.data_is_empty() || global_info.owner != program_id {
        msg!("Error: Global not initialized");
        return Err(PredictionMarketError::AccountNotInitialized.into());
    }

    let global = deserialize_account::<Global>(&global_info.data.borrow())?;
    if global.discriminator != GLOBAL_DISCRIMINATOR {
        msg!("Error: Invalid Global discriminator");
        return Err(PredictionMarketError::InvalidAccountData.into());
    }
    Ok(global)
}

/// Load a creator's Market, checking address, owner and discriminator
pub fn load_market(
    program_id: &Pubkey,
    market_info: &AccountInfo,
    creator: &Pubkey,
) -> Result<Market, ProgramError> {
    let (market_pda, _) = Market::find_address(creator, program_id);
    if *market_info.key != market_pda {
        msg!("Error: Invalid Market PDA");
        return Err(PredictionMarketError::InvalidPDA.into());
    }
    if market_info.data_is_empty() || market_info.owner != program_id {
        msg!("Error: Market not initialized");
        return Err(PredictionMarketError::AccountNotInitialized.into());
    }

    let market = deserialize_account::<Market>(&market_info.data.borrow())?;
    if market.discriminator != MARKET_DISCRIMINATOR || market.creator != *creator {
        msg!("Error: Invalid Market data");
        return Err(PredictionMarketError::InvalidAccountData.into());
    }
    Ok(market)
}

/// Safe addition for u64
pub fn safe_add_u64(a: u64, b: u64) -> Result<u64, ProgramError> {
    a.checked_add(b)
        .ok_or_else(|| PredictionMarketError::ArithmeticOverflow.into())
}

/// Safe multiplication for u64
pub fn safe_mul_u64(a: u64, b: u64) -> Result<u64, ProgramError> {
    a.checked_mul(b)
        .ok_or_else(|| PredictionMarketError::ArithmeticOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use borsh::BorshSerialize;
    use solana_program::clock::Epoch;

    #[test]
    fn test_safe_arithmetic() {
        // Safe add
        assert_eq!(safe_add_u64(100, 50).unwrap(), 150);
        assert!(safe_add_u64(u64::MAX, 1).is_err());

        // Safe mul
        assert_eq!(safe_mul_u64(100, 5).unwrap(), 500);
        assert!(safe_mul_u64(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_deserialize_account_ignores_padding() {
        let global = Global::new(Pubkey::new_unique(), Pubkey::new_unique(), 1, 2, 3, 254);
        let mut data = global.try_to_vec().unwrap();
        data.extend_from_slice(&[0u8; 16]);
        let loaded = deserialize_account::<Global>(&data).unwrap();
        assert_eq!(loaded, global);

        assert!(deserialize_account::<Global>(&data[..10]).is_err());
    }

    #[test]
    fn test_load_global_checks_address_and_owner() {
        let program_id = Pubkey::new_unique();
        let (global_pda, bump) = Global::find_address(&program_id);
        let global = Global::new(Pubkey::new_unique(), Pubkey::new_unique(), 1, 2, 3, bump);
        let mut data = global.try_to_vec().unwrap();
        let mut lamports = 1_000_000u64;

        let info = AccountInfo::new(
            &global_pda,
            false,
            true,
            &mut lamports,
            &mut data,
            &program_id,
            false,
            Epoch::default(),
        );
        assert_eq!(load_global(&program_id, &info).unwrap(), global);

        let other_program = Pubkey::new_unique();
        assert_eq!(
            load_global(&other_program, &info).unwrap_err(),
            PredictionMarketError::InvalidPDA.into()
        );
    }

    #[test]
    fn test_is_allocated() {
        let key = Pubkey::new_unique();
        let system = solana_program::system_program::ID;
        let mut lamports = 0u64;
        let mut empty: Vec<u8> = vec![];
        let info = AccountInfo::new(
            &key,
            false,
            true,
            &mut lamports,
            &mut empty,
            &system,
            false,
            Epoch::default(),
        );
        assert!(!is_allocated(&info));

        let program_id = Pubkey::new_unique();
        let mut lamports = 0u64;
        let mut data = vec![0u8; 8];
        let info = AccountInfo::new(
            &key,
            false,
            true,
            &mut lamports,
            &mut data,
            &program_id,
            false,
            Epoch::default(),
        );
        assert!(is_allocated(&info));
    }
}
