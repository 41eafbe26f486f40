//! Cross-program calls and foreign-account checks
//!
//! System Program transfers move fees and deposits; SPL Token mints are only
//! inspected, never modified.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
};

use crate::error::PredictionMarketError;

// ============================================================================
// System Program CPI
// ============================================================================

/// Transfer lamports from a signing wallet
pub fn cpi_system_transfer<'a>(
    from: &AccountInfo<'a>,
    to: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    if amount == 0 {
        return Ok(());
    }
    msg!("CPI: Transfer {} lamports to {}", amount, to.key);

    invoke(
        &system_instruction::transfer(from.key, to.key, amount),
        &[from.clone(), to.clone(), system_program.clone()],
    )?;

    Ok(())
}

/// Route a charged fee to the fee authority
pub fn route_fee<'a>(
    payer: &AccountInfo<'a>,
    fee_authority: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    fee: u64,
) -> ProgramResult {
    if fee > 0 {
        msg!("Fee: {} lamports -> {}", fee, fee_authority.key);
    }
    cpi_system_transfer(payer, fee_authority, system_program, fee)
}

/// Fail with `InsufficientBalance` unless `payer` can spend `required` and be
/// left either empty or rent exempt
pub fn ensure_balance(payer: &AccountInfo, required: u64, rent: &Rent) -> ProgramResult {
    let available = payer.lamports();
    let floor = rent.minimum_balance(payer.data_len());
    match available.checked_sub(required) {
        Some(0) => Ok(()),
        Some(left) if left >= floor => Ok(()),
        _ => {
            msg!(
                "Error: {} holds {} lamports, needs {} plus {} rent reserve",
                payer.key,
                available,
                required,
                floor
            );
            Err(PredictionMarketError::InsufficientBalance.into())
        }
    }
}

/// Fail with `InvalidFeeAuthority` if crediting `fee` would leave the fee
/// authority below rent exemption
pub fn ensure_fee_recipient(fee_authority: &AccountInfo, fee: u64, rent: &Rent) -> ProgramResult {
    if fee == 0 {
        return Ok(());
    }
    let after = fee_authority.lamports().saturating_add(fee);
    let floor = rent.minimum_balance(fee_authority.data_len());
    if after < floor {
        msg!(
            "Error: Fee authority {} would hold {} lamports, below rent minimum {}",
            fee_authority.key,
            after,
            floor
        );
        return Err(PredictionMarketError::InvalidFeeAuthority.into());
    }
    Ok(())
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Verify System Program
pub fn verify_system_program(provided: &Pubkey) -> ProgramResult {
    if *provided != solana_program::system_program::ID {
        msg!("Error: Invalid System Program");
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// Verify that an account is the expected, initialized SPL Token mint
pub fn verify_outcome_mint(mint_info: &AccountInfo, expected: &Pubkey) -> ProgramResult {
    if mint_info.key != expected {
        msg!("Error: Mint account {} does not match {}", mint_info.key, expected);
        return Err(PredictionMarketError::InvalidTokenMint.into());
    }
    if *mint_info.owner != spl_token::id() {
        msg!("Error: Mint {} not owned by the Token Program", mint_info.key);
        return Err(PredictionMarketError::InvalidTokenMint.into());
    }

    let data = mint_info.try_borrow_data()?;
    match spl_token::state::Mint::unpack(&data) {
        Ok(_) => Ok(()),
        Err(_) => {
            msg!("Error: {} is not an initialized mint", mint_info.key);
            Err(PredictionMarketError::InvalidTokenMint.into())
        }
    }
}
