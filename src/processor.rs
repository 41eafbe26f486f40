//! Instruction processor for the Oracle Prediction Market Program

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    pubkey::Pubkey,
    rent::Rent,
    sysvar::Sysvar,
};

use crate::cpi::{
    cpi_system_transfer, ensure_balance, ensure_fee_recipient, route_fee, verify_outcome_mint,
    verify_system_program,
};
use crate::error::PredictionMarketError;
use crate::events::{
    emit, BetPlaced, GlobalInitialized, GlobalUpdated, LiquidityAdded, MarketCreated,
    MarketResolved, MarketSettled, OracleResUpdated,
};
use crate::fees::{apply_fee, FeeKind};
use crate::instruction::{
    AddLiquidityArgs, InitMarketArgs, InitializeArgs, PlaceBetArgs, PredictionMarketInstruction,
    UpdateGlobalArgs,
};
use crate::oracle::{self, OracleReading};
use crate::state::{Global, Market, GLOBAL_SEED, MARKET_SEED};
use crate::utils::{
    check_signer, check_writable, create_pda_account, get_current_timestamp, is_allocated,
    load_global, load_market, safe_add_u64, verify_pda,
};

/// Process an instruction
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = PredictionMarketInstruction::try_from_slice(instruction_data)
        .map_err(|_| PredictionMarketError::InvalidInstruction)?;

    match instruction {
        // === Global Configuration ===
        PredictionMarketInstruction::Initialize(args) => {
            msg!("Instruction: Initialize");
            process_initialize(program_id, accounts, args)
        }
        PredictionMarketInstruction::UpdateGlobal(args) => {
            msg!("Instruction: UpdateGlobal");
            process_update_global(program_id, accounts, args)
        }

        // === Oracle ===
        PredictionMarketInstruction::GetRes => {
            msg!("Instruction: GetRes");
            process_get_res(accounts)
        }

        // === Market Lifecycle ===
        PredictionMarketInstruction::InitMarket(args) => {
            msg!("Instruction: InitMarket");
            process_init_market(program_id, accounts, args)
        }
        PredictionMarketInstruction::AddLiquidity(args) => {
            msg!("Instruction: AddLiquidity");
            process_add_liquidity(program_id, accounts, args)
        }
        PredictionMarketInstruction::PlaceBet(args) => {
            msg!("Instruction: PlaceBet");
            process_place_bet(program_id, accounts, args)
        }
        PredictionMarketInstruction::ResolveMarket => {
            msg!("Instruction: ResolveMarket");
            process_resolve_market(program_id, accounts)
        }
        PredictionMarketInstruction::SettleMarket => {
            msg!("Instruction: SettleMarket");
            process_settle_market(program_id, accounts)
        }
    }
}

fn save<T: BorshSerialize>(value: &T, account_info: &AccountInfo) -> ProgramResult {
    value.serialize(&mut *account_info.data.borrow_mut())?;
    Ok(())
}

/// Read a feed that a market is being bound to or resolved against.
/// A feed of the wrong type is reported as an invalid oracle feed.
fn read_market_feed(feed_info: &AccountInfo, now: i64) -> Result<OracleReading, PredictionMarketError> {
    oracle::read_feed(feed_info, now).map_err(|e| match e {
        PredictionMarketError::InvalidFeedAccount => PredictionMarketError::InvalidOracleFeed,
        other => other,
    })
}

fn check_fee_authority(global: &Global, fee_authority_info: &AccountInfo) -> ProgramResult {
    if *fee_authority_info.key != global.fee_authority {
        msg!(
            "Error: Fee authority mismatch: expected {}, got {}",
            global.fee_authority,
            fee_authority_info.key
        );
        return Err(PredictionMarketError::InvalidFeeAuthority.into());
    }
    Ok(())
}

// ============================================================================
// Processor Implementations
// ============================================================================

fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: InitializeArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Payer (signer, writable)
    let payer_info = next_account_info(account_info_iter)?;
    check_signer(payer_info)?;

    // Account 1: Global PDA (writable)
    let global_info = next_account_info(account_info_iter)?;
    check_writable(global_info)?;

    // Account 2: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    verify_system_program(system_program_info.key)?;

    let global_bump = verify_pda(global_info.key, program_id, &[GLOBAL_SEED])?;

    if is_allocated(global_info) {
        msg!("Error: Global already initialized");
        return Err(PredictionMarketError::AlreadyInitialized.into());
    }

    create_pda_account(
        payer_info,
        global_info,
        Global::SIZE,
        program_id,
        system_program_info,
        &[GLOBAL_SEED, &[global_bump]],
    )?;

    let global = Global::new(
        *payer_info.key,
        args.fee_authority,
        args.creator_fee_amount,
        args.liquidity_user_fee_amount,
        args.betting_user_fee_amount,
        global_bump,
    );
    save(&global, global_info)?;

    msg!("Global initialized successfully");
    msg!("Admin: {}", payer_info.key);
    msg!("Fee Authority: {}", global.fee_authority);
    msg!(
        "Fees (creator/liquidity/betting): {}/{}/{}",
        global.creator_fee_amount,
        global.liquidity_user_fee_amount,
        global.betting_user_fee_amount
    );

    emit(&GlobalInitialized {
        global: *global_info.key,
        admin: global.admin,
        fee_authority: global.fee_authority,
        creator_fee_amount: global.creator_fee_amount,
        liquidity_user_fee_amount: global.liquidity_user_fee_amount,
        betting_user_fee_amount: global.betting_user_fee_amount,
    });

    Ok(())
}

fn process_update_global(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: UpdateGlobalArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Fee Authority (signer)
    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    // Account 1: Global PDA (writable)
    let global_info = next_account_info(account_info_iter)?;
    check_writable(global_info)?;

    let mut global = load_global(program_id, global_info)?;
    if *authority_info.key != global.fee_authority {
        msg!("Error: Only the fee authority can update the fee policy");
        return Err(PredictionMarketError::Unauthorized.into());
    }

    if let Some(fee_authority) = args.new_fee_authority {
        global.fee_authority = fee_authority;
    }
    if let Some(amount) = args.creator_fee_amount {
        global.creator_fee_amount = amount;
    }
    if let Some(amount) = args.liquidity_user_fee_amount {
        global.liquidity_user_fee_amount = amount;
    }
    if let Some(amount) = args.betting_user_fee_amount {
        global.betting_user_fee_amount = amount;
    }
    save(&global, global_info)?;

    msg!("Global updated");
    msg!("Fee Authority: {}", global.fee_authority);

    emit(&GlobalUpdated {
        global: *global_info.key,
        fee_authority: global.fee_authority,
        creator_fee_amount: global.creator_fee_amount,
        liquidity_user_fee_amount: global.liquidity_user_fee_amount,
        betting_user_fee_amount: global.betting_user_fee_amount,
    });

    Ok(())
}

fn process_get_res(accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Caller (signer)
    let caller_info = next_account_info(account_info_iter)?;
    check_signer(caller_info)?;

    // Account 1: Switchboard aggregator
    let feed_info = next_account_info(account_info_iter)?;

    let now = get_current_timestamp()?;
    let reading = oracle::read_feed(feed_info, now)?;

    msg!(
        "Oracle price: {} ({} e6), round opened {}",
        oracle::whole_units(reading.price),
        reading.price,
        reading.round_open_timestamp
    );

    emit(&OracleResUpdated {
        feed: *feed_info.key,
        price: reading.price,
        round_open_timestamp: reading.round_open_timestamp,
    });

    Ok(())
}

fn process_init_market(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: InitMarketArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Creator (signer, writable)
    let creator_info = next_account_info(account_info_iter)?;
    check_signer(creator_info)?;

    // Account 1: Global PDA (writable)
    let global_info = next_account_info(account_info_iter)?;
    check_writable(global_info)?;

    // Account 2: Market PDA (writable)
    let market_info = next_account_info(account_info_iter)?;
    check_writable(market_info)?;

    // Account 3: Switchboard aggregator
    let feed_info = next_account_info(account_info_iter)?;

    // Account 4: Fee Authority (writable)
    let fee_authority_info = next_account_info(account_info_iter)?;

    // Account 5: Token A Mint
    let token_a_info = next_account_info(account_info_iter)?;

    // Account 6: Token B Mint
    let token_b_info = next_account_info(account_info_iter)?;

    // Account 7: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    verify_system_program(system_program_info.key)?;

    let mut global = load_global(program_id, global_info)?;
    check_fee_authority(&global, fee_authority_info)?;

    let market_bump = verify_pda(
        market_info.key,
        program_id,
        &[MARKET_SEED, creator_info.key.as_ref()],
    )?;
    if is_allocated(market_info) {
        msg!("Error: Market already exists for creator {}", creator_info.key);
        return Err(PredictionMarketError::MarketAlreadyExists.into());
    }

    if args.token_a == args.token_b {
        msg!("Error: Token A and Token B must differ");
        return Err(PredictionMarketError::DuplicateOutcomeToken.into());
    }
    verify_outcome_mint(token_a_info, &args.token_a)?;
    verify_outcome_mint(token_b_info, &args.token_b)?;

    let current_time = get_current_timestamp()?;
    let reading = read_market_feed(feed_info, current_time)?;

    let creator_fee = apply_fee(&global, FeeKind::Creator, global.creator_fee_amount);
    let rent = Rent::get()?;
    let rent_lamports = rent.minimum_balance(Market::SIZE);
    ensure_balance(creator_info, safe_add_u64(creator_fee.fee, rent_lamports)?, &rent)?;
    ensure_fee_recipient(fee_authority_info, creator_fee.fee, &rent)?;

    create_pda_account(
        creator_info,
        market_info,
        Market::SIZE,
        program_id,
        system_program_info,
        &[MARKET_SEED, creator_info.key.as_ref(), &[market_bump]],
    )?;
    route_fee(creator_info, fee_authority_info, system_program_info, creator_fee.fee)?;

    let market_index = global.next_market_index()?;
    global.record_fee(creator_fee.fee)?;

    let market = Market::new(
        *creator_info.key,
        args.token_a,
        args.token_b,
        *feed_info.key,
        args.threshold,
        market_index,
        market_bump,
        current_time,
    );
    save(&market, market_info)?;
    save(&global, global_info)?;

    msg!("Market created successfully");
    msg!("Market: {}", market_info.key);
    msg!("Creator: {}", creator_info.key);
    msg!("Token A: {} / Token B: {}", market.token_a, market.token_b);
    msg!("Oracle Feed: {} (price {} e6)", market.oracle_feed, reading.price);
    msg!("Threshold: {}", market.threshold);
    msg!("Market Index: {}", market_index);

    emit(&MarketCreated {
        market: *market_info.key,
        creator: market.creator,
        token_a: market.token_a,
        token_b: market.token_b,
        oracle_feed: market.oracle_feed,
        threshold: market.threshold,
        market_index,
    });

    Ok(())
}

fn process_add_liquidity(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: AddLiquidityArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Provider (signer, writable)
    let provider_info = next_account_info(account_info_iter)?;
    check_signer(provider_info)?;

    // Account 1: Global PDA (writable)
    let global_info = next_account_info(account_info_iter)?;
    check_writable(global_info)?;

    // Account 2: Market PDA (writable)
    let market_info = next_account_info(account_info_iter)?;
    check_writable(market_info)?;

    // Account 3: Market Creator
    let creator_info = next_account_info(account_info_iter)?;

    // Account 4: Fee Authority (writable)
    let fee_authority_info = next_account_info(account_info_iter)?;

    // Account 5: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    verify_system_program(system_program_info.key)?;

    let mut global = load_global(program_id, global_info)?;
    check_fee_authority(&global, fee_authority_info)?;

    let mut market = load_market(program_id, market_info, creator_info.key)?;
    if !market.is_open() {
        msg!("Error: Market is not open (status {:?})", market.status);
        return Err(PredictionMarketError::MarketNotOpen.into());
    }
    if args.amount == 0 {
        msg!("Error: Liquidity amount must be greater than zero");
        return Err(PredictionMarketError::ZeroAmount.into());
    }
    let rent = Rent::get()?;
    ensure_balance(provider_info, args.amount, &rent)?;

    let split = apply_fee(&global, FeeKind::Liquidity, args.amount);
    ensure_fee_recipient(fee_authority_info, split.fee, &rent)?;
    let current_time = get_current_timestamp()?;
    let (added_a, added_b) = market.add_liquidity(split.net, current_time)?;
    global.record_fee(split.fee)?;

    route_fee(provider_info, fee_authority_info, system_program_info, split.fee)?;
    cpi_system_transfer(provider_info, market_info, system_program_info, split.net)?;

    save(&market, market_info)?;
    save(&global, global_info)?;

    msg!("Liquidity added: {} (fee {})", split.net, split.fee);
    msg!("Split: +{} A / +{} B", added_a, added_b);
    msg!("Reserves: {} A / {} B", market.reserve_a, market.reserve_b);
    msg!("Pooled: {}", market.pooled_total()?);

    emit(&LiquidityAdded {
        market: *market_info.key,
        provider: *provider_info.key,
        amount: args.amount,
        fee: split.fee,
        reserve_a: market.reserve_a,
        reserve_b: market.reserve_b,
    });

    Ok(())
}

fn process_place_bet(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: PlaceBetArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: User (signer, writable)
    let user_info = next_account_info(account_info_iter)?;
    check_signer(user_info)?;

    // Account 1: Global PDA (writable)
    let global_info = next_account_info(account_info_iter)?;
    check_writable(global_info)?;

    // Account 2: Market PDA (writable)
    let market_info = next_account_info(account_info_iter)?;
    check_writable(market_info)?;

    // Account 3: Market Creator
    let creator_info = next_account_info(account_info_iter)?;

    // Account 4: Fee Authority (writable)
    let fee_authority_info = next_account_info(account_info_iter)?;

    // Account 5: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    verify_system_program(system_program_info.key)?;

    let mut global = load_global(program_id, global_info)?;
    check_fee_authority(&global, fee_authority_info)?;

    let mut market = load_market(program_id, market_info, creator_info.key)?;
    if !market.is_open() {
        msg!("Error: Market is not open (status {:?})", market.status);
        return Err(PredictionMarketError::MarketNotOpen.into());
    }
    if args.amount == 0 {
        msg!("Error: Bet amount must be greater than zero");
        return Err(PredictionMarketError::ZeroAmount.into());
    }
    let rent = Rent::get()?;
    ensure_balance(user_info, args.amount, &rent)?;

    let split = apply_fee(&global, FeeKind::Betting, args.amount);
    ensure_fee_recipient(fee_authority_info, split.fee, &rent)?;
    let current_time = get_current_timestamp()?;
    market.record_bet(args.outcome, split.net, current_time)?;
    global.record_fee(split.fee)?;

    route_fee(user_info, fee_authority_info, system_program_info, split.fee)?;
    cpi_system_transfer(user_info, market_info, system_program_info, split.net)?;

    save(&market, market_info)?;
    save(&global, global_info)?;

    msg!("Bet placed on {:?}: {} (fee {})", args.outcome, split.net, split.fee);
    msg!("Stakes: {} A / {} B", market.bet_a, market.bet_b);
    msg!("Pooled: {}", market.pooled_total()?);

    emit(&BetPlaced {
        market: *market_info.key,
        user: *user_info.key,
        outcome: args.outcome,
        amount: args.amount,
        fee: split.fee,
    });

    Ok(())
}

fn process_resolve_market(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Market Creator or Fee Authority (signer)
    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    // Account 1: Global PDA
    let global_info = next_account_info(account_info_iter)?;

    // Account 2: Market PDA (writable)
    let market_info = next_account_info(account_info_iter)?;
    check_writable(market_info)?;

    // Account 3: Market Creator
    let creator_info = next_account_info(account_info_iter)?;

    // Account 4: Switchboard aggregator
    let feed_info = next_account_info(account_info_iter)?;

    let global = load_global(program_id, global_info)?;
    let mut market = load_market(program_id, market_info, creator_info.key)?;

    if *authority_info.key != market.creator && *authority_info.key != global.fee_authority {
        msg!("Error: Only the creator or fee authority can resolve");
        return Err(PredictionMarketError::Unauthorized.into());
    }
    if *feed_info.key != market.oracle_feed {
        msg!(
            "Error: Feed mismatch: market uses {}, got {}",
            market.oracle_feed,
            feed_info.key
        );
        return Err(PredictionMarketError::InvalidOracleFeed.into());
    }
    if !market.is_open() {
        msg!("Error: Market is not open (status {:?})", market.status);
        return Err(PredictionMarketError::MarketNotOpen.into());
    }

    let current_time = get_current_timestamp()?;
    let reading = read_market_feed(feed_info, current_time)?;
    let outcome = market.resolve(reading.price, current_time)?;
    save(&market, market_info)?;

    msg!("Market resolved: {:?}", outcome);
    msg!(
        "Price {} vs threshold {}",
        oracle::whole_units(reading.price),
        market.threshold
    );

    emit(&OracleResUpdated {
        feed: *feed_info.key,
        price: reading.price,
        round_open_timestamp: reading.round_open_timestamp,
    });
    emit(&MarketResolved {
        market: *market_info.key,
        price: reading.price,
        outcome,
    });

    Ok(())
}

fn process_settle_market(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Fee Authority (signer)
    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    // Account 1: Global PDA
    let global_info = next_account_info(account_info_iter)?;

    // Account 2: Market PDA (writable)
    let market_info = next_account_info(account_info_iter)?;
    check_writable(market_info)?;

    // Account 3: Market Creator
    let creator_info = next_account_info(account_info_iter)?;

    let global = load_global(program_id, global_info)?;
    if *authority_info.key != global.fee_authority {
        msg!("Error: Only the fee authority can settle");
        return Err(PredictionMarketError::Unauthorized.into());
    }

    let mut market = load_market(program_id, market_info, creator_info.key)?;
    let current_time = get_current_timestamp()?;
    market.settle(current_time)?;
    let outcome = market
        .resolved_outcome
        .ok_or(PredictionMarketError::InvalidAccountData)?;
    save(&market, market_info)?;

    msg!("Market settled: {:?}", outcome);

    emit(&MarketSettled {
        market: *market_info.key,
        outcome,
    });

    Ok(())
}
