//! Instruction definitions for the Oracle Prediction Market Program
//!
//! Builders at the bottom derive every program address the same way the
//! processor verifies them, so clients need no on-chain lookup.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::state::{Global, Market, MarketOutcome};

/// All instructions supported by the Oracle Prediction Market Program
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum PredictionMarketInstruction {
    /// Create the Global fee configuration
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Payer (becomes admin)
    /// 1. `[writable]` Global PDA
    /// 2. `[]` System Program
    Initialize(InitializeArgs),

    /// Read the oracle feed and publish its price
    ///
    /// Accounts:
    /// 0. `[signer]` Caller
    /// 1. `[]` Switchboard aggregator feed
    GetRes,

    /// Open the creator's market
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Creator
    /// 1. `[writable]` Global PDA
    /// 2. `[writable]` Market PDA
    /// 3. `[]` Switchboard aggregator feed
    /// 4. `[writable]` Fee Authority
    /// 5. `[]` Token A Mint
    /// 6. `[]` Token B Mint
    /// 7. `[]` System Program
    InitMarket(InitMarketArgs),

    /// Deposit liquidity into an open market
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Provider
    /// 1. `[writable]` Global PDA
    /// 2. `[writable]` Market PDA
    /// 3. `[]` Market Creator
    /// 4. `[writable]` Fee Authority
    /// 5. `[]` System Program
    AddLiquidity(AddLiquidityArgs),

    /// Change fee policy (Fee Authority only)
    ///
    /// Accounts:
    /// 0. `[signer]` Fee Authority
    /// 1. `[writable]` Global PDA
    UpdateGlobal(UpdateGlobalArgs),

    /// Stake on one outcome of an open market
    ///
    /// Accounts:
    /// 0. `[signer, writable]` User
    /// 1. `[writable]` Global PDA
    /// 2. `[writable]` Market PDA
    /// 3. `[]` Market Creator
    /// 4. `[writable]` Fee Authority
    /// 5. `[]` System Program
    PlaceBet(PlaceBetArgs),

    /// Fix the outcome from the market's oracle feed
    ///
    /// Accounts:
    /// 0. `[signer]` Market Creator or Fee Authority
    /// 1. `[]` Global PDA
    /// 2. `[writable]` Market PDA
    /// 3. `[]` Market Creator
    /// 4. `[]` Switchboard aggregator feed
    ResolveMarket,

    /// Close out a resolved market (Fee Authority only)
    ///
    /// Accounts:
    /// 0. `[signer]` Fee Authority
    /// 1. `[]` Global PDA
    /// 2. `[writable]` Market PDA
    /// 3. `[]` Market Creator
    SettleMarket,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitializeArgs {
    pub fee_authority: Pubkey,
    pub creator_fee_amount: u64,
    pub liquidity_user_fee_amount: u64,
    pub betting_user_fee_amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitMarketArgs {
    /// Strike in whole quote units
    pub threshold: u64,
    pub token_a: Pubkey,
    pub token_b: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityArgs {
    /// Lamports, fee included
    pub amount: u64,
}

/// `None` leaves a field unchanged
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateGlobalArgs {
    pub new_fee_authority: Option<Pubkey>,
    pub creator_fee_amount: Option<u64>,
    pub liquidity_user_fee_amount: Option<u64>,
    pub betting_user_fee_amount: Option<u64>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaceBetArgs {
    /// Lamports, fee included
    pub amount: u64,
    pub outcome: MarketOutcome,
}

impl PredictionMarketInstruction {
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|_| ProgramError::InvalidInstructionData)
    }
}

// ============================================================================
// Instruction Builders
// ============================================================================

fn build(
    program_id: &Pubkey,
    accounts: Vec<AccountMeta>,
    data: PredictionMarketInstruction,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: data.pack()?,
    })
}

pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    args: InitializeArgs,
) -> Result<Instruction, ProgramError> {
    let (global, _) = Global::find_address(program_id);
    build(
        program_id,
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(global, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        PredictionMarketInstruction::Initialize(args),
    )
}

pub fn get_res(
    program_id: &Pubkey,
    caller: &Pubkey,
    feed: &Pubkey,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new_readonly(*feed, false),
        ],
        PredictionMarketInstruction::GetRes,
    )
}

pub fn init_market(
    program_id: &Pubkey,
    creator: &Pubkey,
    feed: &Pubkey,
    fee_authority: &Pubkey,
    args: InitMarketArgs,
) -> Result<Instruction, ProgramError> {
    let (global, _) = Global::find_address(program_id);
    let (market, _) = Market::find_address(creator, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new(global, false),
            AccountMeta::new(market, false),
            AccountMeta::new_readonly(*feed, false),
            AccountMeta::new(*fee_authority, false),
            AccountMeta::new_readonly(args.token_a, false),
            AccountMeta::new_readonly(args.token_b, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        PredictionMarketInstruction::InitMarket(args),
    )
}

pub fn add_liquidity(
    program_id: &Pubkey,
    provider: &Pubkey,
    creator: &Pubkey,
    fee_authority: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (global, _) = Global::find_address(program_id);
    let (market, _) = Market::find_address(creator, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new(*provider, true),
            AccountMeta::new(global, false),
            AccountMeta::new(market, false),
            AccountMeta::new_readonly(*creator, false),
            AccountMeta::new(*fee_authority, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        PredictionMarketInstruction::AddLiquidity(AddLiquidityArgs { amount }),
    )
}

pub fn update_global(
    program_id: &Pubkey,
    fee_authority: &Pubkey,
    args: UpdateGlobalArgs,
) -> Result<Instruction, ProgramError> {
    let (global, _) = Global::find_address(program_id);
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*fee_authority, true),
            AccountMeta::new(global, false),
        ],
        PredictionMarketInstruction::UpdateGlobal(args),
    )
}

pub fn place_bet(
    program_id: &Pubkey,
    user: &Pubkey,
    creator: &Pubkey,
    fee_authority: &Pubkey,
    args: PlaceBetArgs,
) -> Result<Instruction, ProgramError> {
    let (global, _) = Global::find_address(program_id);
    let (market, _) = Market::find_address(creator, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new(*user, true),
            AccountMeta::new(global, false),
            AccountMeta::new(market, false),
            AccountMeta::new_readonly(*creator, false),
            AccountMeta::new(*fee_authority, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        PredictionMarketInstruction::PlaceBet(args),
    )
}

pub fn resolve_market(
    program_id: &Pubkey,
    authority: &Pubkey,
    creator: &Pubkey,
    feed: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (global, _) = Global::find_address(program_id);
    let (market, _) = Market::find_address(creator, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new_readonly(global, false),
            AccountMeta::new(market, false),
            AccountMeta::new_readonly(*creator, false),
            AccountMeta::new_readonly(*feed, false),
        ],
        PredictionMarketInstruction::ResolveMarket,
    )
}

pub fn settle_market(
    program_id: &Pubkey,
    fee_authority: &Pubkey,
    creator: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (global, _) = Global::find_address(program_id);
    let (market, _) = Market::find_address(creator, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*fee_authority, true),
            AccountMeta::new_readonly(global, false),
            AccountMeta::new(market, false),
            AccountMeta::new_readonly(*creator, false),
        ],
        PredictionMarketInstruction::SettleMarket,
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_serialization() {
        let args = InitMarketArgs {
            threshold: 190,
            token_a: Pubkey::new_unique(),
            token_b: Pubkey::new_unique(),
        };
        let ix = PredictionMarketInstruction::InitMarket(args.clone());
        let serialized = ix.try_to_vec().unwrap();
        assert_eq!(serialized[0], 2);

        let deserialized: PredictionMarketInstruction =
            BorshDeserialize::try_from_slice(&serialized).unwrap();
        match deserialized {
            PredictionMarketInstruction::InitMarket(a) => {
                assert_eq!(a, args);
            }
            _ => panic!("Wrong instruction type"),
        }
    }

    #[test]
    fn test_unit_variants_are_one_byte() {
        assert_eq!(PredictionMarketInstruction::GetRes.pack().unwrap(), vec![1]);
        assert_eq!(PredictionMarketInstruction::ResolveMarket.pack().unwrap(), vec![6]);
        assert_eq!(PredictionMarketInstruction::SettleMarket.pack().unwrap(), vec![7]);
    }

    #[test]
    fn test_add_liquidity_builder_accounts() {
        let program_id = Pubkey::new_unique();
        let provider = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let fee_authority = Pubkey::new_unique();
        let ix = add_liquidity(&program_id, &provider, &creator, &fee_authority, 50_000_000).unwrap();

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts.len(), 6);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, Global::find_address(&program_id).0);
        assert_eq!(ix.accounts[2].pubkey, Market::find_address(&creator, &program_id).0);
        assert!(ix.accounts[4].is_writable);

        let decoded = PredictionMarketInstruction::try_from_slice(&ix.data).unwrap();
        assert_eq!(
            decoded,
            PredictionMarketInstruction::AddLiquidity(AddLiquidityArgs { amount: 50_000_000 })
        );
    }

    #[test]
    fn test_update_global_defaults_to_no_change() {
        let args = UpdateGlobalArgs::default();
        let bytes = args.try_to_vec().unwrap();
        // four None tags
        assert_eq!(bytes, vec![0, 0, 0, 0]);
    }
}
