//! Switchboard V2 aggregator reader
//!
//! Feeds are read straight from account bytes. `AggregatorAccountData` is a
//! packed zero-copy account:
//!
//!   [0..8]     discriminator
//!   [8..236]   name, metadata, queue and batch settings
//!   [236..240] min_oracle_results (u32)
//!   [240..341] update schedule, lock flag, crank pubkey
//!   [341..]    latest_confirmed_round:
//!                num_success (u32) num_error (u32) is_closed (u8)
//!                round_open_slot (u64) round_open_timestamp (i64)
//!                result.mantissa (i128) result.scale (u32)
//!
//! Readings are never cached; every caller reads the account again.

use solana_program::{account_info::AccountInfo, msg};

use crate::error::PredictionMarketError;
use crate::state::{ORACLE_MAX_STALENESS_SECS, PRICE_PRECISION, SWITCHBOARD_PROGRAM_ID};

/// sha256("account:AggregatorAccountData")[..8]
pub const AGGREGATOR_DISCRIMINATOR: [u8; 8] = [217, 230, 65, 101, 201, 162, 27, 125];

pub const OFF_MIN_ORACLE_RESULTS: usize = 236;
pub const OFF_NUM_SUCCESS: usize = 341;
pub const OFF_ROUND_OPEN_SLOT: usize = 350;
pub const OFF_ROUND_OPEN_TIMESTAMP: usize = 358;
pub const OFF_RESULT_MANTISSA: usize = 366;
pub const OFF_RESULT_SCALE: usize = 382;
pub const AGGREGATOR_MIN_LEN: usize = OFF_RESULT_SCALE + 4;

/// Largest decimal scale a Switchboard result carries
const MAX_SCALE: u32 = 28;

/// Decimal places of `PRICE_PRECISION`
const PRICE_DECIMALS: u32 = 6;

/// A validated, normalized feed reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleReading {
    /// Price in `PRICE_PRECISION` fixed point
    pub price: u64,
    pub round_open_timestamp: i64,
    pub round_open_slot: u64,
}

/// Read and validate a feed at `now` (unix seconds).
///
/// Ownership, discriminator and round sanity failures are
/// `InvalidFeedAccount`; an old round is `StaleOracleData`.
pub fn read_feed(
    feed_info: &AccountInfo,
    now: i64,
) -> Result<OracleReading, PredictionMarketError> {
    if *feed_info.owner != SWITCHBOARD_PROGRAM_ID {
        msg!("Error: Feed {} not owned by Switchboard", feed_info.key);
        return Err(PredictionMarketError::InvalidFeedAccount);
    }

    let data = feed_info
        .try_borrow_data()
        .map_err(|_| PredictionMarketError::InvalidFeedAccount)?;
    if data.len() < AGGREGATOR_MIN_LEN || data[..8] != AGGREGATOR_DISCRIMINATOR {
        msg!("Error: Feed {} is not an aggregator account", feed_info.key);
        return Err(PredictionMarketError::InvalidFeedAccount);
    }

    let min_oracle_results = read_u32(&data, OFF_MIN_ORACLE_RESULTS)?;
    let num_success = read_u32(&data, OFF_NUM_SUCCESS)?;
    if num_success < min_oracle_results {
        msg!(
            "Error: Round has {} of {} oracle results",
            num_success,
            min_oracle_results
        );
        return Err(PredictionMarketError::InvalidFeedAccount);
    }

    let round_open_slot = read_u64(&data, OFF_ROUND_OPEN_SLOT)?;
    let round_open_timestamp = read_i64(&data, OFF_ROUND_OPEN_TIMESTAMP)?;
    let mantissa = read_i128(&data, OFF_RESULT_MANTISSA)?;
    let scale = read_u32(&data, OFF_RESULT_SCALE)?;

    if !is_fresh(round_open_timestamp, now) {
        msg!(
            "Error: Feed round opened at {}, now {} (window {}s)",
            round_open_timestamp,
            now,
            ORACLE_MAX_STALENESS_SECS
        );
        return Err(PredictionMarketError::StaleOracleData);
    }

    let price = normalize_price(mantissa, scale)?;

    Ok(OracleReading {
        price,
        round_open_timestamp,
        round_open_slot,
    })
}

/// A round is fresh unless it opened more than the window before `now`
pub fn is_fresh(round_open_timestamp: i64, now: i64) -> bool {
    round_open_timestamp >= now.saturating_sub(ORACLE_MAX_STALENESS_SECS)
}

/// `mantissa * 10^-scale` as `PRICE_PRECISION` fixed point
pub fn normalize_price(mantissa: i128, scale: u32) -> Result<u64, PredictionMarketError> {
    if mantissa <= 0 || scale > MAX_SCALE {
        return Err(PredictionMarketError::InvalidFeedAccount);
    }
    let mantissa = mantissa as u128;

    let normalized = if scale <= PRICE_DECIMALS {
        mantissa
            .checked_mul(10u128.pow(PRICE_DECIMALS - scale))
            .ok_or(PredictionMarketError::ArithmeticOverflow)?
    } else {
        mantissa / 10u128.pow(scale - PRICE_DECIMALS)
    };

    if normalized == 0 {
        return Err(PredictionMarketError::InvalidFeedAccount);
    }
    u64::try_from(normalized).map_err(|_| PredictionMarketError::ArithmeticOverflow)
}

/// Whole quote units of a normalized price, for logs
pub fn whole_units(price: u64) -> u64 {
    price / PRICE_PRECISION
}

fn field<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], PredictionMarketError> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(PredictionMarketError::InvalidFeedAccount)
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, PredictionMarketError> {
    field::<4>(data, offset).map(u32::from_le_bytes)
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, PredictionMarketError> {
    field::<8>(data, offset).map(u64::from_le_bytes)
}

fn read_i64(data: &[u8], offset: usize) -> Result<i64, PredictionMarketError> {
    field::<8>(data, offset).map(i64::from_le_bytes)
}

fn read_i128(data: &[u8], offset: usize) -> Result<i128, PredictionMarketError> {
    field::<16>(data, offset).map(i128::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::{clock::Epoch, pubkey::Pubkey};

    const NOW: i64 = 1_700_000_000;

    fn aggregator_bytes(mantissa: i128, scale: u32, timestamp: i64) -> Vec<u8> {
        let mut data = vec![0u8; AGGREGATOR_MIN_LEN + 64];
        data[..8].copy_from_slice(&AGGREGATOR_DISCRIMINATOR);
        data[OFF_MIN_ORACLE_RESULTS..OFF_MIN_ORACLE_RESULTS + 4].copy_from_slice(&1u32.to_le_bytes());
        data[OFF_NUM_SUCCESS..OFF_NUM_SUCCESS + 4].copy_from_slice(&3u32.to_le_bytes());
        data[OFF_ROUND_OPEN_SLOT..OFF_ROUND_OPEN_SLOT + 8].copy_from_slice(&42u64.to_le_bytes());
        data[OFF_ROUND_OPEN_TIMESTAMP..OFF_ROUND_OPEN_TIMESTAMP + 8]
            .copy_from_slice(&timestamp.to_le_bytes());
        data[OFF_RESULT_MANTISSA..OFF_RESULT_MANTISSA + 16].copy_from_slice(&mantissa.to_le_bytes());
        data[OFF_RESULT_SCALE..OFF_RESULT_SCALE + 4].copy_from_slice(&scale.to_le_bytes());
        data
    }

    fn read_with_owner(data: &mut [u8], owner: &Pubkey) -> Result<OracleReading, PredictionMarketError> {
        let key = Pubkey::new_unique();
        let mut lamports = 1_000_000u64;
        let info = AccountInfo::new(
            &key,
            false,
            false,
            &mut lamports,
            data,
            owner,
            false,
            Epoch::default(),
        );
        read_feed(&info, NOW)
    }

    #[test]
    fn test_fresh_reading_round_trips() {
        // 190.123456789 with scale 9
        let mut data = aggregator_bytes(190_123_456_789, 9, NOW - 10);
        let reading = read_with_owner(&mut data, &SWITCHBOARD_PROGRAM_ID).unwrap();
        assert_eq!(reading.price, 190_123_456);
        assert_eq!(reading.round_open_timestamp, NOW - 10);
        assert_eq!(reading.round_open_slot, 42);
        assert_eq!(whole_units(reading.price), 190);
    }

    #[test]
    fn test_stale_reading_rejected() {
        let mut data = aggregator_bytes(190_000_000, 6, NOW - ORACLE_MAX_STALENESS_SECS - 1);
        assert_eq!(
            read_with_owner(&mut data, &SWITCHBOARD_PROGRAM_ID),
            Err(PredictionMarketError::StaleOracleData)
        );

        // exactly at the window edge is still fresh
        let mut data = aggregator_bytes(190_000_000, 6, NOW - ORACLE_MAX_STALENESS_SECS);
        assert!(read_with_owner(&mut data, &SWITCHBOARD_PROGRAM_ID).is_ok());
    }

    #[test]
    fn test_wrong_owner_or_type_rejected() {
        let mut data = aggregator_bytes(190_000_000, 6, NOW);
        assert_eq!(
            read_with_owner(&mut data, &Pubkey::new_unique()),
            Err(PredictionMarketError::InvalidFeedAccount)
        );

        let mut data = aggregator_bytes(190_000_000, 6, NOW);
        data[0] ^= 0xff;
        assert_eq!(
            read_with_owner(&mut data, &SWITCHBOARD_PROGRAM_ID),
            Err(PredictionMarketError::InvalidFeedAccount)
        );

        let mut short = vec![0u8; 100];
        short[..8].copy_from_slice(&AGGREGATOR_DISCRIMINATOR);
        assert_eq!(
            read_with_owner(&mut short, &SWITCHBOARD_PROGRAM_ID),
            Err(PredictionMarketError::InvalidFeedAccount)
        );
    }

    #[test]
    fn test_round_without_quorum_rejected() {
        let mut data = aggregator_bytes(190_000_000, 6, NOW);
        data[OFF_NUM_SUCCESS..OFF_NUM_SUCCESS + 4].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(
            read_with_owner(&mut data, &SWITCHBOARD_PROGRAM_ID),
            Err(PredictionMarketError::InvalidFeedAccount)
        );
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price(190, 0).unwrap(), 190_000_000);
        assert_eq!(normalize_price(19_050, 2).unwrap(), 190_500_000);
        assert_eq!(normalize_price(190_500_000, 6).unwrap(), 190_500_000);
        assert_eq!(normalize_price(1_905_000_000_000, 10).unwrap(), 190_500_000);

        assert_eq!(normalize_price(0, 6), Err(PredictionMarketError::InvalidFeedAccount));
        assert_eq!(normalize_price(-5, 6), Err(PredictionMarketError::InvalidFeedAccount));
        assert_eq!(normalize_price(5, 29), Err(PredictionMarketError::InvalidFeedAccount));
        // rounds to zero below the precision
        assert_eq!(normalize_price(1, 9), Err(PredictionMarketError::InvalidFeedAccount));
        assert_eq!(
            normalize_price(i128::MAX, 0),
            Err(PredictionMarketError::ArithmeticOverflow)
        );
    }
}
