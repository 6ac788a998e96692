use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    configuration::{AppState, State},
    error::Error,
    model::Crypto_Price,
    types::CoinGeckoMarket,
};

/// Numeric column limits of `crypto_prices`, as (precision, scale).
const PRICE_NUMERIC: (u64, i64) = (20, 6);
const CAP_NUMERIC: (u64, i64) = (30, 2);
const PCT_NUMERIC: (u64, i64) = (10, 6);

#[derive(Debug)]
pub struct RunSummary {
    pub fetched: usize,
    pub loaded: u64,
    pub skipped: u64,
    pub dropped: usize,
}

/// One full run: extract, transform with a single run-wide load timestamp,
/// then one transactional batch insert.
pub async fn fetch_insert(
    app_state: AppState<State>,
) -> Result<RunSummary, Error> {
    let load_timestamp = Utc::now();

    let records = app_state.http.get_coingecko_markets().await?;
    let fetched = records.len();

    let (prices, dropped) = transform(records, load_timestamp);
    info!(
        "transform complete: {} rows, {} dropped",
        prices.len(),
        dropped
    );

    info!("starting load of {} rows", prices.len());
    let loaded = app_state
        .database
        .crypto_prices
        .insert_many(&prices)
        .await?;
    let skipped = prices.len() as u64 - loaded;
    info!("load finished: {} inserted, {} skipped", loaded, skipped);

    Ok(RunSummary {
        fetched,
        loaded,
        skipped,
        dropped,
    })
}

/// Maps raw market records to canonical rows. Pure in (records,
/// load_timestamp); invalid records are dropped and counted, never a run
/// failure.
pub fn transform(
    records: Vec<Value>,
    load_timestamp: DateTime<Utc>,
) -> (Vec<Crypto_Price>, usize) {
    let mut prices = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for record in records {
        match transform_record(record, load_timestamp) {
            Ok(price) => prices.push(price),
            Err(err) => {
                warn!("record dropped: {}", err);
                dropped += 1;
            },
        }
    }

    (prices, dropped)
}

fn transform_record(
    record: Value,
    load_timestamp: DateTime<Utc>,
) -> Result<Crypto_Price, Error> {
    let raw: CoinGeckoMarket = serde_json::from_value(record)
        .map_err(|err| Error::Validation(format!("malformed record: {}", err)))?;

    let coin_id = match raw.id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(Error::Validation("missing coin id".to_owned())),
    };

    let current_price =
        parse_numeric(&coin_id, "current_price", raw.current_price, PRICE_NUMERIC)?;
    let market_cap =
        parse_numeric(&coin_id, "market_cap", raw.market_cap, CAP_NUMERIC)?;
    let total_volume =
        parse_numeric(&coin_id, "total_volume", raw.total_volume, CAP_NUMERIC)?;
    let high_24h =
        parse_numeric(&coin_id, "high_24h", raw.high_24h, PRICE_NUMERIC)?;
    let low_24h =
        parse_numeric(&coin_id, "low_24h", raw.low_24h, PRICE_NUMERIC)?;
    let pct_change_24h = parse_numeric(
        &coin_id,
        "pct_change_24h",
        raw.price_change_percentage_24h,
        PCT_NUMERIC,
    )?;

    let last_updated = raw.last_updated.and_then(|value| {
        DateTime::parse_from_rfc3339(&value)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    });

    Ok(Crypto_Price {
        coin_id,
        symbol: raw.symbol,
        name: raw.name,
        current_price,
        market_cap,
        total_volume,
        high_24h,
        low_24h,
        pct_change_24h,
        last_updated,
        load_timestamp,
    })
}

/// Absent fields become None, never zero. Present values must parse to a
/// decimal that fits the declared precision and scale; anything else is a
/// validation failure for the whole record.
fn parse_numeric(
    coin_id: &str,
    field: &str,
    value: Option<Value>,
    (precision, scale): (u64, i64),
) -> Result<Option<BigDecimal>, Error> {
    let Some(value) = value else {
        return Ok(None);
    };

    let parsed = match &value {
        Value::Number(number) => BigDecimal::from_str(&number.to_string()),
        Value::String(text) => BigDecimal::from_str(text),
        _ => {
            return Err(Error::Validation(format!(
                "{}: {} is not numeric",
                coin_id, field
            )))
        },
    }
    .map_err(|err| {
        Error::Validation(format!("{}: {} unparseable: {}", coin_id, field, err))
    })?;

    let parsed = parsed.normalized();
    if !fits_numeric(&parsed, precision, scale) {
        return Err(Error::Validation(format!(
            "{}: {} exceeds NUMERIC({},{})",
            coin_id, field, precision, scale
        )));
    }

    Ok(Some(parsed))
}

fn fits_numeric(value: &BigDecimal, precision: u64, scale: i64) -> bool {
    let fractional = value.fractional_digit_count();
    if fractional > scale {
        return false;
    }
    let integer_digits = value.digits() as i64 - fractional;
    integer_digits <= precision as i64 - scale
}
