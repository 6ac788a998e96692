use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::BigDecimal, FromRow};

/// Canonical price snapshot row, one per asset per run. The pair
/// (coin_id, load_timestamp) is the primary key of `crypto_prices`.
#[derive(Debug, Clone, PartialEq, FromRow, Deserialize, Serialize)]
pub struct Crypto_Price {
    pub coin_id: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub current_price: Option<BigDecimal>,
    pub market_cap: Option<BigDecimal>,
    pub total_volume: Option<BigDecimal>,
    pub high_24h: Option<BigDecimal>,
    pub low_24h: Option<BigDecimal>,
    pub pct_change_24h: Option<BigDecimal>,
    pub last_updated: Option<DateTime<Utc>>,
    pub load_timestamp: DateTime<Utc>,
}
