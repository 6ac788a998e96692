use serde::Deserialize;
use serde_json::Value;

/// One element of the `/api/v3/coins/markets` response. Numeric fields are
/// kept as raw JSON values so the transformer can parse them to fixed
/// precision without a lossy float round-trip.
#[derive(Debug, Deserialize)]
pub struct CoinGeckoMarket {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub current_price: Option<Value>,
    #[serde(default)]
    pub market_cap: Option<Value>,
    #[serde(default)]
    pub total_volume: Option<Value>,
    #[serde(default)]
    pub high_24h: Option<Value>,
    #[serde(default)]
    pub low_24h: Option<Value>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<Value>,
    #[serde(default)]
    pub last_updated: Option<String>,
}
