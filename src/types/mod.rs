mod coin_gecko_market;

pub use coin_gecko_market::CoinGeckoMarket;
