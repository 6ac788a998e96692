pub mod crypto_prices;
