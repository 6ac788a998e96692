mod models;
mod table;

pub use models::Crypto_Price;
pub use table::Table;
