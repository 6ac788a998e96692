pub use self::types::{DataBase, PoolOption, PoolType, QueryResult};

mod crypto_price;
mod types;
