use crate::{
    configuration::Config,
    dao::{PoolOption, PoolType},
    error::Error,
    model::{Crypto_Price, Table},
};

#[derive(Debug)]
pub struct DatabasePool {
    pub crypto_prices: Table<Crypto_Price>,
    pub pool: PoolType,
}

impl DatabasePool {
    pub async fn new(config: &Config) -> Result<DatabasePool, Error> {
        let pool = PoolOption::new()
            .max_connections(5)
            .connect(config.database_url.as_str())
            .await?;

        Ok(DatabasePool {
            crypto_prices: Table::new(pool.clone()),
            pool,
        })
    }
}
