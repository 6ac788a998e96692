use sqlx::{error::Error, QueryBuilder};

use super::DataBase;
use crate::model::{Crypto_Price, Table};

const CREATE_TABLE_SQL: &str =
    include_str!("../../../migration/postgresql/crypto_prices.sql");

impl Table<Crypto_Price> {
    /// Idempotent schema creation, matching the persisted contract exactly.
    pub async fn create_table(&self) -> Result<(), Error> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Batch insert in a single transaction. Rows already present for the
    /// same (coin_id, load_timestamp) are skipped, not errors; returns the
    /// number of rows actually inserted.
    pub async fn insert_many(&self, data: &[Crypto_Price]) -> Result<u64, Error> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut query_builder: QueryBuilder<DataBase> = QueryBuilder::new(
            r#"
            INSERT INTO "crypto_prices" (
                "coin_id",
                "symbol",
                "name",
                "current_price",
                "market_cap",
                "total_volume",
                "high_24h",
                "low_24h",
                "pct_change_24h",
                "last_updated",
                "load_timestamp"
            )"#,
        );

        query_builder.push_values(data, |mut b, row| {
            b.push_bind(&row.coin_id)
                .push_bind(&row.symbol)
                .push_bind(&row.name)
                .push_bind(&row.current_price)
                .push_bind(&row.market_cap)
                .push_bind(&row.total_volume)
                .push_bind(&row.high_24h)
                .push_bind(&row.low_24h)
                .push_bind(&row.pct_change_24h)
                .push_bind(row.last_updated)
                .push_bind(row.load_timestamp);
        });
        query_builder
            .push(r#" ON CONFLICT ("coin_id", "load_timestamp") DO NOTHING"#);

        let mut tx = self.pool.begin().await?;
        let result = query_builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}
