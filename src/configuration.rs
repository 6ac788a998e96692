use std::{env, ops::Deref, sync::Arc};

use url::Url;

use crate::{
    error::Error,
    provider::{DatabasePool, HTTP},
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub database: DatabasePool,
    pub http: HTTP,
}

impl State {
    pub async fn new(
        config: Config,
        database: DatabasePool,
        http: HTTP,
    ) -> Result<State, Error> {
        database.crypto_prices.create_table().await?;
        Ok(Self {
            config,
            database,
            http,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub coingecko_host: String,
    pub vs_currency: String,
    pub per_page: u16,
    pub page: u16,
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
    pub timeout: u64,
}

impl Config {
    pub fn get_coingecko_markets_url(&self) -> Result<Url, Error> {
        let mut url =
            Url::parse(&self.coingecko_host)?.join("/api/v3/coins/markets")?;
        url.query_pairs_mut()
            .append_pair("vs_currency", &self.vs_currency)
            .append_pair("order", "market_cap_desc")
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &self.page.to_string())
            .append_pair("sparkline", "false")
            .append_pair("price_change_percentage", "24h");

        Ok(url)
    }
}

pub fn get_configuration() -> Result<Config, Error> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(value) => value,
        Err(_) => {
            let user = env::var("PG_USER")?;
            let pass = env::var("PG_PASS")?;
            let host = env_or("PG_HOST", "db");
            let db = env_or("PG_DB", "practice");
            format!("postgres://{}:{}@{}:5432/{}", user, pass, host, db)
        },
    };

    let coingecko_host = env_or("COINGECKO_HOST", "https://api.coingecko.com");
    let vs_currency = env_or("VS_CURRENCY", "usd");
    let per_page: u16 = env_or("PER_PAGE", "250").parse()?;
    let page: u16 = env_or("PAGE", "1").parse()?;
    let max_retries: u32 = env_or("MAX_RETRIES", "3").parse()?;
    let retry_backoff_secs: u64 = env_or("RETRY_BACKOFF_SECS", "1").parse()?;
    let timeout: u64 = env_or("TIMEOUT", "15").parse()?;

    if max_retries == 0 {
        return Err(Error::ConfigurationError(
            "MAX_RETRIES must be at least 1".to_owned(),
        ));
    }

    Ok(Config {
        database_url,
        coingecko_host,
        vs_currency,
        per_page,
        page,
        max_retries,
        retry_backoff_secs,
        timeout,
    })
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
