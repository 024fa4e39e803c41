pub mod ars_rss;
pub mod binance;
pub mod coinbase;
pub mod coingecko;
pub mod currency_api;
pub mod defillama;
pub mod hn;
pub mod per_symbol;
