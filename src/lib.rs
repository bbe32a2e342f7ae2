pub mod config;
pub mod docstore;
pub mod humanize;
pub mod ledger;
pub mod observability;
pub mod quantity;
pub mod query;
