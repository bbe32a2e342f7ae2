//! Token lookups through an external read engine
//!
//! [`QueryAdapter`] turns questions about tokens and transactions into
//! [`QueryDescriptor`]s, runs them on a [`ReadEngine`] and decodes the flat
//! records it returns.

mod adapter;
pub mod decode;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod types;

pub use adapter::QueryAdapter;
pub use descriptor::{OutputColumn, Projection, QueryDescriptor, Source, SpendQuery};
pub use engine::{EngineError, EngineResponse, FlatRecord, ReadEngine, merge_unique};
pub use error::{QueryError, Result};
pub use types::{
    Confirmation, GenesisDetails, MintEvent, SendOutput, SpendResolution, is_valid_baton,
};
