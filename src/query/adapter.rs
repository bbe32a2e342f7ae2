use tracing::{debug, warn};

use super::decode;
use super::descriptor::{self, GenesisKey, QueryDescriptor, SpendQuery, fields};
use super::engine::{FlatRecord, ReadEngine};
use super::error::{QueryError, Result};
use super::types::{Confirmation, GenesisDetails, MintEvent, SpendResolution};

/// Read-only lookups against an external [`ReadEngine`]
///
/// Every query unions the engine's confirmed and unconfirmed partitions,
/// keeping the first record per transaction.
pub struct QueryAdapter<E> {
    engine: E,
}

impl<E: ReadEngine> QueryAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    async fn run(&self, query: &QueryDescriptor, identity: &str) -> Result<Vec<FlatRecord>> {
        let response = self.engine.read(query).await?;
        debug!(
            confirmed = response.confirmed.len(),
            unconfirmed = response.unconfirmed.len(),
            "Read engine response"
        );
        response.into_merged(identity)
    }

    /// Txids of a token's transactions since `since_block`, unconfirmed included
    pub async fn recent_token_txids(&self, token_id: &str, since_block: u64) -> Result<Vec<String>> {
        let records = self
            .run(&descriptor::recent_token_txns(token_id, since_block), fields::TXID)
            .await?;
        records
            .iter()
            .map(|record| match record.get(fields::TXID).and_then(|v| v.as_str()) {
                Some(txid) => Ok(txid.to_string()),
                None => Err(QueryError::MissingField(fields::TXID.to_string())),
            })
            .collect()
    }

    pub async fn token_details(&self, token_id: &str) -> Result<Option<GenesisDetails>> {
        let query = descriptor::genesis_lookup(&GenesisKey::TokenId(token_id.to_string()));
        let records = self.run(&query, fields::TOKEN_ID_HEX).await?;
        records.first().map(decode::genesis).transpose()
    }

    pub async fn list_tokens(&self, since_block: Option<u64>) -> Result<Vec<GenesisDetails>> {
        let query = descriptor::genesis_lookup(&GenesisKey::Since(since_block));
        let records = self.run(&query, fields::TOKEN_ID_HEX).await?;
        records.iter().map(decode::genesis).collect()
    }

    pub async fn mint_events(&self, token_id: &str) -> Result<Vec<MintEvent>> {
        let records = self
            .run(&descriptor::mint_lookup(token_id), fields::TXID)
            .await?;
        records.iter().map(decode::mint).collect()
    }

    /// Find the transaction spending `txid:vout`
    ///
    /// No spender, or more than one, resolves to [`SpendResolution::burn`].
    /// Every spender output carrying a value is listed in index order. Outputs
    /// without a token amount appear with zero tokens, so `send_outputs[i]`
    /// is always output `i` and token totals are unaffected.
    pub async fn resolve_spend(&self, txid: &str, vout: u32) -> Result<SpendResolution> {
        let query = SpendQuery::new(txid, vout);
        let records = self.run(&query.descriptor, fields::TXID).await?;

        match records.as_slice() {
            [spender] => decode::spend(spender, &query.outputs),
            _ => {
                warn!(
                    txid = %txid,
                    vout,
                    spenders = records.len(),
                    "No single spender found, assuming burn"
                );
                Ok(SpendResolution::burn())
            }
        }
    }

    /// Block and time for a confirmed transaction; `None` if unknown or unconfirmed
    pub async fn lookup_confirmation(&self, txid: &str) -> Result<Option<Confirmation>> {
        let records = self
            .run(&descriptor::confirmation_lookup(txid), fields::TXID)
            .await?;
        match records.first() {
            Some(record) => decode::confirmation(record),
            None => Ok(None),
        }
    }
}
