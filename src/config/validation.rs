use super::models::Config;
use crate::docstore::keys::is_valid_collection_name;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid collection name in [index]: '{0}'")]
    InvalidCollectionName(String),

    #[error("Empty index key for collection '{collection}'")]
    EmptyIndexKey { collection: String },

    #[error("Index key '{key}' listed twice for collection '{collection}'")]
    DuplicateIndexKey { collection: String, key: String },

    #[error("Store cache size must be positive")]
    InvalidCacheSize,

    #[error("Store path must not be empty")]
    EmptyStorePath,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_store(config)?;
    validate_indexes(config)?;
    Ok(())
}

fn validate_store(config: &Config) -> Result<(), ValidationError> {
    if config.store.path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyStorePath);
    }
    if config.store.cache_size.as_u64() == 0 {
        return Err(ValidationError::InvalidCacheSize);
    }
    Ok(())
}

fn validate_indexes(config: &Config) -> Result<(), ValidationError> {
    for (collection, index) in &config.index {
        if !is_valid_collection_name(collection) {
            return Err(ValidationError::InvalidCollectionName(collection.clone()));
        }

        let mut seen = HashSet::new();
        for key in &index.keys {
            if key.trim().is_empty() {
                return Err(ValidationError::EmptyIndexKey {
                    collection: collection.clone(),
                });
            }
            if !seen.insert(key.as_str()) {
                return Err(ValidationError::DuplicateIndexKey {
                    collection: collection.clone(),
                    key: key.clone(),
                });
            }
        }
        if index.fulltext.iter().any(|field| field.trim().is_empty()) {
            return Err(ValidationError::EmptyIndexKey {
                collection: collection.clone(),
            });
        }
    }
    Ok(())
}
