//! Conjunctive record filter used for targeted deletes (e.g. scrubbing a tenant).

use serde::{Deserialize, Serialize};

use super::latency::{EventPersistence, LatencyTier};
use super::storage_record::StorageRecord;
use crate::errors::StorageError;

/// Every supplied constraint must match. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub id: Option<String>,
    pub tenant_token: Option<String>,
    pub latency: Option<LatencyTier>,
    pub persistence: Option<EventPersistence>,
    pub retry_count: Option<u32>,
}

impl RecordFilter {
    pub fn by_tenant(tenant_token: impl Into<String>) -> Self {
        Self {
            tenant_token: Some(tenant_token.into()),
            ..Default::default()
        }
    }

    /// Build a filter from `where`-style key/value pairs.
    ///
    /// Recognised keys: `record_id`, `tenant_token`, `latency`, `persistence`,
    /// `retry_count`. A key given twice must carry the same value.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self, StorageError> {
        let mut filter = RecordFilter::default();
        for (key, value) in pairs {
            match *key {
                "record_id" => set_once(&mut filter.id, key, value.to_string())?,
                "tenant_token" => set_once(&mut filter.tenant_token, key, value.to_string())?,
                "latency" => {
                    let tier = LatencyTier::parse(value).ok_or_else(|| invalid(key, value))?;
                    set_once(&mut filter.latency, key, tier)?
                }
                "persistence" => {
                    let p = EventPersistence::parse(value).ok_or_else(|| invalid(key, value))?;
                    set_once(&mut filter.persistence, key, p)?
                }
                "retry_count" => {
                    let n = value.parse::<u32>().map_err(|_| invalid(key, value))?;
                    set_once(&mut filter.retry_count, key, n)?
                }
                other => {
                    return Err(StorageError::InvalidFilter {
                        reason: format!("unknown filter key {other:?}"),
                    })
                }
            }
        }
        Ok(filter)
    }

    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.tenant_token.is_none()
            && self.latency.is_none()
            && self.persistence.is_none()
            && self.retry_count.is_none()
    }

    pub fn matches(&self, record: &StorageRecord) -> bool {
        self.id.as_ref().map_or(true, |id| *id == record.id)
            && self
                .tenant_token
                .as_ref()
                .map_or(true, |t| *t == record.tenant_token)
            && self.latency.map_or(true, |l| l == record.latency)
            && self.persistence.map_or(true, |p| p == record.persistence)
            && self.retry_count.map_or(true, |r| r == record.retry_count)
    }
}

fn set_once<T: PartialEq>(slot: &mut Option<T>, key: &str, value: T) -> Result<(), StorageError> {
    match slot {
        Some(existing) if *existing != value => Err(StorageError::InvalidFilter {
            reason: format!("conflicting values for {key:?}"),
        }),
        _ => {
            *slot = Some(value);
            Ok(())
        }
    }
}

fn invalid(key: &str, value: &str) -> StorageError {
    StorageError::InvalidFilter {
        reason: format!("cannot parse {key:?} value {value:?}"),
    }
}
