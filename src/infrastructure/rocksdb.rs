use crate::domain::cost::{MerchantMoneyBackCost, MerchantPaymentChannelCost};
use crate::domain::merchant::{Merchant, MerchantId};
use crate::domain::notification::{Notification, NotificationId};
use crate::domain::ports::{MerchantCostStore, MerchantStore, NotificationStore};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for merchant records, keyed by merchant id.
pub const CF_MERCHANTS: &str = "merchants";
/// Column Family for the notification log, keyed by notification id.
pub const CF_NOTIFICATIONS: &str = "notifications";
/// Keyed by merchant id followed by the record id.
pub const CF_PAYMENT_CHANNEL_COSTS: &str = "payment_channel_costs";
/// Keyed by merchant id followed by the record id.
pub const CF_MONEY_BACK_COSTS: &str = "money_back_costs";

const COLUMN_FAMILIES: [&str; 4] = [
    CF_MERCHANTS,
    CF_NOTIFICATIONS,
    CF_PAYMENT_CHANNEL_COSTS,
    CF_MONEY_BACK_COSTS,
];

/// Document store on RocksDB, one column family per collection with JSON values.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Missing column families are created, so a database written by an
    /// older layout opens without migration.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Looks up the handle of a column family opened in [`RocksDBStore::open`].
    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| BillingError::store(name, "column family not found"))
    }

    /// Serializes `value` as JSON and writes it under `key`.
    ///
    /// # Arguments
    ///
    /// * `collection` - The column family to write to.
    /// * `key` - The raw record key.
    /// * `value` - The record to store.
    fn put<T: Serialize>(&self, collection: &'static str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(collection)?;
        self.db.put_cf(cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, collection: &'static str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(collection)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Writes every record in one atomic `WriteBatch`.
    ///
    /// # Arguments
    ///
    /// * `collection` - The column family to write to.
    /// * `records` - The records to store.
    /// * `key` - Derives the raw key of each record.
    fn put_batch<T, F>(&self, collection: &'static str, records: &[T], key: F) -> Result<()>
    where
        T: Serialize,
        F: Fn(&T) -> Vec<u8>,
    {
        let cf = self.cf(collection)?;
        let mut batch = WriteBatch::default();
        for record in records {
            batch.put_cf(cf, key(record), serde_json::to_vec(record)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Decodes every record whose key starts with `prefix`, in key order.
    fn scan<T: DeserializeOwned>(&self, collection: &'static str, prefix: &[u8]) -> Result<Vec<T>> {
        let cf = self.cf(collection)?;
        let mut records = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

/// Merchant id bytes followed by the record id, so prefix scans group by merchant.
fn owned_key(merchant_id: &MerchantId, id: &Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(merchant_id.as_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

#[async_trait]
impl MerchantStore for RocksDBStore {
    async fn store(&self, merchant: Merchant) -> Result<()> {
        self.put(CF_MERCHANTS, merchant.id.as_bytes(), &merchant)
    }

    async fn get(&self, id: &MerchantId) -> Result<Option<Merchant>> {
        self.read(CF_MERCHANTS, id.as_bytes())
    }
}

#[async_trait]
impl NotificationStore for RocksDBStore {
    async fn insert(&self, notification: Notification) -> Result<()> {
        self.put(CF_NOTIFICATIONS, notification.id.as_bytes(), &notification)
    }

    async fn update(&self, notification: Notification) -> Result<()> {
        let existing: Option<Notification> = self.read(CF_NOTIFICATIONS, notification.id.as_bytes())?;
        if existing.is_none() {
            return Err(BillingError::store(
                CF_NOTIFICATIONS,
                format!("no notification {}", notification.id),
            ));
        }
        self.put(CF_NOTIFICATIONS, notification.id.as_bytes(), &notification)
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<Notification>> {
        self.read(CF_NOTIFICATIONS, id.as_bytes())
    }

    async fn list_by_merchant(&self, merchant_id: &MerchantId) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .scan::<Notification>(CF_NOTIFICATIONS, &[])?
            .into_iter()
            .filter(|n| n.merchant_id == *merchant_id)
            .collect();
        notifications.sort_by_key(|n| n.created_at);
        Ok(notifications)
    }
}

#[async_trait]
impl MerchantCostStore for RocksDBStore {
    async fn insert_payment_channel_costs(
        &self,
        costs: Vec<MerchantPaymentChannelCost>,
    ) -> Result<()> {
        self.put_batch(CF_PAYMENT_CHANNEL_COSTS, &costs, |c| {
            owned_key(&c.merchant_id, &c.id)
        })
    }

    async fn insert_money_back_costs(&self, costs: Vec<MerchantMoneyBackCost>) -> Result<()> {
        self.put_batch(CF_MONEY_BACK_COSTS, &costs, |c| owned_key(&c.merchant_id, &c.id))
    }

    async fn payment_channel_costs(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<MerchantPaymentChannelCost>> {
        self.scan(CF_PAYMENT_CHANNEL_COSTS, merchant_id.as_bytes())
    }

    async fn money_back_costs(&self, merchant_id: &MerchantId) -> Result<Vec<MerchantMoneyBackCost>> {
        self.scan(CF_MONEY_BACK_COSTS, merchant_id.as_bytes())
    }
}
