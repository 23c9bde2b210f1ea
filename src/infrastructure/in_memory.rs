use crate::domain::cost::{MerchantMoneyBackCost, MerchantPaymentChannelCost, PayoutCostSystem};
use crate::domain::fees::{FeeSetKey, PaymentMethod, SystemFees};
use crate::domain::merchant::{Merchant, MerchantId};
use crate::domain::notification::{Notification, NotificationId};
use crate::domain::ports::{
    Backends, Cache, MerchantCostStore, MerchantStore, NotificationStore, PaymentMethodStore,
    PayoutCostStore, SystemFeeStore, TariffStore,
};
use crate::domain::tariff::{TariffFilter, TariffRate};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for merchant records.
#[derive(Default, Clone)]
pub struct InMemoryMerchantStore {
    merchants: Arc<RwLock<HashMap<MerchantId, Merchant>>>,
}

impl InMemoryMerchantStore {
    /// Creates a new, empty in-memory merchant store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantStore for InMemoryMerchantStore {
    async fn store(&self, merchant: Merchant) -> Result<()> {
        let mut merchants = self.merchants.write().await;
        merchants.insert(merchant.id, merchant);
        Ok(())
    }

    async fn get(&self, id: &MerchantId) -> Result<Option<Merchant>> {
        let merchants = self.merchants.read().await;
        Ok(merchants.get(id).cloned())
    }
}

/// Notifications kept in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryNotificationStore {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationStore {
    /// Creates a new, empty notification log.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: Notification) -> Result<()> {
        self.notifications.write().await.push(notification);
        Ok(())
    }

    async fn update(&self, notification: Notification) -> Result<()> {
        let mut notifications = self.notifications.write().await;
        let slot = notifications
            .iter_mut()
            .find(|n| n.id == notification.id)
            .ok_or_else(|| {
                BillingError::store("notifications", format!("no notification {}", notification.id))
            })?;
        *slot = notification;
        Ok(())
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications.iter().find(|n| n.id == *id).cloned())
    }

    async fn list_by_merchant(&self, merchant_id: &MerchantId) -> Result<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .filter(|n| n.merchant_id == *merchant_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTariffStore {
    templates: Arc<RwLock<Vec<TariffRate>>>,
}

impl InMemoryTariffStore {
    /// Creates a tariff store with no templates.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TariffStore for InMemoryTariffStore {
    async fn insert(&self, template: TariffRate) -> Result<()> {
        self.templates.write().await.push(template);
        Ok(())
    }

    async fn find(&self, filter: &TariffFilter) -> Result<Vec<TariffRate>> {
        let templates = self.templates.read().await;
        Ok(templates.iter().filter_map(|t| filter.apply(t)).collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCostStore {
    payment_channel: Arc<RwLock<Vec<MerchantPaymentChannelCost>>>,
    money_back: Arc<RwLock<Vec<MerchantMoneyBackCost>>>,
}

impl InMemoryCostStore {
    /// Creates a new, empty in-memory cost store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantCostStore for InMemoryCostStore {
    async fn insert_payment_channel_costs(
        &self,
        costs: Vec<MerchantPaymentChannelCost>,
    ) -> Result<()> {
        self.payment_channel.write().await.extend(costs);
        Ok(())
    }

    async fn insert_money_back_costs(&self, costs: Vec<MerchantMoneyBackCost>) -> Result<()> {
        self.money_back.write().await.extend(costs);
        Ok(())
    }

    async fn payment_channel_costs(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<MerchantPaymentChannelCost>> {
        let costs = self.payment_channel.read().await;
        Ok(costs
            .iter()
            .filter(|c| c.merchant_id == *merchant_id)
            .cloned()
            .collect())
    }

    async fn money_back_costs(&self, merchant_id: &MerchantId) -> Result<Vec<MerchantMoneyBackCost>> {
        let costs = self.money_back.read().await;
        Ok(costs
            .iter()
            .filter(|c| c.merchant_id == *merchant_id)
            .cloned()
            .collect())
    }
}

/// Fee set history keyed by record id; inactive versions are kept.
#[derive(Default, Clone)]
pub struct InMemorySystemFeeStore {
    fees: Arc<RwLock<HashMap<Uuid, SystemFees>>>,
}

impl InMemorySystemFeeStore {
    /// Creates a new, empty fee set store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<SystemFees> {
        self.fees.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl SystemFeeStore for InMemorySystemFeeStore {
    async fn find_active(&self, key: &FeeSetKey) -> Result<Option<SystemFees>> {
        let fees = self.fees.read().await;
        Ok(fees
            .values()
            .filter(|f| f.is_active && f.key == *key)
            .max_by_key(|f| f.created_at)
            .cloned())
    }

    async fn store(&self, fees: SystemFees) -> Result<()> {
        self.fees.write().await.insert(fees.id, fees);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPaymentMethodStore {
    methods: Arc<RwLock<HashMap<String, PaymentMethod>>>,
}

impl InMemoryPaymentMethodStore {
    /// Creates a new, empty payment method catalog.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentMethodStore for InMemoryPaymentMethodStore {
    async fn store(&self, method: PaymentMethod) -> Result<()> {
        self.methods.write().await.insert(method.id.clone(), method);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<PaymentMethod>> {
        Ok(self.methods.read().await.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPayoutCostStore {
    costs: Arc<RwLock<HashMap<Uuid, PayoutCostSystem>>>,
}

impl InMemoryPayoutCostStore {
    /// Creates a new, empty payout cost store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<PayoutCostSystem> {
        self.costs.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl PayoutCostStore for InMemoryPayoutCostStore {
    async fn find_active(&self) -> Result<Option<PayoutCostSystem>> {
        let costs = self.costs.read().await;
        Ok(costs
            .values()
            .filter(|c| c.is_active)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn store(&self, cost: PayoutCostSystem) -> Result<()> {
        self.costs.write().await.insert(cost.id, cost);
        Ok(())
    }
}

/// Process-local cache. Expired entries are dropped lazily on read.
#[derive(Default, Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, (Vec<u8>, Option<Instant>)>>>,
}

impl InMemoryCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        matches!(self.get(key).await, Ok(Some(_)))
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let expires = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Every port backed by a fresh in-memory adapter, without an agreement generator.
pub fn in_memory_backends() -> Backends {
    Backends {
        merchants: Arc::new(InMemoryMerchantStore::new()),
        notifications: Arc::new(InMemoryNotificationStore::new()),
        tariffs: Arc::new(InMemoryTariffStore::new()),
        costs: Arc::new(InMemoryCostStore::new()),
        system_fees: Arc::new(InMemorySystemFeeStore::new()),
        payment_methods: Arc::new(InMemoryPaymentMethodStore::new()),
        payout_costs: Arc::new(InMemoryPayoutCostStore::new()),
        cache: Arc::new(InMemoryCache::new()),
        agreements: None,
    }
}
