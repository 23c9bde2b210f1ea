use super::cost::{MerchantMoneyBackCost, MerchantPaymentChannelCost, PayoutCostSystem};
use super::fees::{FeeSetKey, PaymentMethod, SystemFees};
use super::merchant::{Merchant, MerchantId};
use super::notification::{Notification, NotificationId};
use super::tariff::{TariffFilter, TariffRate};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Merchant records keyed by id.
#[async_trait]
pub trait MerchantStore: Send + Sync {
    /// Inserts or replaces the merchant with the same id.
    async fn store(&self, merchant: Merchant) -> Result<()>;
    async fn get(&self, id: &MerchantId) -> Result<Option<Merchant>>;
}

/// Append-only merchant event history.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<()>;
    /// Replaces a stored notification; used only to flip its read flag.
    async fn update(&self, notification: Notification) -> Result<()>;
    async fn get(&self, id: &NotificationId) -> Result<Option<Notification>>;
    /// The merchant's notifications in insertion order.
    async fn list_by_merchant(&self, merchant_id: &MerchantId) -> Result<Vec<Notification>>;
}

/// Read-mostly tariff templates; `insert` only seeds reference data.
#[async_trait]
pub trait TariffStore: Send + Sync {
    async fn insert(&self, template: TariffRate) -> Result<()>;
    /// Templates narrowed to `filter`; an empty result is not an error.
    async fn find(&self, filter: &TariffFilter) -> Result<Vec<TariffRate>>;
}

/// Per-merchant cost copies written once by materialization.
#[async_trait]
pub trait MerchantCostStore: Send + Sync {
    /// Inserts every record or none of them.
    async fn insert_payment_channel_costs(&self, costs: Vec<MerchantPaymentChannelCost>)
    -> Result<()>;
    /// Inserts every record or none of them.
    async fn insert_money_back_costs(&self, costs: Vec<MerchantMoneyBackCost>) -> Result<()>;
    async fn payment_channel_costs(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<MerchantPaymentChannelCost>>;
    async fn money_back_costs(&self, merchant_id: &MerchantId) -> Result<Vec<MerchantMoneyBackCost>>;
}

/// Versioned fee sets; at most one record per key is active.
#[async_trait]
pub trait SystemFeeStore: Send + Sync {
    async fn find_active(&self, key: &FeeSetKey) -> Result<Option<SystemFees>>;
    /// Inserts or replaces the record with the same id.
    async fn store(&self, fees: SystemFees) -> Result<()>;
}

#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    async fn store(&self, method: PaymentMethod) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<PaymentMethod>>;
}

/// System-wide payout cost history. The newest active record wins.
#[async_trait]
pub trait PayoutCostStore: Send + Sync {
    async fn find_active(&self) -> Result<Option<PayoutCostSystem>>;
    async fn store(&self, cost: PayoutCostSystem) -> Result<()>;
}

/// Key/value cache contract. `ttl == None` keeps the entry until it is deleted.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// What the document provider answered. A rejection is a business outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgreementOutcome {
    Generated { file: String },
    Rejected { message: String },
}

/// Document generation provider producing the merchant's agreement file.
#[async_trait]
pub trait AgreementGenerator: Send + Sync {
    async fn generate(&self, merchant: &Merchant) -> Result<AgreementOutcome>;
}

pub type MerchantStoreHandle = Arc<dyn MerchantStore>;
pub type NotificationStoreHandle = Arc<dyn NotificationStore>;
pub type TariffStoreHandle = Arc<dyn TariffStore>;
pub type MerchantCostStoreHandle = Arc<dyn MerchantCostStore>;
pub type SystemFeeStoreHandle = Arc<dyn SystemFeeStore>;
pub type PaymentMethodStoreHandle = Arc<dyn PaymentMethodStore>;
pub type PayoutCostStoreHandle = Arc<dyn PayoutCostStore>;
pub type CacheHandle = Arc<dyn Cache>;
pub type AgreementGeneratorHandle = Arc<dyn AgreementGenerator>;

/// Every collaborator the services talk to.
#[derive(Clone)]
pub struct Backends {
    pub merchants: MerchantStoreHandle,
    pub notifications: NotificationStoreHandle,
    pub tariffs: TariffStoreHandle,
    pub costs: MerchantCostStoreHandle,
    pub system_fees: SystemFeeStoreHandle,
    pub payment_methods: PaymentMethodStoreHandle,
    pub payout_costs: PayoutCostStoreHandle,
    pub cache: CacheHandle,
    pub agreements: Option<AgreementGeneratorHandle>,
}
