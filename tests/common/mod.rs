#![allow(dead_code)]

use async_trait::async_trait;
use merchant_tariffs::application::Services;
use merchant_tariffs::application::messages::MessageRegistry;
use merchant_tariffs::config::Settings;
use merchant_tariffs::domain::cost::{MerchantMoneyBackCost, MerchantPaymentChannelCost};
use merchant_tariffs::domain::merchant::{Merchant, MerchantId, MerchantStatus};
use merchant_tariffs::domain::notification::{Notification, NotificationId, StatusTitles};
use merchant_tariffs::domain::ports::{
    AgreementGenerator, AgreementGeneratorHandle, AgreementOutcome, Backends, Cache,
    MerchantCostStore, MerchantStore, NotificationStore, TariffStore,
};
use merchant_tariffs::domain::tariff::{
    FixedCost, MoneyBackTier, PaymentTier, TariffFilter, TariffRate, UndoReason,
};
use merchant_tariffs::error::{BillingError, Result};
use merchant_tariffs::infrastructure::in_memory::{
    InMemoryCache, InMemoryCostStore, InMemoryMerchantStore, InMemoryNotificationStore,
    InMemoryPaymentMethodStore, InMemoryPayoutCostStore, InMemorySystemFeeStore,
    InMemoryTariffStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn payment_tier(method: &str, currency: &str, min: Decimal, max: Decimal) -> PaymentTier {
    PaymentTier {
        method_name: method.into(),
        payout_currency: currency.into(),
        min_amount: min,
        max_amount: max,
        payer_region: "CIS".into(),
        country: String::new(),
        method_percent_fee: dec!(0.018),
        method_fixed_fee: dec!(0.02),
        method_fixed_fee_currency: "EUR".into(),
        ps_percent_fee: dec!(0.05),
        ps_fixed_fee: dec!(0.05),
        ps_fixed_fee_currency: "EUR".into(),
    }
}

pub fn money_back_tier(reason: UndoReason) -> MoneyBackTier {
    MoneyBackTier {
        method_name: "VISA".into(),
        undo_reason: reason,
        payer_region: "CIS".into(),
        country: String::new(),
        days_from: 0,
        days_to: 30,
        payment_stage: 1,
        percent_fee: dec!(0.03),
        fixed_fee: dec!(0.1),
        fixed_fee_currency: "EUR".into(),
        is_paid_by_merchant: false,
    }
}

/// CIS template: three USD payment tiers (two in `[0.75, 5)`, one in `[5, 100)`),
/// one EUR tier and a single refund money-back tier.
pub fn cis_template() -> TariffRate {
    TariffRate {
        region: "CIS".into(),
        payment: vec![
            payment_tier("VISA", "USD", dec!(0.75), dec!(5)),
            payment_tier("MASTERCARD", "USD", dec!(0.75), dec!(5)),
            payment_tier("VISA", "USD", dec!(5), dec!(100)),
            payment_tier("VISA", "EUR", dec!(0.75), dec!(5)),
        ],
        money_back: vec![money_back_tier(UndoReason::Refund)],
        payout: FixedCost {
            amount: dec!(0),
            currency: "EUR".into(),
        },
        chargeback: FixedCost {
            amount: dec!(25),
            currency: "EUR".into(),
        },
    }
}

pub fn eu_template() -> TariffRate {
    let mut template = cis_template();
    template.region = "EU".into();
    template.money_back.push(money_back_tier(UndoReason::Chargeback));
    template
}

/// Tariff store counting how often it is queried.
#[derive(Default)]
pub struct CountingTariffStore {
    inner: InMemoryTariffStore,
    pub finds: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingTariffStore {
    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TariffStore for CountingTariffStore {
    async fn insert(&self, template: TariffRate) -> Result<()> {
        self.inner.insert(template).await
    }

    async fn find(&self, filter: &TariffFilter) -> Result<Vec<TariffRate>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BillingError::store("tariff_rates", "connection reset"));
        }
        self.inner.find(filter).await
    }
}

/// Merchant store whose writes can be made to fail. Reads always succeed.
#[derive(Default)]
pub struct FlakyMerchantStore {
    pub inner: InMemoryMerchantStore,
    pub fail_stores: AtomicBool,
}

#[async_trait]
impl MerchantStore for FlakyMerchantStore {
    async fn store(&self, merchant: Merchant) -> Result<()> {
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(BillingError::store("merchants", "write conflict"));
        }
        self.inner.store(merchant).await
    }

    async fn get(&self, id: &MerchantId) -> Result<Option<Merchant>> {
        self.inner.get(id).await
    }
}

/// Notification store whose inserts can be made to fail.
#[derive(Default)]
pub struct FlakyNotificationStore {
    pub inner: InMemoryNotificationStore,
    pub fail_inserts: AtomicBool,
}

#[async_trait]
impl NotificationStore for FlakyNotificationStore {
    async fn insert(&self, notification: Notification) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(BillingError::store("notifications", "write concern failed"));
        }
        self.inner.insert(notification).await
    }

    async fn update(&self, notification: Notification) -> Result<()> {
        self.inner.update(notification).await
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<Notification>> {
        self.inner.get(id).await
    }

    async fn list_by_merchant(&self, merchant_id: &MerchantId) -> Result<Vec<Notification>> {
        self.inner.list_by_merchant(merchant_id).await
    }
}

/// Cost store whose money-back inserts can be made to fail.
#[derive(Default)]
pub struct FlakyCostStore {
    pub inner: InMemoryCostStore,
    pub fail_money_back: AtomicBool,
}

#[async_trait]
impl MerchantCostStore for FlakyCostStore {
    async fn insert_payment_channel_costs(
        &self,
        costs: Vec<MerchantPaymentChannelCost>,
    ) -> Result<()> {
        self.inner.insert_payment_channel_costs(costs).await
    }

    async fn insert_money_back_costs(&self, costs: Vec<MerchantMoneyBackCost>) -> Result<()> {
        if self.fail_money_back.load(Ordering::SeqCst) {
            return Err(BillingError::store("merchant_money_back_costs", "disk full"));
        }
        self.inner.insert_money_back_costs(costs).await
    }

    async fn payment_channel_costs(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<MerchantPaymentChannelCost>> {
        self.inner.payment_channel_costs(merchant_id).await
    }

    async fn money_back_costs(&self, merchant_id: &MerchantId) -> Result<Vec<MerchantMoneyBackCost>> {
        self.inner.money_back_costs(merchant_id).await
    }
}

/// Cache whose writes and deletes can be made to fail.
#[derive(Default)]
pub struct FlakyCache {
    pub inner: InMemoryCache,
    pub fail_sets: AtomicBool,
    pub fail_deletes: AtomicBool,
}

#[async_trait]
impl Cache for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(BillingError::cache(key, "READONLY"));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BillingError::cache(key, "connection refused"));
        }
        self.inner.delete(key).await
    }
}

pub struct StubAgreementGenerator {
    pub outcome: AgreementOutcome,
    pub calls: AtomicUsize,
}

impl StubAgreementGenerator {
    pub fn new(outcome: AgreementOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AgreementGenerator for StubAgreementGenerator {
    async fn generate(&self, _merchant: &Merchant) -> Result<AgreementOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.clone())
    }
}

/// Services over in-memory and failure-injecting backends.
pub struct Harness {
    pub services: Services,
    pub merchants: Arc<FlakyMerchantStore>,
    pub notifications: Arc<FlakyNotificationStore>,
    pub tariffs: Arc<CountingTariffStore>,
    pub costs: Arc<FlakyCostStore>,
    pub cache: Arc<FlakyCache>,
    pub system_fees: Arc<InMemorySystemFeeStore>,
    pub payment_methods: Arc<InMemoryPaymentMethodStore>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(Settings::default(), StatusTitles::default(), None).await
    }

    pub async fn build(
        settings: Settings,
        titles: StatusTitles,
        agreements: Option<AgreementGeneratorHandle>,
    ) -> Self {
        let merchants = Arc::new(FlakyMerchantStore::default());
        let notifications = Arc::new(FlakyNotificationStore::default());
        let tariffs = Arc::new(CountingTariffStore::default());
        let costs = Arc::new(FlakyCostStore::default());
        let cache = Arc::new(FlakyCache::default());
        let system_fees = Arc::new(InMemorySystemFeeStore::new());
        let payment_methods = Arc::new(InMemoryPaymentMethodStore::new());

        tariffs.insert(cis_template()).await.unwrap();
        tariffs.insert(eu_template()).await.unwrap();

        let backends = Backends {
            merchants: merchants.clone(),
            notifications: notifications.clone(),
            tariffs: tariffs.clone(),
            costs: costs.clone(),
            system_fees: system_fees.clone(),
            payment_methods: payment_methods.clone(),
            payout_costs: Arc::new(InMemoryPayoutCostStore::new()),
            cache: cache.clone(),
            agreements,
        };
        let services = Services::new(
            backends,
            &settings,
            Arc::new(MessageRegistry::default()),
            Arc::new(titles),
        );

        Self {
            services,
            merchants,
            notifications,
            tariffs,
            costs,
            cache,
            system_fees,
            payment_methods,
        }
    }

    pub async fn merchant_in(&self, status: MerchantStatus) -> Merchant {
        let mut merchant = Merchant::new("Acme Payments");
        merchant.status = status;
        self.save(&merchant).await;
        merchant
    }

    /// Writes straight to the backing store, bypassing injected failures.
    pub async fn save(&self, merchant: &Merchant) {
        self.merchants.inner.store(merchant.clone()).await.unwrap();
    }

    pub async fn reload(&self, merchant: &Merchant) -> Merchant {
        self.merchants.inner.get(&merchant.id).await.unwrap().unwrap()
    }
}
