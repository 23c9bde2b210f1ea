//! Versioned system fee sets and the payment-time tier lookup.

use super::cache::WriteThroughCache;
use super::cache_keys;
use super::messages::{MessageCode, MessageRegistry};
use super::response::{Failure, ServiceResponse};
use crate::domain::fees::{CardBrand, FeeAmount, FeeSetKey, FeeTier, SystemFees};
use crate::domain::ports::{PaymentMethodStoreHandle, SystemFeeStoreHandle};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

type Outcome<T> = std::result::Result<T, Failure>;

#[derive(Debug, Clone)]
pub struct AddSystemFeesRequest {
    pub method_id: String,
    pub region: String,
    /// Raw brand name as supplied by the caller.
    pub card_brand: Option<String>,
    pub fees: Vec<FeeTier>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FeeLookupRequest {
    pub method_id: String,
    pub region: String,
    pub card_brand: Option<CardBrand>,
    pub currency: String,
    pub amount: Decimal,
}

/// The tier applied to a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedFee {
    pub tier_index: u32,
    pub min_amounts: BTreeMap<String, Decimal>,
    pub transaction_cost: FeeAmount,
    pub authorization_fee: FeeAmount,
}

#[derive(Clone)]
pub struct SystemFeeService {
    fees: SystemFeeStoreHandle,
    methods: PaymentMethodStoreHandle,
    cache: WriteThroughCache,
    messages: Arc<MessageRegistry>,
    fee_precision: u32,
    bank_card_group: String,
}

impl SystemFeeService {
    /// Creates the fee service.
    ///
    /// # Arguments
    ///
    /// * `fee_precision` - Decimal places every percent and fixed fee is rounded to.
    /// * `bank_card_group` - Group alias of payment methods that require a card brand.
    pub fn new(
        fees: SystemFeeStoreHandle,
        methods: PaymentMethodStoreHandle,
        cache: WriteThroughCache,
        messages: Arc<MessageRegistry>,
        fee_precision: u32,
        bank_card_group: impl Into<String>,
    ) -> Self {
        Self {
            fees,
            methods,
            cache,
            messages,
            fee_precision,
            bank_card_group: bank_card_group.into(),
        }
    }

    /// Replaces the active fee set for the request's key.
    pub async fn add_system_fees(&self, req: AddSystemFeesRequest) -> ServiceResponse<SystemFees> {
        ServiceResponse::from_result(self.add(req).await, &self.messages)
    }

    pub async fn get_system_fees_for_payment(&self, req: &FeeLookupRequest) -> Outcome<MatchedFee> {
        let key = FeeSetKey {
            method_id: req.method_id.clone(),
            region: req.region.clone(),
            card_brand: req.card_brand,
        };
        let fees = self.active(&key).await?;
        let currency = req.currency.trim().to_uppercase();

        let (tier_index, tier) = fees
            .matching_tier(&currency, req.amount)
            .ok_or_else(|| Failure::not_found(MessageCode::MatchedMinAmountNotFound))?;

        Ok(MatchedFee {
            tier_index,
            min_amounts: tier.min_amounts.clone(),
            transaction_cost: tier.transaction_cost.clone(),
            authorization_fee: tier.authorization_fee.clone(),
        })
    }

    async fn add(&self, req: AddSystemFeesRequest) -> Outcome<SystemFees> {
        let method = self
            .methods
            .get(&req.method_id)
            .await
            .map_err(|e| {
                error!(collection = "payment_methods", method_id = %req.method_id, error = %e, "payment method lookup failed");
                Failure::system(MessageCode::UnknownError)
            })?
            .ok_or_else(|| Failure::not_found(MessageCode::PaymentMethodNotFound))?;

        let card_brand = match (method.is_bank_card(&self.bank_card_group), req.card_brand.as_deref()) {
            (true, None) => return Err(Failure::bad_data(MessageCode::CardBrandRequired)),
            (false, Some(_)) => return Err(Failure::bad_data(MessageCode::CardBrandNotAllowed)),
            (true, Some(raw)) => Some(raw.parse::<CardBrand>().map_err(|e| {
                Failure::bad_data(MessageCode::CardBrandInvalid).with_details(e.0)
            })?),
            (false, None) => None,
        };

        if req.fees.is_empty() {
            return Err(Failure::bad_data(MessageCode::FeeSetRequired));
        }

        let mut tiers = req.fees;
        for tier in &mut tiers {
            tier.normalize(self.fee_precision);
        }

        let key = FeeSetKey {
            method_id: method.id,
            region: req.region,
            card_brand,
        };

        let previous = self.fees.find_active(&key).await.map_err(|e| {
            error!(collection = "system_fees", key = ?key, error = %e, "active fee set lookup failed");
            Failure::system(MessageCode::SystemFeesSaveFailed)
        })?;
        if let Some(mut previous) = previous {
            previous.is_active = false;
            self.save(previous).await?;
        }

        let fees = SystemFees::new(key, tiers, req.user_id);
        self.save(fees.clone()).await?;

        let cache_key = cache_keys::system_fees(&fees.key);
        self.cache.refresh(&cache_key, &fees).await.map_err(|e| {
            error!(key = %cache_key, error = %e, "system fee cache refresh failed");
            Failure::system(MessageCode::CacheInvalidationFailed)
        })?;

        info!(key = %cache_key, tiers = fees.fees.len(), "system fees replaced");
        Ok(fees)
    }

    async fn save(&self, fees: SystemFees) -> Outcome<()> {
        let id = fees.id;
        self.fees.store(fees).await.map_err(|e| {
            error!(collection = "system_fees", %id, error = %e, "system fee save failed");
            Failure::system(MessageCode::SystemFeesSaveFailed)
        })
    }

    /// Cache first; a miss is loaded from the store and put back.
    async fn active(&self, key: &FeeSetKey) -> Outcome<SystemFees> {
        let cache_key = cache_keys::system_fees(key);
        if let Some(fees) = self.cache.get::<SystemFees>(&cache_key).await {
            return Ok(fees);
        }

        let fees = self
            .fees
            .find_active(key)
            .await
            .map_err(|e| {
                error!(collection = "system_fees", key = ?key, error = %e, "system fee lookup failed");
                Failure::not_found(MessageCode::SystemFeesNotFound)
            })?
            .ok_or_else(|| Failure::not_found(MessageCode::SystemFeesNotFound))?;

        if let Err(e) = self.cache.refresh(&cache_key, &fees).await {
            warn!(key = %cache_key, error = %e, "failed to cache system fees");
        }
        Ok(fees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::messages::ResponseStatus;
    use crate::domain::fees::PaymentMethod;
    use crate::domain::ports::{PaymentMethodStore, SystemFeeStore};
    use crate::infrastructure::in_memory::{
        InMemoryCache, InMemoryPaymentMethodStore, InMemorySystemFeeStore,
    };
    use rust_decimal_macros::dec;

    struct Fixture {
        service: SystemFeeService,
        store: Arc<InMemorySystemFeeStore>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemorySystemFeeStore::new());
        let methods = Arc::new(InMemoryPaymentMethodStore::new());
        for (id, group) in [("card", "BANKCARD"), ("qiwi", "QIWI")] {
            methods
                .store(PaymentMethod {
                    id: id.into(),
                    name: id.to_uppercase(),
                    group_alias: group.into(),
                })
                .await
                .unwrap();
        }
        let service = SystemFeeService::new(
            store.clone(),
            methods,
            WriteThroughCache::new(Arc::new(InMemoryCache::new())),
            Arc::new(MessageRegistry::default()),
            4,
            "BANKCARD",
        );
        Fixture { service, store }
    }

    fn tier(usd_min: Decimal, percent: Decimal) -> FeeTier {
        FeeTier {
            min_amounts: [("USD".to_string(), usd_min)].into_iter().collect(),
            transaction_cost: FeeAmount {
                percent_fee: percent,
                percent_currency: "USD".into(),
                fix_amount: dec!(0.123456),
                fix_currency: "USD".into(),
            },
            authorization_fee: FeeAmount::default(),
        }
    }

    fn card_request(fees: Vec<FeeTier>) -> AddSystemFeesRequest {
        AddSystemFeesRequest {
            method_id: "card".into(),
            region: "EU".into(),
            card_brand: Some("visa".into()),
            fees,
            user_id: Some("admin".into()),
        }
    }

    #[tokio::test]
    async fn test_brand_validation() {
        let f = fixture().await;

        let mut req = card_request(vec![tier(dec!(0), dec!(1))]);
        req.card_brand = None;
        let rsp = f.service.add_system_fees(req).await;
        assert_eq!(rsp.message_id(), Some(MessageCode::CardBrandRequired.id()));

        let mut req = card_request(vec![tier(dec!(0), dec!(1))]);
        req.method_id = "qiwi".into();
        let rsp = f.service.add_system_fees(req).await;
        assert_eq!(rsp.message_id(), Some(MessageCode::CardBrandNotAllowed.id()));

        let mut req = card_request(vec![tier(dec!(0), dec!(1))]);
        req.card_brand = Some("discover".into());
        let rsp = f.service.add_system_fees(req).await;
        assert_eq!(rsp.status, ResponseStatus::BadData);
        assert_eq!(rsp.message_id(), Some(MessageCode::CardBrandInvalid.id()));

        let rsp = f.service.add_system_fees(card_request(vec![])).await;
        assert_eq!(rsp.message_id(), Some(MessageCode::FeeSetRequired.id()));

        let mut req = card_request(vec![tier(dec!(0), dec!(1))]);
        req.method_id = "unknown".into();
        let rsp = f.service.add_system_fees(req).await;
        assert_eq!(rsp.status, ResponseStatus::NotFound);
    }

    #[tokio::test]
    async fn test_add_normalizes_and_replaces_active_set() {
        let f = fixture().await;

        let first = f
            .service
            .add_system_fees(card_request(vec![tier(dec!(0), dec!(2.00005))]))
            .await
            .item
            .unwrap();
        assert_eq!(first.key.card_brand, Some(CardBrand::Visa));
        assert_eq!(first.fees[&0].transaction_cost.percent_fee, dec!(2.0001));
        assert_eq!(first.fees[&0].transaction_cost.fix_amount, dec!(0.1235));

        let second = f
            .service
            .add_system_fees(card_request(vec![tier(dec!(0), dec!(3))]))
            .await
            .item
            .unwrap();

        let all = f.store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|s| s.is_active).count(), 1);
        let active = f.store.find_active(&second.key).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        let matched = f
            .service
            .get_system_fees_for_payment(&FeeLookupRequest {
                method_id: "card".into(),
                region: "EU".into(),
                card_brand: Some(CardBrand::Visa),
                currency: "usd".into(),
                amount: dec!(10),
            })
            .await
            .unwrap();
        assert_eq!(matched.transaction_cost.percent_fee, dec!(3));
    }

    #[tokio::test]
    async fn test_lookup_picks_highest_threshold() {
        let f = fixture().await;
        f.service
            .add_system_fees(card_request(vec![
                tier(dec!(0), dec!(3)),
                tier(dec!(100), dec!(2)),
                tier(dec!(50), dec!(2.5)),
            ]))
            .await;

        let mut req = FeeLookupRequest {
            method_id: "card".into(),
            region: "EU".into(),
            card_brand: Some(CardBrand::Visa),
            currency: "USD".into(),
            amount: dec!(75),
        };
        assert_eq!(f.service.get_system_fees_for_payment(&req).await.unwrap().tier_index, 2);

        req.amount = dec!(100);
        assert_eq!(f.service.get_system_fees_for_payment(&req).await.unwrap().tier_index, 1);

        req.currency = "EUR".into();
        assert_eq!(
            f.service.get_system_fees_for_payment(&req).await,
            Err(Failure::not_found(MessageCode::MatchedMinAmountNotFound))
        );

        req.card_brand = Some(CardBrand::Amex);
        assert_eq!(
            f.service.get_system_fees_for_payment(&req).await,
            Err(Failure::not_found(MessageCode::SystemFeesNotFound))
        );
    }
}
