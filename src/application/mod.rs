//! Application layer: the operations exposed to transport and collaborators.
//!
//! Services are cheap to clone; they share the backends through `Arc`s and
//! await every store and cache call in sequence. [`Services::new`] wires them
//! from a [`Backends`] bundle.

pub mod cache;
pub mod cache_keys;
pub mod costs;
pub mod materializer;
pub mod messages;
pub mod notifications;
pub mod onboarding;
pub mod response;
pub mod system_fees;
pub mod tariffs;

use crate::config::Settings;
use crate::domain::notification::StatusTitles;
use crate::domain::ports::Backends;
use cache::WriteThroughCache;
use costs::CostService;
use materializer::CostMaterializer;
use messages::MessageRegistry;
use notifications::NotificationLog;
use onboarding::OnboardingService;
use std::sync::Arc;
use system_fees::SystemFeeService;
use tariffs::TariffResolver;

#[derive(Clone)]
pub struct Services {
    pub onboarding: OnboardingService,
    pub notifications: NotificationLog,
    pub system_fees: SystemFeeService,
    pub costs: CostService,
}

impl Services {
    /// Wires every service over `backends`.
    ///
    /// The agreement generator is dropped when `settings.generate_agreement` is off.
    pub fn new(
        backends: Backends,
        settings: &Settings,
        messages: Arc<MessageRegistry>,
        titles: Arc<StatusTitles>,
    ) -> Self {
        let write_through = WriteThroughCache::new(backends.cache.clone());
        let resolver = TariffResolver::new(backends.tariffs.clone(), backends.cache.clone());
        let agreements = backends.agreements.filter(|_| settings.generate_agreement);
        let materializer = CostMaterializer::new(
            backends.merchants.clone(),
            backends.costs.clone(),
            resolver.clone(),
            write_through.clone(),
            agreements,
        );
        let notifications = NotificationLog::new(backends.notifications, messages.clone());

        Self {
            onboarding: OnboardingService::new(
                backends.merchants,
                notifications.clone(),
                titles,
                resolver,
                materializer,
                messages.clone(),
            ),
            notifications,
            system_fees: SystemFeeService::new(
                backends.system_fees,
                backends.payment_methods,
                write_through.clone(),
                messages.clone(),
                settings.fee_precision,
                settings.bank_card_group.clone(),
            ),
            costs: CostService::new(backends.costs, backends.payout_costs, write_through, messages),
        }
    }
}
