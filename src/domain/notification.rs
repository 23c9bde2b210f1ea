use crate::domain::merchant::{MerchantId, MerchantStatus};
use crate::domain::status::StatusChange;
use crate::error::BillingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for NotificationId {
    type Err = BillingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|e| BillingError::ValidationError(format!("malformed notification id: {e}")))
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An entry of a merchant's event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub merchant_id: MerchantId,
    /// `None` for notifications authored by the system.
    pub user_id: Option<String>,
    pub title: String,
    pub message: String,
    pub is_system: bool,
    pub is_read: bool,
    pub statuses: Option<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn system(
        merchant_id: MerchantId,
        title: impl Into<String>,
        message: impl Into<String>,
        statuses: Option<StatusChange>,
    ) -> Self {
        Self::build(merchant_id, None, title.into(), message.into(), statuses)
    }

    pub fn from_user(
        merchant_id: MerchantId,
        user_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::build(
            merchant_id,
            Some(user_id.into()),
            title.into(),
            message.into(),
            None,
        )
    }

    fn build(
        merchant_id: MerchantId,
        user_id: Option<String>,
        title: String,
        message: String,
        statuses: Option<StatusChange>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NotificationId::new(),
            merchant_id,
            is_system: user_id.is_none(),
            user_id,
            title,
            message,
            is_read: false,
            statuses,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_read(&mut self) {
        if !self.is_read {
            self.is_read = true;
            self.updated_at = Utc::now();
        }
    }
}

/// Human readable titles of status-change notifications.
#[derive(Debug, Clone)]
pub struct StatusTitles {
    titles: HashMap<MerchantStatus, String>,
}

impl StatusTitles {
    pub fn empty() -> Self {
        Self {
            titles: HashMap::new(),
        }
    }

    pub fn with(mut self, status: MerchantStatus, title: impl Into<String>) -> Self {
        self.titles.insert(status, title.into());
        self
    }

    pub fn without(mut self, status: MerchantStatus) -> Self {
        self.titles.remove(&status);
        self
    }

    pub fn title(&self, status: MerchantStatus) -> Option<&str> {
        self.titles.get(&status).map(String::as_str)
    }
}

impl Default for StatusTitles {
    fn default() -> Self {
        Self::empty()
            .with(MerchantStatus::Draft, "Merchant onboarding restarted")
            .with(
                MerchantStatus::AgreementRequested,
                "Merchant requested an agreement",
            )
            .with(MerchantStatus::OnReview, "Merchant data is on review")
            .with(MerchantStatus::AgreementSigning, "Agreement is ready for signing")
            .with(MerchantStatus::AgreementSigned, "Agreement signed")
            .with(MerchantStatus::Deleted, "Merchant deleted")
            .with(MerchantStatus::Rejected, "Merchant rejected")
    }
}
