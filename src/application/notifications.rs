use super::messages::{MessageCode, MessageRegistry};
use super::response::{Failure, ServiceResponse};
use crate::domain::merchant::MerchantId;
use crate::domain::notification::{Notification, NotificationId};
use crate::domain::ports::NotificationStoreHandle;
use crate::domain::status::StatusChange;
use crate::error::Result;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Clone)]
pub struct CreateNotificationRequest {
    pub merchant_id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
}

/// Per-merchant event history.
#[derive(Clone)]
pub struct NotificationLog {
    store: NotificationStoreHandle,
    messages: Arc<MessageRegistry>,
}

impl NotificationLog {
    /// Creates a notification log over `store`.
    pub fn new(store: NotificationStoreHandle, messages: Arc<MessageRegistry>) -> Self {
        Self { store, messages }
    }

    /// Appends a system-authored entry; an empty `message` falls back to the title.
    pub async fn append_system(
        &self,
        merchant_id: MerchantId,
        title: &str,
        message: Option<&str>,
        statuses: Option<StatusChange>,
    ) -> Result<Notification> {
        let message = message.filter(|m| !m.trim().is_empty()).unwrap_or(title);
        let notification = Notification::system(merchant_id, title, message, statuses);
        self.store.insert(notification.clone()).await?;
        Ok(notification)
    }

    pub async fn create_notification(
        &self,
        req: CreateNotificationRequest,
    ) -> ServiceResponse<Notification> {
        ServiceResponse::from_result(self.create(req).await, &self.messages)
    }

    /// Unlike the other operations this one hands the failure back as an error.
    pub async fn get_notification(
        &self,
        merchant_id: &str,
        notification_id: &str,
    ) -> std::result::Result<Notification, Failure> {
        let merchant_id = parse_merchant_id(merchant_id)?;
        let id = notification_id
            .parse::<NotificationId>()
            .map_err(|_| Failure::bad_data(MessageCode::NotificationIdMalformed))?;

        match self.store.get(&id).await {
            Ok(Some(n)) if n.merchant_id == merchant_id => Ok(n),
            Ok(_) => Err(Failure::not_found(MessageCode::NotificationNotFound)),
            Err(e) => {
                error!(collection = "notifications", %id, error = %e, "notification lookup failed");
                Err(Failure::not_found(MessageCode::NotificationNotFound))
            }
        }
    }

    pub async fn mark_notification_as_read(
        &self,
        merchant_id: &str,
        notification_id: &str,
    ) -> ServiceResponse<Notification> {
        let result: std::result::Result<Notification, Failure> = async {
            let mut notification = self.get_notification(merchant_id, notification_id).await?;
            notification.mark_read();
            self.store.update(notification.clone()).await.map_err(|e| {
                error!(collection = "notifications", id = %notification.id, error = %e, "notification update failed");
                Failure::system(MessageCode::NotificationSaveFailed)
            })?;
            Ok(notification)
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    pub async fn list_notifications(&self, merchant_id: &str) -> ServiceResponse<Vec<Notification>> {
        let result: std::result::Result<Vec<Notification>, Failure> = async {
            let merchant_id = parse_merchant_id(merchant_id)?;
            self.store.list_by_merchant(&merchant_id).await.map_err(|e| {
                error!(collection = "notifications", %merchant_id, error = %e, "notification listing failed");
                Failure::system(MessageCode::UnknownError)
            })
        }
        .await;

        ServiceResponse::from_result(result, &self.messages)
    }

    async fn create(&self, req: CreateNotificationRequest) -> std::result::Result<Notification, Failure> {
        let merchant_id = parse_merchant_id(&req.merchant_id)?;

        if req.user_id.trim().is_empty() {
            return Err(Failure::bad_data(MessageCode::NotificationUserIdEmpty));
        }
        if req.title.trim().is_empty() {
            return Err(Failure::bad_data(MessageCode::NotificationTitleEmpty));
        }
        if req.message.trim().is_empty() {
            return Err(Failure::bad_data(MessageCode::NotificationMessageEmpty));
        }

        let notification = Notification::from_user(merchant_id, req.user_id, req.title, req.message);
        self.store.insert(notification.clone()).await.map_err(|e| {
            error!(collection = "notifications", %merchant_id, error = %e, "notification insert failed");
            Failure::system(MessageCode::NotificationSaveFailed)
        })?;

        Ok(notification)
    }
}

pub(crate) fn parse_merchant_id(value: &str) -> std::result::Result<MerchantId, Failure> {
    value
        .parse::<MerchantId>()
        .map_err(|_| Failure::bad_data(MessageCode::MerchantIdMalformed))
}
