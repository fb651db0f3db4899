use super::{validate_lead_hours, Subscription, SubscriptionStore, UserId};
use crate::{contest::Platform, error::StoreError};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

/// Subscription table kept in process memory. Lost on restart.
#[derive(Default)]
pub struct MemorySubscriptionStore {
    rows: Mutex<HashMap<UserId, Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn get_subscribed_users(&self) -> Result<Vec<Subscription>, StoreError> {
        let rows = self.rows.lock().await;
        let mut users: Vec<Subscription> = rows
            .values()
            .filter(|subscription| subscription.is_subscribed)
            .cloned()
            .collect();
        users.sort_by_key(|subscription| subscription.user_id);

        Ok(users)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError> {
        Ok(self.rows.lock().await.get(&user_id).cloned())
    }

    async fn upsert(
        &self,
        user_id: UserId,
        platforms: &BTreeSet<Platform>,
        lead_hours: i32,
        subscribed: bool,
    ) -> Result<(), StoreError> {
        validate_lead_hours(lead_hours)?;
        self.rows.lock().await.insert(
            user_id,
            Subscription {
                user_id,
                platforms: platforms.clone(),
                reminder_lead_hours: lead_hours,
                is_subscribed: subscribed,
            },
        );

        Ok(())
    }

    async fn unsubscribe(&self, user_id: UserId) -> Result<(), StoreError> {
        if let Some(subscription) = self.rows.lock().await.get_mut(&user_id) {
            subscription.is_subscribed = false;
        }

        Ok(())
    }
}
