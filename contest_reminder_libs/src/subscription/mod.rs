pub mod memory;
pub mod postgres;

use crate::{contest::Platform, error::StoreError};
use async_trait::async_trait;
use std::collections::BTreeSet;

pub use memory::MemorySubscriptionStore;
pub use postgres::PgSubscriptionStore;

pub type UserId = i64;

pub const DEFAULT_LEAD_HOURS: i32 = 24;

/// A user's reminder preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: UserId,
    pub platforms: BTreeSet<Platform>,
    pub reminder_lead_hours: i32,
    pub is_subscribed: bool,
}

impl Subscription {
    /// Preferences of a user who subscribes for the first time: every platform, one day ahead.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            platforms: Platform::ALL.into_iter().collect(),
            reminder_lead_hours: DEFAULT_LEAD_HOURS,
            is_subscribed: true,
        }
    }
}

/// Storage of subscription rows, keyed by user.
///
/// Implementations make each call atomic; nothing is promised across calls.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_subscribed_users(&self) -> Result<Vec<Subscription>, StoreError>;

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError>;

    /// Insert or overwrite every field of the user's row.
    async fn upsert(
        &self,
        user_id: UserId,
        platforms: &BTreeSet<Platform>,
        lead_hours: i32,
        subscribed: bool,
    ) -> Result<(), StoreError>;

    /// Clear the subscribed flag, keeping platforms and lead time.
    async fn unsubscribe(&self, user_id: UserId) -> Result<(), StoreError>;
}

pub(crate) fn validate_lead_hours(lead_hours: i32) -> Result<(), StoreError> {
    if lead_hours <= 0 {
        return Err(StoreError::InvalidLeadTime(lead_hours));
    }
    Ok(())
}
