pub mod aggregator;
pub mod contest;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod message;
pub mod normalizer;
pub mod scheduler;
pub mod sources;
pub mod subscription;
pub mod telegram;

pub use contest::{Contest, Platform};
pub use subscription::{Subscription, SubscriptionStore};
