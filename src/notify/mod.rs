pub mod hub;

pub use hub::NotificationHub;
pub use hub::SubscriptionToken;
pub use hub::UnitObserver;
