//! Collaborator services: the notification sink and object-storage listing.

pub mod notify;
pub mod objects;

pub use notify::{NoopNotificationSink, NotificationSink, SlackNotifier};
pub use objects::{NoopObjectListing, ObjectListing, PublicBucketListing, StoredObject};
