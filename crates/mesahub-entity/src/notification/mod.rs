//! Durable notification record, creation draft, and type catalog.

pub mod catalog;
pub mod draft;
pub mod model;

pub use catalog::NotificationTypeDefinition;
pub use draft::NotificationDraft;
pub use model::Notification;
