use serde::{Deserialize, Deserializer};

pub mod access;
pub mod auth;
pub mod automation_engine;
pub mod automations;
pub mod comments;
pub mod dashboard;
pub mod email;
pub mod events;
pub mod integrations;
pub mod notifications;
pub mod projects;
pub mod reminders;
pub mod reports;
pub mod sections;
pub mod tasks;

/// Deserialize a present-but-null field as `Some(None)`; use with
/// `#[serde(default)]` so an absent field stays `None`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
