//! Subscription descriptors a page embeds next to synced partials.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};

/// Channels and selectors of one rendered partial.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSubscription {
    pub name: String,
    pub resource_name: String,
    pub resource_id: Option<RecordId>,
    /// Scope-free token the browser presents when refetching.
    pub auth_token: String,
    pub channel_update: String,
    pub channel_destroy: String,
    pub selector_start: String,
    pub selector_end: String,
    pub refetch: bool,
}

/// Channel a list listens on for newly created records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSubscription {
    pub name: String,
    pub resource_name: String,
    pub channel: String,
    pub selector: String,
    pub refetch: bool,
}
