use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a finished recap is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    /// Broadcast into the group chat itself (subscribers still get a copy).
    #[default]
    Publicly,
    /// Deliver only to users who subscribed privately.
    OnlyPrivateSubscriptions,
}

/// Per-chat recap configuration, owned by the configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecapOptions {
    pub enabled: bool,
    pub send_mode: SendMode,
    /// How many recaps per day: 2, 3 or 4.
    pub rates_per_day: u8,
    pub pin_enabled: bool,
}

impl Default for RecapOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            send_mode: SendMode::Publicly,
            rates_per_day: 4,
            pin_enabled: false,
        }
    }
}

impl RecapOptions {
    /// History horizon in hours for the configured rate. Unknown rates fall
    /// back to the 6-hour window.
    #[must_use]
    pub const fn window_hours(&self) -> u32 {
        match self.rates_per_day {
            3 => 8,
            2 => 12,
            _ => 6,
        }
    }

    /// Delay until the next firing; the daily rate divides the day evenly,
    /// so the firing interval equals the history window.
    #[must_use]
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.window_hours()) * 3600)
    }
}

/// A private-delivery opt-in for one user in one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: i64,
    pub user_id: i64,
}

/// One message from the chat history window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_title: String,
    pub sender: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// The outcome of one summarization pass over a history window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summarization {
    /// Opaque correlation id; external feedback counters key off it.
    pub log_id: Uuid,
    /// Non-empty topic summaries, in discussion order.
    pub topics: Vec<String>,
}

/// Ordered URLs of the published pages for one recap document.
///
/// Invariant: at least one URL; the first one is the canonical link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSeries {
    urls: Vec<String>,
}

impl PageSeries {
    /// Returns `None` when `urls` is empty.
    #[must_use]
    pub fn new(urls: Vec<String>) -> Option<Self> {
        if urls.is_empty() { None } else { Some(Self { urls }) }
    }

    #[must_use]
    pub fn canonical_url(&self) -> &str {
        &self.urls[0]
    }

    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

/// A message the pipeline sent, persisted for later unpin lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessageRecord {
    pub chat_id: i64,
    pub message_id: i64,
    pub pinned: bool,
}

/// One resolved recipient of a recap run. Computed fresh each run, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTarget {
    GroupBroadcast(i64),
    PrivateSubscriber(i64),
}

impl DeliveryTarget {
    /// The chat the message is sent to (the group itself, or the
    /// subscriber's private chat).
    #[must_use]
    pub const fn chat_id(&self) -> i64 {
        match self {
            DeliveryTarget::GroupBroadcast(chat_id) => *chat_id,
            DeliveryTarget::PrivateSubscriber(user_id) => *user_id,
        }
    }

    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, DeliveryTarget::GroupBroadcast(_))
    }
}

/// Membership status of a user in a chat, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    Unknown,
}

impl MemberStatus {
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "creator" => MemberStatus::Creator,
            "administrator" => MemberStatus::Administrator,
            "member" => MemberStatus::Member,
            "restricted" => MemberStatus::Restricted,
            "left" => MemberStatus::Left,
            "kicked" => MemberStatus::Kicked,
            _ => MemberStatus::Unknown,
        }
    }

    /// Statuses that still count as being in the chat for delivery
    /// purposes. Anything else triggers auto-unsubscription.
    #[must_use]
    pub const fn allowed_for_delivery(&self) -> bool {
        matches!(
            self,
            MemberStatus::Creator
                | MemberStatus::Administrator
                | MemberStatus::Member
                | MemberStatus::Restricted
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    Unknown,
}

impl ChatKind {
    #[must_use]
    pub fn parse(kind: &str) -> Self {
        match kind {
            "private" => ChatKind::Private,
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Unknown,
        }
    }
}

/// Basic chat metadata fetched before a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: i64,
    pub title: String,
    pub kind: ChatKind,
}
