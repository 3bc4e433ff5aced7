//! Row types for the remote tables, views, and procedures
//!
//! All of these are owned by the hosted database; the client consumes them
//! opaquely and treats every remote call as fallible and externally
//! validated. Uniqueness, foreign keys, and authorization live server-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Application role stored on a profile row.
///
/// Checking this client-side only decides which UI to show. It is a
/// convenience, not an authorization boundary; row-level security on the
/// server is the real gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A user profile row; created by the identity provider, only read and
/// patched here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub spouse_first_name: Option<String>,
    pub mailing_title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub other_city: Option<String>,
    pub home_phone: Option<String>,
    pub phone_number: Option<String>,
    pub husband_cell: Option<String>,
    pub wife_cell: Option<String>,
    pub family_members: Option<i32>,
    pub staying_home: Option<String>,
    pub has_email_access: Option<String>,
    pub association_husband: Option<String>,
    pub association_wife: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Display name admins present in chats instead of their own
    pub admin_display_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Whether this profile carries the admin role. UI convenience only.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Sender identity embedded on a message row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderProfile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub admin_display_name: Option<String>,
}

/// A product on the food-order portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub max_quantity: u32,
    pub is_active: bool,
}

/// Fields submitted when creating or editing a product
#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub max_quantity: u32,
    pub is_active: bool,
}

/// A marketplace listing from the `listings_with_author_info` view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Stored as text upstream; "0" and "free" both mean free
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub contact_info: Option<String>,
    pub author_username: Option<String>,
    pub author_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment from the `comments_with_commenter_info` view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub commenter_username: Option<String>,
    pub commenter_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for posting a comment
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

/// A conversation thread between one user and staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A message row. Immutable once created except for the two read flags,
/// which the opposite party flips in bulk by opening the thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub parent_message_id: Option<Uuid>,
    /// Frozen copy of the quoted message; edits upstream never propagate
    pub reply_snippet: Option<String>,
    pub is_read_by_user: bool,
    pub is_read_by_admin: bool,
    pub created_at: DateTime<Utc>,
    /// Sender identity resolved by the transcript query's embed
    #[serde(default)]
    pub sender: Option<SenderProfile>,
}

/// Payload for inserting a message
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub parent_message_id: Option<Uuid>,
    pub reply_snippet: Option<String>,
}

/// Per-caller conversation summary from `get_my_conversations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub topic: Option<String>,
    pub last_message_content: Option<String>,
    pub has_unread_user: bool,
}

/// Admin-side overview row from `get_admin_conversations_overview`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConversationOverview {
    pub conversation_id: Uuid,
    pub topic: Option<String>,
    pub initiator_name: Option<String>,
    pub initiator_email: Option<String>,
    pub initiator_phone: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub has_unread_admin: bool,
}

/// One order row per user: a wholesale map of product name to quantity,
/// replaced entirely on every save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub user_id: Uuid,
    pub order_items: BTreeMap<String, u32>,
    pub total_cost: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Site-wide settings row; absence means "use defaults"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub info_banner_text_1: Option<String>,
    pub info_banner_text_2: Option<String>,
    pub header_title: Option<String>,
    pub header_subtitle: Option<String>,
    pub site_title: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rabbi_name: Option<String>,
}

/// An editable static page, keyed by page name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticContent {
    pub page_name: String,
    pub content_html: Option<String>,
}
