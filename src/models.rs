use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// --- Core Application Schemas (Mapped to Database) ---

/// UserRole
///
/// Coarse-grained privilege category. Stored as the Postgres enum `user_role`.
/// There is no hierarchy between roles: each operation lists exactly the roles it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    ChiefEditor,
    #[default]
    User,
}

/// User
///
/// The canonical identity record from the `users` table. The secret credential is kept
/// out of this struct on purpose so it can never be serialized into a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    // Globally unique.
    pub username: String,
    // Always stored lower-cased.
    pub email: String,
    pub role: UserRole,
    pub profile_image: Option<String>,
}

/// StoredCredentials
///
/// Internal row used only by the login path: the user id and its argon2 PHC string.
#[derive(Debug, Clone, FromRow)]
pub struct StoredCredentials {
    pub id: i64,
    pub password_hash: String,
}

/// NewUser
///
/// A registration that has already been normalized and had its password hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// BlogEntry
///
/// An authored post from the `blog_entries` table. `author_id` is set from the acting
/// identity at creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Default)]
pub struct BlogEntry {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: String,
    pub body: String,
    pub header_image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateUserRequest
///
/// Input payload for `POST /users`. Any role sent by the client is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// The issued bearer token and its lifetime in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// UpdateUserRequest
///
/// Partial profile update for `PUT /users/{id}`. Role and password are not updatable here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// UpdateRoleRequest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// CreateBlogEntryRequest
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateBlogEntryRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub header_image: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// UpdateBlogEntryRequest
///
/// Partial update payload. Only provided fields are changed; the author is never updatable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBlogEntryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

// --- Response Schemas ---

/// PageMeta
///
/// Paging details returned next to a page of items. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub item_count: i64,
    pub total_items: i64,
    pub items_per_page: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

/// Page
///
/// One page of a listing plus its `PageMeta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// `limit` must be positive.
    pub fn new(items: Vec<T>, total_items: i64, page: i64, limit: i64) -> Self {
        let total_pages = total_items / limit + i64::from(total_items % limit != 0);
        Self {
            meta: PageMeta {
                item_count: items.len() as i64,
                total_items,
                items_per_page: limit,
                total_pages,
                current_page: page,
            },
            items,
        }
    }
}

/// Normalizes an email address to its canonical (lower-case, trimmed) form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
