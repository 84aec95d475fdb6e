use crate::{
    AppState,
    auth::{
        Authorized,
        operations::{
            CreateBlogEntry, DeleteBlogEntry, DeleteUser, ListUsers, UpdateBlogEntry, UpdateUser,
            UpdateUserRole,
        },
        password,
    },
    errors::{ApiError, AuthError},
    models::{
        BlogEntry, CreateBlogEntryRequest, CreateUserRequest, LoginRequest, LoginResponse, NewUser,
        Page, UpdateBlogEntryRequest, UpdateRoleRequest, UpdateUserRequest, User,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

/// Upper bound on `limit` for paged listings.
pub const MAX_PAGE_SIZE: i64 = 100;

// --- Query Structs ---

/// PageQuery
///
/// `page`/`limit` query parameters of the paged listings. `page` is 1-based.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl PageQuery {
    /// The requested page (at least 1) and the limit capped to `1..=MAX_PAGE_SIZE`.
    fn bounds(&self) -> (i64, i64) {
        (self.page.max(1), self.limit.clamp(1, MAX_PAGE_SIZE))
    }
}

/// BlogFilter
///
/// Optional author filter for `GET /blogs?userId=...`.
#[derive(Debug, Deserialize)]
pub struct BlogFilter {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

// --- User Handlers ---

/// register_user
///
/// [Public Route] Creates a new identity with role `user`. The password is argon2-hashed
/// before it reaches the repository and the email is stored lower-cased.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let password_hash = password::hash_password(&payload.password).map_err(|e| {
        tracing::error!("password hashing failed: {:?}", e);
        ApiError::Internal
    })?;

    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name,
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Exchanges email and password for a bearer token. Unknown email and wrong
/// password produce the same `Unauthenticated` response.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = state
        .repo
        .find_credentials_by_email(&payload.email)
        .await
        .ok_or(AuthError::Unauthenticated)?;

    if !password::verify_password(&payload.password, &credentials.password_hash) {
        return Err(AuthError::Unauthenticated.into());
    }

    let access_token = state.tokens.issue(credentials.id).map_err(|e| {
        tracing::error!("token signing failed: {:?}", e);
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl_secs(),
    }))
}

/// get_user
///
/// [Public Route] Retrieves a single identity by id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    state
        .repo
        .get_user(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// list_users
///
/// [Admin Route] Pages through all identities. `limit` is capped at `MAX_PAGE_SIZE`.
pub async fn list_users(
    _auth: Authorized<ListUsers>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<Vec<User>> {
    let (page, limit) = query.bounds();
    Json(state.repo.list_users(page, limit).await)
}

/// update_user
///
/// [Authenticated Route] Updates the caller's own profile. Role and password are not
/// part of the payload.
pub async fn update_user(
    _auth: Authorized<UpdateUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    state
        .repo
        .update_user(id, payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_user_role
///
/// [Admin Route] Assigns a new role to any identity.
pub async fn update_user_role(
    auth: Authorized<UpdateUserRole>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, ApiError> {
    let admin = auth.user()?;
    let user = state
        .repo
        .update_user_role(id, payload.role)
        .await
        .ok_or(ApiError::NotFound)?;

    tracing::info!(admin_id = admin.id, user_id = id, role = ?payload.role, "role changed");
    Ok(Json(user))
}

/// delete_user
///
/// [Admin Route] Removes an identity and everything it authored. Tokens already issued
/// to it stop working at identity resolution.
pub async fn delete_user(
    _auth: Authorized<DeleteUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> StatusCode {
    if state.repo.delete_user(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Blog Handlers ---

/// create_blog_entry
///
/// [Authenticated Route] The author is always the acting identity.
pub async fn create_blog_entry(
    auth: Authorized<CreateBlogEntry>,
    State(state): State<AppState>,
    Json(payload): Json<CreateBlogEntryRequest>,
) -> Result<(StatusCode, Json<BlogEntry>), ApiError> {
    let author = auth.user()?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    let entry = state.repo.create_blog_entry(payload, author.id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// list_blog_entries
///
/// [Public Route] All entries, or only those authored by `userId`.
pub async fn list_blog_entries(
    State(state): State<AppState>,
    Query(filter): Query<BlogFilter>,
) -> Json<Vec<BlogEntry>> {
    Json(state.repo.list_blog_entries(filter.user_id).await)
}

/// page_blog_entries
///
/// [Public Route] One page of all entries, newest first.
pub async fn page_blog_entries(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<Page<BlogEntry>> {
    let (page, limit) = query.bounds();
    let (items, total) = state.repo.page_blog_entries(None, page, limit).await;
    Json(Page::new(items, total, page, limit))
}

/// page_blog_entries_by_author
///
/// [Public Route] One page of the entries authored by `user_id`.
pub async fn page_blog_entries_by_author(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Json<Page<BlogEntry>> {
    let (page, limit) = query.bounds();
    let (items, total) = state
        .repo
        .page_blog_entries(Some(user_id), page, limit)
        .await;
    Json(Page::new(items, total, page, limit))
}

/// get_blog_entry
///
/// [Public Route]
pub async fn get_blog_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BlogEntry>, ApiError> {
    state
        .repo
        .get_blog_entry(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_blog_entry
///
/// [Authenticated Route] Author-only. The entry loaded by the ownership check is reused
/// for its id instead of being fetched again.
pub async fn update_blog_entry(
    auth: Authorized<UpdateBlogEntry>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateBlogEntryRequest>,
) -> Result<Json<BlogEntry>, ApiError> {
    let entry = auth.entry.ok_or(ApiError::NotFound)?;
    state
        .repo
        .update_blog_entry(entry.id, payload)
        .await
        .map(Json)
        // Deleted between the ownership check and the update.
        .ok_or(ApiError::NotFound)
}

/// delete_blog_entry
///
/// [Authenticated Route] Author-only.
pub async fn delete_blog_entry(
    auth: Authorized<DeleteBlogEntry>,
    State(state): State<AppState>,
) -> StatusCode {
    let Some(entry) = auth.entry else {
        return StatusCode::NOT_FOUND;
    };
    if state.repo.delete_blog_entry(entry.id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
