use crate::errors::RepositoryError;
use crate::models::{
    BlogEntry, CreateBlogEntryRequest, NewUser, StoredCredentials, UpdateBlogEntryRequest,
    UpdateUserRequest, User, UserRole, normalize_email,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// authorization pipeline and the handlers to work against Postgres, the in-memory
/// store, or a test mock.
///
/// Read paths return `Option`/`Vec`: a lookup failure (timeout, connection loss) is logged
/// and surfaced as absence, so the pipeline turns it into `Unauthenticated` or `NotFound`
/// depending on which lookup failed.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity store ---
    async fn get_user(&self, id: i64) -> Option<User>;
    async fn find_credentials_by_email(&self, email: &str) -> Option<StoredCredentials>;
    // Pages are 1-based. A page past the representable range is empty.
    async fn list_users(&self, page: i64, limit: i64) -> Vec<User>;
    // Fails with `Conflict` if the username or the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    // `Ok(None)` when the user does not exist.
    async fn update_user(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepositoryError>;
    async fn update_user_role(&self, id: i64, role: UserRole) -> Option<User>;
    // Also removes every entry authored by the user.
    async fn delete_user(&self, id: i64) -> bool;

    // --- Resource store ---
    async fn get_blog_entry(&self, id: i64) -> Option<BlogEntry>;
    async fn list_blog_entries(&self, author_id: Option<i64>) -> Vec<BlogEntry>;
    // One page of entries plus the total number of matching entries.
    async fn page_blog_entries(
        &self,
        author_id: Option<i64>,
        page: i64,
        limit: i64,
    ) -> (Vec<BlogEntry>, i64);
    async fn create_blog_entry(
        &self,
        req: CreateBlogEntryRequest,
        author_id: i64,
    ) -> Result<BlogEntry, RepositoryError>;
    async fn update_blog_entry(&self, id: i64, req: UpdateBlogEntryRequest) -> Option<BlogEntry>;
    async fn delete_blog_entry(&self, id: i64) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Row offset of the 1-based `page`, or `None` when it does not fit in an `i64`.
pub fn page_offset(page: i64, limit: i64) -> Option<i64> {
    (page.max(1) - 1).checked_mul(limit.max(0))
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepositoryError::Conflict;
        }
    }
    RepositoryError::Database(e)
}

const USER_COLUMNS: &str = "id, name, username, email, role, profile_image";
const ENTRY_COLUMNS: &str =
    "id, author_id, title, description, body, header_image, is_published, created_at, updated_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. The schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    async fn find_credentials_by_email(&self, email: &str) -> Option<StoredCredentials> {
        sqlx::query_as::<_, StoredCredentials>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_credentials_by_email error: {:?}", e);
            None
        })
    }

    /// list_users
    ///
    /// Pages are 1-based; `limit` has already been clamped by the caller.
    async fn list_users(&self, page: i64, limit: i64) -> Vec<User> {
        let Some(offset) = page_offset(page, limit) else {
            return vec![];
        };
        match sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        {
            Ok(users) => users,
            Err(e) => {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            }
        }
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.name)
        .bind(user.username)
        .bind(normalize_email(&user.email))
        .bind(user.password_hash)
        .bind(UserRole::User)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    /// update_user
    ///
    /// `COALESCE` keeps every column whose field in `req` is `None`.
    async fn update_user(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                email = COALESCE($4, email),
                profile_image = COALESCE($5, profile_image)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.username)
        .bind(req.email.as_deref().map(normalize_email))
        .bind(req.profile_image)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update_user_role(&self, id: i64, role: UserRole) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_user_role error: {:?}", e);
            None
        })
    }

    async fn delete_user(&self, id: i64) -> bool {
        // blog_entries.author_id cascades.
        match sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_user error: {:?}", e);
                false
            }
        }
    }

    async fn get_blog_entry(&self, id: i64) -> Option<BlogEntry> {
        sqlx::query_as::<_, BlogEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM blog_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_blog_entry error: {:?}", e);
            None
        })
    }

    async fn list_blog_entries(&self, author_id: Option<i64>) -> Vec<BlogEntry> {
        sqlx::query_as::<_, BlogEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM blog_entries \
             WHERE ($1::BIGINT IS NULL OR author_id = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_blog_entries error: {:?}", e);
            vec![]
        })
    }

    async fn page_blog_entries(
        &self,
        author_id: Option<i64>,
        page: i64,
        limit: i64,
    ) -> (Vec<BlogEntry>, i64) {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM blog_entries WHERE ($1::BIGINT IS NULL OR author_id = $1)",
        )
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("page_blog_entries count error: {:?}", e);
            0
        });

        let Some(offset) = page_offset(page, limit) else {
            return (vec![], total);
        };
        let items = sqlx::query_as::<_, BlogEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM blog_entries \
             WHERE ($1::BIGINT IS NULL OR author_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("page_blog_entries error: {:?}", e);
            vec![]
        });
        (items, total)
    }

    async fn create_blog_entry(
        &self,
        req: CreateBlogEntryRequest,
        author_id: i64,
    ) -> Result<BlogEntry, RepositoryError> {
        sqlx::query_as::<_, BlogEntry>(&format!(
            "INSERT INTO blog_entries (author_id, title, description, body, header_image, \
             is_published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(author_id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.body)
        .bind(req.header_image)
        .bind(req.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update_blog_entry(&self, id: i64, req: UpdateBlogEntryRequest) -> Option<BlogEntry> {
        sqlx::query_as::<_, BlogEntry>(&format!(
            r#"
            UPDATE blog_entries
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                body = COALESCE($4, body),
                header_image = COALESCE($5, header_image),
                is_published = COALESCE($6, is_published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.body)
        .bind(req.header_image)
        .bind(req.is_published)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_blog_entry error: {:?}", e);
            None
        })
    }

    async fn delete_blog_entry(&self, id: i64) -> bool {
        match sqlx::query("DELETE FROM blog_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_blog_entry error: {:?}", e);
                false
            }
        }
    }
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct MemoryTables {
    users: BTreeMap<i64, (User, String)>,
    entries: BTreeMap<i64, BlogEntry>,
    next_user_id: i64,
    next_entry_id: i64,
}

/// InMemoryRepository
///
/// A process-local `Repository` used when no `DATABASE_URL` is configured in local mode,
/// and by the integration tests. Ids are assigned sequentially starting at 1.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<MemoryTables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user with an explicit role, bypassing registration. Used to seed
    /// administrators, which registration never creates.
    pub async fn insert_user(
        &self,
        user: NewUser,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let mut created = self.create_user(user).await?;
        if let Some((stored, _)) = self.tables.write().await.users.get_mut(&created.id) {
            stored.role = role;
            created.role = role;
        }
        Ok(created)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: i64) -> Option<User> {
        self.tables.read().await.users.get(&id).map(|(u, _)| u.clone())
    }

    async fn find_credentials_by_email(&self, email: &str) -> Option<StoredCredentials> {
        let email = normalize_email(email);
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| StoredCredentials {
                id: u.id,
                password_hash: hash.clone(),
            })
    }

    async fn list_users(&self, page: i64, limit: i64) -> Vec<User> {
        let Some(skip) = page_offset(page, limit) else {
            return vec![];
        };
        self.tables
            .read()
            .await
            .users
            .values()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(u, _)| u.clone())
            .collect()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let email = normalize_email(&user.email);
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|(u, _)| u.username == user.username || u.email == email);
        if taken {
            return Err(RepositoryError::Conflict);
        }
        tables.next_user_id += 1;
        let created = User {
            id: tables.next_user_id,
            name: user.name,
            username: user.username,
            email,
            role: UserRole::User,
            profile_image: None,
        };
        tables
            .users
            .insert(created.id, (created.clone(), user.password_hash));
        Ok(created)
    }

    async fn update_user(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepositoryError> {
        let email = req.email.as_deref().map(normalize_email);
        let mut tables = self.tables.write().await;
        let taken = tables.users.values().any(|(u, _)| {
            u.id != id
                && (req.username.as_ref() == Some(&u.username) || email.as_ref() == Some(&u.email))
        });
        if taken {
            return Err(RepositoryError::Conflict);
        }
        let Some((user, _)) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(username) = req.username {
            user.username = username;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(image) = req.profile_image {
            user.profile_image = Some(image);
        }
        Ok(Some(user.clone()))
    }

    async fn update_user_role(&self, id: i64, role: UserRole) -> Option<User> {
        let mut tables = self.tables.write().await;
        let (user, _) = tables.users.get_mut(&id)?;
        user.role = role;
        Some(user.clone())
    }

    async fn delete_user(&self, id: i64) -> bool {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return false;
        }
        tables.entries.retain(|_, entry| entry.author_id != id);
        true
    }

    async fn get_blog_entry(&self, id: i64) -> Option<BlogEntry> {
        self.tables.read().await.entries.get(&id).cloned()
    }

    async fn list_blog_entries(&self, author_id: Option<i64>) -> Vec<BlogEntry> {
        let tables = self.tables.read().await;
        let mut entries: Vec<BlogEntry> = tables
            .entries
            .values()
            .filter(|e| author_id.is_none_or(|author| e.author_id == author))
            .cloned()
            .collect();
        // Newest first, matching the Postgres ordering.
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        entries
    }

    async fn page_blog_entries(
        &self,
        author_id: Option<i64>,
        page: i64,
        limit: i64,
    ) -> (Vec<BlogEntry>, i64) {
        let entries = self.list_blog_entries(author_id).await;
        let total = entries.len() as i64;
        let Some(skip) = page_offset(page, limit) else {
            return (vec![], total);
        };
        let items = entries
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        (items, total)
    }

    async fn create_blog_entry(
        &self,
        req: CreateBlogEntryRequest,
        author_id: i64,
    ) -> Result<BlogEntry, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.next_entry_id += 1;
        let now = Utc::now();
        let entry = BlogEntry {
            id: tables.next_entry_id,
            author_id,
            title: req.title,
            description: req.description,
            body: req.body,
            header_image: req.header_image,
            is_published: req.is_published,
            created_at: now,
            updated_at: now,
        };
        tables.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn update_blog_entry(&self, id: i64, req: UpdateBlogEntryRequest) -> Option<BlogEntry> {
        let mut tables = self.tables.write().await;
        let entry = tables.entries.get_mut(&id)?;
        if let Some(title) = req.title {
            entry.title = title;
        }
        if let Some(description) = req.description {
            entry.description = description;
        }
        if let Some(body) = req.body {
            entry.body = body;
        }
        if let Some(image) = req.header_image {
            entry.header_image = Some(image);
        }
        if let Some(published) = req.is_published {
            entry.is_published = published;
        }
        entry.updated_at = Utc::now();
        Some(entry.clone())
    }

    async fn delete_blog_entry(&self, id: i64) -> bool {
        self.tables.write().await.entries.remove(&id).is_some()
    }
}
