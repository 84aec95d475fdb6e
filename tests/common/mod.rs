#![allow(dead_code)]

use async_trait::async_trait;
use blog_guard::{
    errors::RepositoryError,
    models::{
        BlogEntry, CreateBlogEntryRequest, NewUser, StoredCredentials, UpdateBlogEntryRequest,
        UpdateUserRequest, User, UserRole,
    },
    repository::{InMemoryRepository, Repository},
};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

// --- Counting Repository ---

/// Wraps the in-memory store and counts the lookups the authorization pipeline makes,
/// so tests can assert which evaluators ran.
#[derive(Default)]
pub struct CountingRepo {
    pub inner: InMemoryRepository,
    pub user_lookups: AtomicUsize,
    pub entry_lookups: AtomicUsize,
}

impl CountingRepo {
    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn entry_lookups(&self) -> usize {
        self.entry_lookups.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.user_lookups.store(0, Ordering::SeqCst);
        self.entry_lookups.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Repository for CountingRepo {
    async fn get_user(&self, id: i64) -> Option<User> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user(id).await
    }
    async fn find_credentials_by_email(&self, email: &str) -> Option<StoredCredentials> {
        self.inner.find_credentials_by_email(email).await
    }
    async fn list_users(&self, page: i64, limit: i64) -> Vec<User> {
        self.inner.list_users(page, limit).await
    }
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.inner.create_user(user).await
    }
    async fn update_user(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, RepositoryError> {
        self.inner.update_user(id, req).await
    }
    async fn update_user_role(&self, id: i64, role: UserRole) -> Option<User> {
        self.inner.update_user_role(id, role).await
    }
    async fn delete_user(&self, id: i64) -> bool {
        self.inner.delete_user(id).await
    }
    async fn get_blog_entry(&self, id: i64) -> Option<BlogEntry> {
        self.entry_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_blog_entry(id).await
    }
    async fn list_blog_entries(&self, author_id: Option<i64>) -> Vec<BlogEntry> {
        self.inner.list_blog_entries(author_id).await
    }
    async fn page_blog_entries(
        &self,
        author_id: Option<i64>,
        page: i64,
        limit: i64,
    ) -> (Vec<BlogEntry>, i64) {
        self.inner.page_blog_entries(author_id, page, limit).await
    }
    async fn create_blog_entry(
        &self,
        req: CreateBlogEntryRequest,
        author_id: i64,
    ) -> Result<BlogEntry, RepositoryError> {
        self.inner.create_blog_entry(req, author_id).await
    }
    async fn update_blog_entry(&self, id: i64, req: UpdateBlogEntryRequest) -> Option<BlogEntry> {
        self.inner.update_blog_entry(id, req).await
    }
    async fn delete_blog_entry(&self, id: i64) -> bool {
        self.inner.delete_blog_entry(id).await
    }
}

// --- Seeding Helpers ---

/// A registration with a placeholder hash; enough for tests that never log in.
pub fn new_user(username: &str) -> NewUser {
    NewUser {
        name: username.to_string(),
        username: username.to_string(),
        email: format!("{}@Example.com", username),
        password_hash: "unused".to_string(),
    }
}

pub async fn seed_user(repo: &InMemoryRepository, username: &str, role: UserRole) -> User {
    repo.insert_user(new_user(username), role)
        .await
        .expect("seed user")
}

pub async fn seed_entry(repo: &InMemoryRepository, author_id: i64, title: &str) -> BlogEntry {
    repo.create_blog_entry(
        CreateBlogEntryRequest {
            title: title.to_string(),
            ..Default::default()
        },
        author_id,
    )
    .await
    .expect("seed entry")
}
