use blog_guard::{
    errors::RepositoryError,
    models::{
        CreateBlogEntryRequest, NewUser, UpdateBlogEntryRequest, UpdateUserRequest, User,
        UserRole,
    },
    repository::{PostgresRepository, Repository},
};
use chrono::Utc;
use serial_test::serial;
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};

// --- Test Context and Setup ---

/// Holds the pool of the database named by `DATABASE_URL`, migrated to the latest schema.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    /// `None` when no database is configured; the calling test then returns early.
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres repository test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// A username no earlier run of the suite has used.
fn unique(prefix: &str) -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}-{}-{}", prefix, nanos, COUNTER.fetch_add(1, Ordering::SeqCst))
}

async fn create_test_user(repo: &PostgresRepository, prefix: &str) -> User {
    let username = unique(prefix);
    repo.create_user(NewUser {
        name: prefix.to_string(),
        email: format!("{}@Test.COM", username),
        username,
        password_hash: "unused".to_string(),
    })
    .await
    .expect("Failed to create test user")
}

async fn create_test_entry(repo: &PostgresRepository, author_id: i64, title: &str) -> i64 {
    repo.create_blog_entry(
        CreateBlogEntryRequest {
            title: title.to_string(),
            body: "text".to_string(),
            ..Default::default()
        },
        author_id,
    )
    .await
    .expect("Failed to create test entry")
    .id
}

// --- Tests ---

#[tokio::test]
#[serial]
async fn test_create_user_and_credentials() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = create_test_user(&repo, "alice").await;

    assert_eq!(user.role, UserRole::User);
    assert_eq!(user.email, user.email.to_lowercase());

    let creds = repo
        .find_credentials_by_email(&user.email.to_uppercase())
        .await
        .expect("email lookup is case-insensitive");
    assert_eq!(creds.id, user.id);
    assert_eq!(creds.password_hash, "unused");

    assert_eq!(repo.get_user(user.id).await, Some(user));
}

#[tokio::test]
#[serial]
async fn test_unique_username_and_email_conflict() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let alice = create_test_user(&repo, "alice").await;
    let bob = create_test_user(&repo, "bob").await;

    let same_username = repo
        .create_user(NewUser {
            name: "x".to_string(),
            username: alice.username.clone(),
            email: format!("{}@elsewhere.org", unique("x")),
            password_hash: "unused".to_string(),
        })
        .await;
    assert!(matches!(same_username, Err(RepositoryError::Conflict)));

    let same_email = repo
        .create_user(NewUser {
            name: "y".to_string(),
            username: unique("y"),
            email: alice.email.to_uppercase(),
            password_hash: "unused".to_string(),
        })
        .await;
    assert!(matches!(same_email, Err(RepositoryError::Conflict)));

    let steal = repo
        .update_user(
            bob.id,
            UpdateUserRequest {
                email: Some(alice.email.clone()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(steal, Err(RepositoryError::Conflict)));
}

#[tokio::test]
#[serial]
async fn test_partial_updates_keep_other_columns() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let alice = create_test_user(&repo, "alice").await;

    let updated = repo
        .update_user(
            alice.id,
            UpdateUserRequest {
                profile_image: Some("avatar.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(updated.profile_image.as_deref(), Some("avatar.png"));
    assert_eq!(updated.username, alice.username);
    assert_eq!(updated.email, alice.email);

    let entry_id = create_test_entry(&repo, alice.id, "Draft").await;
    let entry = repo
        .update_blog_entry(
            entry_id,
            UpdateBlogEntryRequest {
                is_published: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("entry exists");
    assert!(entry.is_published);
    assert_eq!(entry.title, "Draft");
    assert_eq!(entry.body, "text");
    assert!(entry.updated_at >= entry.created_at);

    let missing_user = repo.update_user(-1, UpdateUserRequest::default()).await;
    assert!(missing_user.unwrap().is_none());
    let missing_entry = repo
        .update_blog_entry(-1, UpdateBlogEntryRequest::default())
        .await;
    assert!(missing_entry.is_none());
}

#[tokio::test]
#[serial]
async fn test_role_is_stored_as_enum_label() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = create_test_user(&repo, "editor").await;

    let promoted = repo
        .update_user_role(user.id, UserRole::ChiefEditor)
        .await
        .expect("user exists");
    assert_eq!(promoted.role, UserRole::ChiefEditor);

    let label: String = sqlx::query_scalar("SELECT role::TEXT FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(label, "chiefeditor");

    let reloaded = repo.get_user(user.id).await.unwrap();
    assert_eq!(reloaded.role, UserRole::ChiefEditor);
}

#[tokio::test]
#[serial]
async fn test_delete_user_cascades_to_entries() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let alice = create_test_user(&repo, "alice").await;
    let bob = create_test_user(&repo, "bob").await;
    let gone = create_test_entry(&repo, alice.id, "alice's").await;
    let kept = create_test_entry(&repo, bob.id, "bob's").await;

    assert!(repo.delete_user(alice.id).await);
    assert!(!repo.delete_user(alice.id).await);

    assert!(repo.get_user(alice.id).await.is_none());
    assert!(repo.get_blog_entry(gone).await.is_none());
    assert!(repo.get_blog_entry(kept).await.is_some());

    assert!(repo.delete_blog_entry(kept).await);
    assert!(!repo.delete_blog_entry(kept).await);
}

#[tokio::test]
#[serial]
async fn test_entry_listing_and_paging() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let alice = create_test_user(&repo, "alice").await;
    let mut ids = Vec::new();
    for title in ["a1", "a2", "a3"] {
        ids.push(create_test_entry(&repo, alice.id, title).await);
    }

    // Newest first.
    let listed: Vec<i64> = repo
        .list_blog_entries(Some(alice.id))
        .await
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let (page, total) = repo.page_blog_entries(Some(alice.id), 2, 2).await;
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, ids[0]);

    let (far, total) = repo.page_blog_entries(Some(alice.id), i64::MAX, 100).await;
    assert!(far.is_empty());
    assert_eq!(total, 3);
}

#[tokio::test]
#[serial]
async fn test_list_users_pages_by_id() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    for prefix in ["p1", "p2", "p3"] {
        create_test_user(&repo, prefix).await;
    }

    let first = repo.list_users(1, 2).await;
    let second = repo.list_users(2, 2).await;
    assert_eq!(first.len(), 2);
    assert!(!second.is_empty());
    assert!(first[0].id < first[1].id);
    assert!(first[1].id < second[0].id);

    assert!(repo.list_users(i64::MAX, 100).await.is_empty());
}
