use bookstore_dal::book::{BookRepository, CreateBook};
use bookstore_dal::relation::{UpdateUserBookRelation, UserBookRelationRepository};
use bookstore_dal::user::{CreateUser, UserRepository};
use sqlx::Executor as _;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    sqlx::migrate!("../../migrations").run(&conn).await.unwrap();

    conn
}

async fn create_user(conn: &sqlx::Pool<sqlx::Sqlite>, username: &str) -> i64 {
    UserRepository::new(conn.clone())
        .create(CreateUser {
            username: username.to_string(),
            password: None,
            is_staff: None,
        })
        .await
        .unwrap()
        .id
}

async fn create_book(conn: &sqlx::Pool<sqlx::Sqlite>, owner_id: i64) -> i64 {
    BookRepository::new(conn.clone())
        .create(
            CreateBook {
                name: "Test book 1".to_string(),
                price: "25".parse().unwrap(),
                author_name: "author 1".to_string(),
            },
            owner_id,
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_upsert_creates_with_defaults() {
    let conn = init_db().await;
    let user_id = create_user(&conn, "test_username").await;
    let book_id = create_book(&conn, user_id).await;
    let repo = UserBookRelationRepository::new(conn);

    assert!(repo.get(user_id, book_id).await.unwrap().is_none());

    let relation = repo
        .upsert(
            user_id,
            book_id,
            UpdateUserBookRelation {
                like: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(relation.book_id, book_id);
    assert!(relation.like);
    assert!(!relation.in_bookmarks);
    assert_eq!(relation.rate, None);
}

#[tokio::test]
async fn test_partial_patch_preserves_other_fields() {
    let conn = init_db().await;
    let user_id = create_user(&conn, "test_username").await;
    let book_id = create_book(&conn, user_id).await;
    let repo = UserBookRelationRepository::new(conn);

    repo.upsert(
        user_id,
        book_id,
        UpdateUserBookRelation {
            like: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let relation = repo
        .upsert(
            user_id,
            book_id,
            UpdateUserBookRelation {
                rate: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(relation.like);
    assert_eq!(relation.rate, Some(5));

    let stored = repo.get(user_id, book_id).await.unwrap().unwrap();
    assert!(stored.like);
    assert_eq!(stored.rate, Some(5));
}

#[tokio::test]
async fn test_relations_are_per_user() {
    let conn = init_db().await;
    let first = create_user(&conn, "test_username").await;
    let second = create_user(&conn, "test_username2").await;
    let book_id = create_book(&conn, first).await;
    let repo = UserBookRelationRepository::new(conn);

    repo.upsert(
        first,
        book_id,
        UpdateUserBookRelation {
            like: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(repo.get(second, book_id).await.unwrap().is_none());

    repo.upsert(
        second,
        book_id,
        UpdateUserBookRelation {
            in_bookmarks: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let first_relation = repo.get(first, book_id).await.unwrap().unwrap();
    assert!(first_relation.like);
    assert!(!first_relation.in_bookmarks);
}

#[tokio::test]
async fn test_deleting_book_removes_relations() {
    let conn = init_db().await;
    let user_id = create_user(&conn, "test_username").await;
    let book_id = create_book(&conn, user_id).await;

    let repo = UserBookRelationRepository::new(conn.clone());
    repo.upsert(
        user_id,
        book_id,
        UpdateUserBookRelation {
            rate: Some(3),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    BookRepository::new(conn.clone())
        .delete(book_id)
        .await
        .unwrap();
    assert!(repo.get(user_id, book_id).await.unwrap().is_none());
}
