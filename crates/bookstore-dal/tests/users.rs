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

#[tokio::test]
async fn test_create_and_check_password() {
    let conn = init_db().await;
    let repo = UserRepository::new(conn);

    let user = repo
        .create(CreateUser {
            username: "test_username".to_string(),
            password: Some("correct horse".to_string()),
            is_staff: Some(true),
        })
        .await
        .unwrap();
    assert!(user.is_staff);

    let checked = repo
        .check_password("test_username", "correct horse")
        .await
        .unwrap();
    assert_eq!(checked.id, user.id);

    assert!(matches!(
        repo.check_password("test_username", "wrong").await,
        Err(bookstore_dal::Error::InvalidCredentials)
    ));
    assert!(matches!(
        repo.check_password("nobody", "correct horse").await,
        Err(bookstore_dal::Error::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_password_less_user_cannot_log_in() {
    let conn = init_db().await;
    let repo = UserRepository::new(conn);

    repo.create(CreateUser {
        username: "test_username".to_string(),
        password: None,
        is_staff: None,
    })
    .await
    .unwrap();

    assert!(matches!(
        repo.check_password("test_username", "anything").await,
        Err(bookstore_dal::Error::InvalidCredentials)
    ));
}
