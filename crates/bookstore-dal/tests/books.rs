use bookstore_dal::book::{BookFilter, BookRepository, CreateBook};
use bookstore_dal::relation::{UpdateUserBookRelation, UserBookRelationRepository};
use bookstore_dal::user::{CreateUser, UserRepository};
use bookstore_dal::Order;
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

fn book(name: &str, price: &str, author_name: &str) -> CreateBook {
    CreateBook {
        name: name.to_string(),
        price: price.parse().unwrap(),
        author_name: author_name.to_string(),
    }
}

/// Two users, four books owned by the first user, one liked relation with
/// rate 5 on the first book.
async fn seed(conn: &sqlx::Pool<sqlx::Sqlite>) -> (i64, Vec<i64>) {
    let users = UserRepository::new(conn.clone());
    let owner = users
        .create(CreateUser {
            username: "test_username".to_string(),
            password: None,
            is_staff: None,
        })
        .await
        .unwrap();

    let books = BookRepository::new(conn.clone());
    let mut ids = Vec::new();
    for payload in [
        book("Test book 1", "25", "author 1"),
        book("Test book 2", "50", "bob"),
        book("Test book 3", "60", "author 2"),
        book("Test book 4 author 1", "100", "author 3"),
    ] {
        ids.push(books.create(payload, owner.id).await.unwrap().id);
    }

    let relations = UserBookRelationRepository::new(conn.clone());
    relations
        .upsert(
            owner.id,
            ids[0],
            UpdateUserBookRelation {
                like: Some(true),
                rate: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    (owner.id, ids)
}

#[tokio::test]
async fn test_list_annotations() {
    let conn = init_db().await;
    seed(&conn).await;
    let repo = BookRepository::new(conn);

    let all = repo.list(BookFilter::default()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].name, "Test book 1");
    assert_eq!(all[0].annotated_likes, 1);
    assert_eq!(all[0].rating, Some(5.0));
    assert_eq!(all[0].owner_name.as_deref(), Some("test_username"));
    assert_eq!(all[0].price.to_string(), "25.00");
    assert_eq!(all[1].annotated_likes, 0);
    assert_eq!(all[1].rating, None);
}

#[tokio::test]
async fn test_rating_average() {
    let conn = init_db().await;
    let (_, ids) = seed(&conn).await;

    let users = UserRepository::new(conn.clone());
    let other = users
        .create(CreateUser {
            username: "second".to_string(),
            password: None,
            is_staff: None,
        })
        .await
        .unwrap();
    let relations = UserBookRelationRepository::new(conn.clone());
    relations
        .upsert(
            other.id,
            ids[0],
            UpdateUserBookRelation {
                rate: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let repo = BookRepository::new(conn);
    let annotated = repo.get_annotated(ids[0]).await.unwrap();
    assert_eq!(annotated.rating, Some(4.5));
    // a rate without a like must not count as one
    assert_eq!(annotated.annotated_likes, 1);
}

#[tokio::test]
async fn test_filter_price() {
    let conn = init_db().await;
    seed(&conn).await;
    let repo = BookRepository::new(conn);

    let filter = BookFilter {
        price: Some("60".parse().unwrap()),
        ..Default::default()
    };
    let found = repo.list(filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Test book 3");
}

#[tokio::test]
async fn test_search() {
    let conn = init_db().await;
    seed(&conn).await;
    let repo = BookRepository::new(conn);

    let filter = BookFilter {
        search: Some("author 1".to_string()),
        ..Default::default()
    };
    let found = repo.list(filter).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].name, "Test book 1");
    assert_eq!(found[1].name, "Test book 4 author 1");

    // case-insensitive
    let filter = BookFilter {
        search: Some("AUTHOR 1".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.list(filter).await.unwrap().len(), 2);

    // wildcard characters are matched literally
    let filter = BookFilter {
        search: Some("%".to_string()),
        ..Default::default()
    };
    assert!(repo.list(filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_combines_with_price() {
    let conn = init_db().await;
    seed(&conn).await;
    let repo = BookRepository::new(conn);

    let filter = BookFilter {
        price: Some("100".parse().unwrap()),
        search: Some("author 1".to_string()),
        ..Default::default()
    };
    let found = repo.list(filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Test book 4 author 1");
}

#[tokio::test]
async fn test_ordering() {
    let conn = init_db().await;
    seed(&conn).await;
    let repo = BookRepository::new(conn);

    let filter = BookFilter {
        order: Some(Order::Desc("price".to_string())),
        ..Default::default()
    };
    let by_price = repo.list(filter).await.unwrap();
    let prices: Vec<String> = by_price.iter().map(|b| b.price.to_string()).collect();
    assert_eq!(prices, ["100.00", "60.00", "50.00", "25.00"]);

    let filter = BookFilter {
        order: Some(Order::Asc("author_name".to_string())),
        ..Default::default()
    };
    let by_author = repo.list(filter).await.unwrap();
    let authors: Vec<&str> = by_author.iter().map(|b| b.author_name.as_str()).collect();
    assert_eq!(authors, ["author 1", "author 2", "author 3", "bob"]);
}

#[tokio::test]
async fn test_unknown_ordering_field_ignored() {
    let conn = init_db().await;
    let (_, ids) = seed(&conn).await;
    let repo = BookRepository::new(conn);

    let filter = BookFilter {
        order: Some(Order::Desc("no_such_field".to_string())),
        ..Default::default()
    };
    let listed = repo.list(filter).await.unwrap();
    let listed_ids: Vec<i64> = listed.iter().map(|b| b.id).collect();
    assert_eq!(listed_ids, ids);
}

#[tokio::test]
async fn test_update_and_delete() {
    let conn = init_db().await;
    let (_, ids) = seed(&conn).await;
    let repo = BookRepository::new(conn);

    let updated = repo
        .update(ids[0], book("Test book 1", "555", "author 1"))
        .await
        .unwrap();
    assert_eq!(updated.price.to_string(), "555.00");

    assert_eq!(repo.count().await.unwrap(), 4);
    repo.delete(ids[0]).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 3);

    assert!(matches!(
        repo.get(ids[0]).await,
        Err(bookstore_dal::Error::RecordNotFound(_))
    ));
    assert!(matches!(
        repo.delete(ids[0]).await,
        Err(bookstore_dal::Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_deleted_owner_clears_owner_name() {
    let conn = init_db().await;
    let (owner_id, ids) = seed(&conn).await;

    let users = UserRepository::new(conn.clone());
    users.delete(owner_id).await.unwrap();

    let repo = BookRepository::new(conn);
    let annotated = repo.get_annotated(ids[1]).await.unwrap();
    assert_eq!(annotated.owner_name, None);
}
