use crate::{error::Result, price::Price, Error, Order};
use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::Pool;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateBook {
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    #[garde(skip)]
    pub price: Price,
    #[garde(length(min = 1, max = 255))]
    pub author_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub price: Price,
    pub author_name: String,
    pub owner_id: Option<i64>,
}

/// Book together with the computed fields attached by the list query.
#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct AnnotatedBook {
    pub id: i64,
    pub name: String,
    pub price: Price,
    pub author_name: String,
    pub owner_name: Option<String>,
    pub annotated_likes: i64,
    #[serde(serialize_with = "serialize_rating")]
    pub rating: Option<f64>,
}

fn serialize_rating<S>(rating: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match rating {
        Some(value) => serializer.collect_str(&format_args!("{:.2}", value)),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub price: Option<Price>,
    pub search: Option<String>,
    pub order: Option<Order>,
}

const SORTABLE_FIELDS: &[&str] = &["id", "name", "price", "author_name"];

const ANNOTATED_SQL: &str = r#"
SELECT b.id, b.name, b.price, b.author_name,
u.username AS owner_name,
COUNT(CASE WHEN r.liked = 1 THEN 1 END) AS annotated_likes,
AVG(r.rate) AS rating
FROM book b
LEFT JOIN users u ON b.owner_id = u.id
LEFT JOIN user_book_relation r ON r.book_id = b.id
"#;

fn order_clause(order: Option<&Order>) -> String {
    match order {
        Some(order) if SORTABLE_FIELDS.contains(&order.as_ref()) => {
            format!("ORDER BY b.{}", order)
        }
        Some(order) => {
            debug!("Ignoring unknown ordering field {}", order.as_ref());
            "ORDER BY b.id".to_string()
        }
        None => "ORDER BY b.id".to_string(),
    }
}

fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub type BookRepository = BookRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct BookRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> BookRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateBook, owner_id: i64) -> Result<AnnotatedBook> {
        let result =
            sqlx::query("INSERT INTO book (name, price, author_name, owner_id) VALUES (?, ?, ?, ?)")
                .bind(&payload.name)
                .bind(payload.price)
                .bind(&payload.author_name)
                .bind(owner_id)
                .execute(&self.executor)
                .await?;

        let id = result.last_insert_rowid();
        self.get_annotated(id).await
    }

    pub async fn update(&self, id: i64, payload: CreateBook) -> Result<AnnotatedBook> {
        let result =
            sqlx::query("UPDATE book SET name = ?, price = ?, author_name = ? WHERE id = ?")
                .bind(&payload.name)
                .bind(payload.price)
                .bind(&payload.author_name)
                .bind(id)
                .execute(&self.executor)
                .await?;

        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound("Book".to_string()))
        } else {
            self.get_annotated(id).await
        }
    }

    pub async fn list(&self, filter: BookFilter) -> Result<Vec<AnnotatedBook>> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.price.is_some() {
            conditions.push("b.price = ?");
        }
        if filter.search.is_some() {
            conditions.push("(b.name LIKE ? ESCAPE '\\' OR b.author_name LIKE ? ESCAPE '\\')");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "{} {} GROUP BY b.id {}",
            ANNOTATED_SQL,
            where_clause,
            order_clause(filter.order.as_ref())
        );

        let mut query = sqlx::query_as::<_, AnnotatedBook>(&sql);
        if let Some(price) = filter.price {
            query = query.bind(price);
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = format!("%{}%", escape_like(search));
            query = query.bind(pattern.clone()).bind(pattern);
        }

        let records = query
            .fetch(&self.executor)
            .take(crate::MAX_LIMIT)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(records)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Book".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Book> {
        let record = sqlx::query_as::<_, Book>(
            "SELECT id, name, price, author_name, owner_id FROM book WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor)
        .await?;
        record.ok_or_else(|| Error::RecordNotFound("Book".to_string()))
    }

    pub async fn get_annotated(&self, id: i64) -> Result<AnnotatedBook> {
        let sql = format!("{} WHERE b.id = ? GROUP BY b.id", ANNOTATED_SQL);
        let record = sqlx::query_as::<_, AnnotatedBook>(&sql)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        record.ok_or_else(|| Error::RecordNotFound("Book".to_string()))
    }

    pub async fn count(&self) -> Result<u64> {
        let count: u64 = sqlx::query_scalar("SELECT count(*) FROM book")
            .fetch_one(&self.executor)
            .await?;
        Ok(count)
    }
}
