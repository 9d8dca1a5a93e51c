pub mod book;
pub mod query;
pub mod relation;

pub use query::BookListQuery;
