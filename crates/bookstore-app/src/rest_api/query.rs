use crate::error::{ApiError, ApiResult};
use bookstore_dal::{book::BookFilter, Order};
use garde::Validate;

#[derive(Debug, Clone, Validate, serde::Deserialize)]
#[garde(allow_unvalidated)]
pub struct BookListQuery {
    price: Option<String>,
    #[garde(length(max = 255))]
    search: Option<String>,
    #[garde(length(max = 255))]
    ordering: Option<String>,
}

impl BookListQuery {
    pub fn into_filter(self) -> ApiResult<BookFilter> {
        let price = self
            .price
            .map(|p| {
                p.parse()
                    .map_err(|e| ApiError::InvalidQuery(format!("Invalid price filter: {e}")))
            })
            .transpose()?;

        // blank ordering is a no-op, same as unknown field names further down
        let order = self.ordering.as_deref().map(str::trim).and_then(|name| {
            let (field_name, descending) = match name {
                "" => return None,
                name if name.starts_with('+') => (&name[1..], false),
                name if name.starts_with('-') => (&name[1..], true),
                name => (name, false),
            };

            Some(if descending {
                Order::Desc(field_name.to_string())
            } else {
                Order::Asc(field_name.to_string())
            })
        });

        let search = self.search.filter(|s| !s.trim().is_empty());

        Ok(BookFilter {
            price,
            search,
            order,
        })
    }
}
