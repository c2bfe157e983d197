use async_trait::async_trait;
use crate::types::{NewUser, Stock, User, UserRecord};
use crate::Result;

#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Insert a user. Fails with `Error::Conflict` when the email is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<User>;

    /// Look up a user by email, including the stored password hash
    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>>;
}

#[async_trait]
pub trait StockStorage: Send + Sync {
    /// Add a stock to the catalog. Returns the existing row if the name is already known.
    async fn add_stock(&self, name: &str) -> Result<Stock>;

    /// All stocks in the catalog, ordered by id
    async fn all_stocks(&self) -> Result<Vec<Stock>>;

    /// Names of the stocks on a user's watchlist
    async fn user_stocks(&self, email: &str) -> Result<Vec<String>>;

    /// Merge stock ids into a user's watchlist (set union)
    async fn add_user_stocks(&self, email: &str, stock_ids: &[i64]) -> Result<()>;
}

/// A complete backend, owned by the process for its whole lifetime.
#[async_trait]
pub trait Storage: UserStorage + StockStorage {
    /// Release connections on shutdown
    async fn close(&self) {}
}
