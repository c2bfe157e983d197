use async_trait::async_trait;
use sn_core::{Error, NewUser, Result, Stock, StockStorage, Storage, User, UserRecord, UserStorage};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Vec<UserRecord>,
    stocks: Vec<Stock>,
    watchlists: HashMap<i64, BTreeSet<i64>>,
}

impl MemoryStore {
    fn user_id(&self, email: &str) -> Result<i64> {
        self.users
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| r.user.id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }
}

/// Process-local storage, lost on exit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStorage for InMemoryStorage {
    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        let mut store = self.store.write().await;
        if store.users.iter().any(|r| r.user.email == user.email) {
            return Err(Error::Conflict("Email already exists. Try logging in.".to_string()));
        }
        let created = User {
            id: store.users.len() as i64 + 1,
            name: user.name.clone(),
            email: user.email.clone(),
        };
        store.users.push(UserRecord {
            user: created.clone(),
            password_hash: user.password_hash.clone(),
        });
        Ok(created)
    }

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|r| r.user.email == email).cloned())
    }
}

#[async_trait]
impl StockStorage for InMemoryStorage {
    async fn add_stock(&self, name: &str) -> Result<Stock> {
        let mut store = self.store.write().await;
        if let Some(existing) = store.stocks.iter().find(|s| s.stock == name) {
            return Ok(existing.clone());
        }
        let stock = Stock {
            id: store.stocks.len() as i64 + 1,
            stock: name.to_string(),
        };
        store.stocks.push(stock.clone());
        Ok(stock)
    }

    async fn all_stocks(&self) -> Result<Vec<Stock>> {
        Ok(self.store.read().await.stocks.clone())
    }

    async fn user_stocks(&self, email: &str) -> Result<Vec<String>> {
        let store = self.store.read().await;
        let user_id = store.user_id(email)?;
        let Some(ids) = store.watchlists.get(&user_id) else {
            return Ok(vec![]);
        };
        Ok(store
            .stocks
            .iter()
            .filter(|s| ids.contains(&s.id))
            .map(|s| s.stock.clone())
            .collect())
    }

    async fn add_user_stocks(&self, email: &str, stock_ids: &[i64]) -> Result<()> {
        let mut store = self.store.write().await;
        let user_id = store.user_id(email)?;
        let known: Vec<i64> = stock_ids
            .iter()
            .copied()
            .filter(|id| store.stocks.iter().any(|s| s.id == *id))
            .collect();
        store.watchlists.entry(user_id).or_default().extend(known);
        Ok(())
    }
}

impl Storage for InMemoryStorage {}
