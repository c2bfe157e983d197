use async_trait::async_trait;
use sn_core::{Error, NewUser, Result, Stock, StockStorage, Storage, User, UserRecord, UserStorage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::info;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stocks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        stock TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_stocks (
        user_id INTEGER NOT NULL REFERENCES users(id),
        stock_id INTEGER NOT NULL REFERENCES stocks(id),
        PRIMARY KEY (user_id, stock_id)
    )
    "#,
    // Add future migrations here
];

fn db_error(context: &str, e: sqlx::Error) -> Error {
    Error::Database(format!("{}: {}", context, e))
}

pub struct SQLiteStorage {
    pool: SqlitePool,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_error(&format!("Failed to run migration {}", i), e))?;
        }
        info!(path = %db_path.display(), "SQLite storage ready");

        Ok(Self { pool })
    }

    async fn user_id(&self, email: &str) -> Result<i64> {
        sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to look up user", e))?
            .map(|row| row.get::<i64, _>("id"))
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl UserStorage for SQLiteStorage {
    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .map_or(false, |db| db.is_unique_violation());
                if duplicate {
                    Error::Conflict("Email already exists. Try logging in.".to_string())
                } else {
                    db_error("Failed to create user", e)
                }
            })?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: user.name.clone(),
            email: user.email.clone(),
        })
    }

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, name, email, password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to get user", e))?;

        Ok(row.map(|row| UserRecord {
            user: User {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
            },
            password_hash: row.get("password"),
        }))
    }
}

#[async_trait]
impl StockStorage for SQLiteStorage {
    async fn add_stock(&self, name: &str) -> Result<Stock> {
        sqlx::query("INSERT OR IGNORE INTO stocks (stock) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to add stock", e))?;

        let row = sqlx::query("SELECT id, stock FROM stocks WHERE stock = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read stock", e))?;

        Ok(Stock {
            id: row.get("id"),
            stock: row.get("stock"),
        })
    }

    async fn all_stocks(&self) -> Result<Vec<Stock>> {
        let rows = sqlx::query("SELECT id, stock FROM stocks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list stocks", e))?;

        Ok(rows
            .into_iter()
            .map(|row| Stock {
                id: row.get("id"),
                stock: row.get("stock"),
            })
            .collect())
    }

    async fn user_stocks(&self, email: &str) -> Result<Vec<String>> {
        let user_id = self.user_id(email).await?;
        let rows = sqlx::query(
            r#"
            SELECT s.stock FROM stocks s
            JOIN user_stocks us ON us.stock_id = s.id
            WHERE us.user_id = ?
            ORDER BY s.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get user stocks", e))?;

        Ok(rows.into_iter().map(|row| row.get("stock")).collect())
    }

    async fn add_user_stocks(&self, email: &str, stock_ids: &[i64]) -> Result<()> {
        let user_id = self.user_id(email).await?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;

        // Unknown stock ids select no row and are dropped.
        for stock_id in stock_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO user_stocks (user_id, stock_id) SELECT ?, id FROM stocks WHERE id = ?",
            )
            .bind(user_id)
            .bind(stock_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to add user stock", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit user stocks", e))
    }
}

#[async_trait]
impl Storage for SQLiteStorage {
    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::conformance;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_users() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        conformance::users(&storage).await;
    }

    #[tokio::test]
    async fn test_sqlite_stocks() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        conformance::stocks(&storage).await;
    }

    #[tokio::test]
    async fn test_sqlite_reopen_keeps_data() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        storage.add_stock("Acme").await.unwrap();
        storage.close().await;

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        assert_eq!(storage.all_stocks().await.unwrap()[0].stock, "Acme");
    }
}
