pub mod auth;
pub mod error;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use storage::{StockStorage, Storage, UserStorage};
pub use types::{ApiResponse, Headline, NewUser, Stock, StockNews, User, UserRecord};
