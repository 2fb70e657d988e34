//! PostgreSQL persistence for the payment ledger.
//!
//! The adapter only translates between Diesel rows and domain types; the
//! schema lives in `backend/migrations` and is applied by operators.
//!
//! ```ignore
//! use payment_gateway::outbound::persistence::{DbPool, DieselTransactionStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/payments")).await?;
//! let store = DieselTransactionStore::new(pool);
//! ```

mod diesel_transaction_store;
mod models;
mod pool;
mod schema;

pub use diesel_transaction_store::DieselTransactionStore;
pub use pool::{DbPool, PoolConfig, PoolError};
