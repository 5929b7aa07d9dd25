//! SQLite connection wrapper (lightweight for CLI and batch usage).

use crate::db::initialize::init_db;
use crate::errors::AppResult;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    /// Open the database file with foreign keys enforced.
    pub fn new(path: &str) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Open the database and bring its schema up to date.
    pub fn open_initialized(path: &str) -> AppResult<Self> {
        let pool = Self::new(path)?;
        init_db(&pool.conn)?;
        Ok(pool)
    }

    /// Run `func` inside a single transaction: committed on `Ok`, rolled back
    /// (on drop) on `Err`. The write lock is taken up front, so everything
    /// `func` reads stays current until the commit.
    pub fn with_transaction<F, T>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction) -> AppResult<T>,
    {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = func(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
