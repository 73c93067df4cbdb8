//! diesel/PostgreSQL implementation of the repository traits.

use super::StoreHealth;
use crate::db::DbPool;
use crate::error::RepoResult;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};

mod automations;
mod notifications;
mod projects;
mod reports;
mod tasks;
mod users;

type PgConn = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepoResult<PgConn> {
        Ok(self.pool.get()?)
    }
}

impl StoreHealth for PgStore {
    fn ping(&self) -> RepoResult<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }
}
