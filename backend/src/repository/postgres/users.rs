use super::PgStore;
use crate::error::RepoResult;
use crate::models::{NewUser, User};
use crate::repository::UserRepository;
use crate::schema::users;
use diesel::prelude::*;

impl UserRepository for PgStore {
    fn insert_user(&self, user: NewUser) -> RepoResult<User> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(users::table)
            .values(&user)
            .get_result::<User>(&mut conn)?)
    }

    fn find_user(&self, id: i32) -> RepoResult<Option<User>> {
        let mut conn = self.conn()?;
        Ok(users::table
            .find(id)
            .first::<User>(&mut conn)
            .optional()?)
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut conn = self.conn()?;
        Ok(users::table
            .filter(users::email.eq(email))
            .first::<User>(&mut conn)
            .optional()?)
    }
}
