use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper,
    SqliteConnection,
};
use validator::Validate;

use crate::db::Added;
use crate::error::{DataError, Result};
use crate::model::{NewUser, User};
use crate::schema::{user_favorite_movies, users};

/// Inserts a user unless the email is already registered, in which case the
/// stored user is returned as `Added::Existing` and nothing is written.
pub fn add_user(conn: &mut SqliteConnection, new_user: NewUser) -> Result<Added<User>> {
    let new_user = NewUser {
        name: new_user.name.trim().to_string(),
        email: normalize_email(&new_user.email),
    };
    new_user.validate()?;

    if let Some(existing) = get_user_by_email(conn, &new_user.email)? {
        log::info!("Email {} already registered to user {}", existing.email, existing.id);
        return Ok(Added::Existing(existing));
    }

    let inserted = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(DataError::from);

    match inserted {
        Ok(user) => {
            log::info!("Created user {} <{}>", user.id, user.email);
            Ok(Added::Created(user))
        }
        Err(DataError::Conflict(_)) => {
            log::warn!("Concurrent insert for {}, returning stored user", new_user.email);
            get_user_by_email(conn, &new_user.email)?
                .map(Added::Existing)
                .ok_or_else(|| DataError::Conflict(format!("email {}", new_user.email)))
        }
        Err(e) => Err(e),
    }
}

pub fn get_user(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<User>> {
    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

pub fn get_user_by_email(conn: &mut SqliteConnection, email: &str) -> Result<Option<User>> {
    let user = users::table
        .filter(users::email.eq(normalize_email(email)))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

pub fn list_users(conn: &mut SqliteConnection) -> Result<Vec<User>> {
    let all = users::table
        .order(users::id.asc())
        .select(User::as_select())
        .load(conn)?;
    Ok(all)
}

/// Removes the user and their favorite rows. Movies they added and reviews
/// they wrote stay in place. Unknown ids are a no-op.
pub fn delete_user(conn: &mut SqliteConnection, user_id: i32) -> Result<()> {
    conn.immediate_transaction::<_, DataError, _>(|conn| {
        let favorites = diesel::delete(
            user_favorite_movies::table.filter(user_favorite_movies::user_id.eq(user_id)),
        )
        .execute(conn)?;
        let deleted = diesel::delete(users::table.find(user_id)).execute(conn)?;
        if deleted > 0 {
            log::info!("Deleted user {} and {} favorite rows", user_id, favorites);
        }
        Ok(())
    })
    .map_err(|e| {
        log::error!("Rolled back delete of user {}: {}", user_id, e);
        e
    })
}

/// Trims the address and lowercases its domain. The local part is kept as given.
fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Helper shared by the other data modules.
pub(crate) fn require_user(conn: &mut SqliteConnection, user_id: i32) -> Result<User> {
    get_user(conn, user_id)?.ok_or_else(|| DataError::user_not_found(user_id))
}
