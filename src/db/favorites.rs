use diesel::{
    BoolExpressionMethods, ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper,
    SqliteConnection,
};

use crate::db::movies::require_movie;
use crate::db::users::require_user;
use crate::db::FavoriteOutcome;
use crate::error::{DataError, Result};
use crate::model::{FavoriteMovie, Movie};
use crate::schema::{movies, user_favorite_movies, users};

/// Marks `movie_id` as a favorite of `user_id`. Linking an already linked pair
/// reports `AlreadyFavorited` and leaves the table untouched.
pub fn add_favorite_movie(
    conn: &mut SqliteConnection,
    user_id: i32,
    movie_id: i32,
) -> Result<FavoriteOutcome> {
    require_user(conn, user_id)?;
    require_movie(conn, movie_id)?;

    let inserted = diesel::insert_into(user_favorite_movies::table)
        .values(&FavoriteMovie { user_id, movie_id })
        .execute(conn)
        .map_err(DataError::from);

    match inserted {
        Ok(_) => {
            log::info!("User {} favorited movie {}", user_id, movie_id);
            Ok(FavoriteOutcome::Added)
        }
        Err(DataError::Conflict(_)) => {
            log::info!("Movie {} is already a favorite of user {}", movie_id, user_id);
            Ok(FavoriteOutcome::AlreadyFavorited)
        }
        Err(e) => Err(e),
    }
}

pub fn get_user_favorite_movies(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<Movie>> {
    let favorites = movies::table
        .inner_join(user_favorite_movies::table)
        .filter(user_favorite_movies::user_id.eq(user_id))
        .order(movies::id.asc())
        .select(Movie::as_select())
        .load(conn)?;
    Ok(favorites)
}

/// Deletes every favorite row whose user or movie no longer exists and returns
/// how many were removed. All-or-nothing: a failure rolls the sweep back.
pub fn sweep_orphaned_favorites(conn: &mut SqliteConnection) -> Result<usize> {
    conn.immediate_transaction::<_, DataError, _>(delete_orphaned_favorites)
        .map_err(|e| {
            log::error!("Orphaned favorites sweep rolled back: {}", e);
            e
        })
}

/// Sweep body for callers that already hold a write transaction.
pub(crate) fn delete_orphaned_favorites(conn: &mut SqliteConnection) -> Result<usize> {
    let removed = diesel::delete(
        user_favorite_movies::table.filter(
            user_favorite_movies::user_id
                .ne_all(users::table.select(users::id))
                .or(user_favorite_movies::movie_id.ne_all(movies::table.select(movies::id))),
        ),
    )
    .execute(conn)?;
    if removed > 0 {
        log::info!("Swept {} orphaned favorite rows", removed);
    }
    Ok(removed)
}
