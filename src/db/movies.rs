use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper,
    SqliteConnection,
};
use validator::Validate;

use crate::catalog::MovieMetadata;
use crate::db::users::require_user;
use crate::db::{favorites, Added};
use crate::error::{DataError, Result};
use crate::model::{Movie, MovieUpdate, NewMovie};
use crate::schema::movies;

/// Stores a movie for `user_id` under the canonical title carried by
/// `metadata`. A movie with the same canonical title already in the user's
/// collection is returned as `Added::Existing` instead of being duplicated.
///
/// A blank `genre` falls back to the first genre listed in the metadata. The
/// insert and the orphaned-favorites sweep that follows it commit together.
pub fn add_movie(
    conn: &mut SqliteConnection,
    user_id: i32,
    metadata: &MovieMetadata,
    genre: Option<&str>,
) -> Result<Added<Movie>> {
    let genre = genre
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .or_else(|| metadata.primary_genre());
    let new_movie = NewMovie {
        title: metadata.title.trim(),
        genre,
        user_id,
    };
    new_movie.validate()?;

    conn.immediate_transaction::<_, DataError, _>(|conn| {
        require_user(conn, user_id)?;

        let existing = movies::table
            .filter(movies::user_id.eq(user_id))
            .filter(movies::title.eq(new_movie.title))
            .select(Movie::as_select())
            .first(conn)
            .optional()?;
        if let Some(existing) = existing {
            log::info!(
                "Movie '{}' is already in the collection of user {}",
                existing.title,
                user_id
            );
            return Ok(Added::Existing(existing));
        }

        let movie = diesel::insert_into(movies::table)
            .values(&new_movie)
            .returning(Movie::as_returning())
            .get_result(conn)?;
        log::info!("Added movie {} '{}' for user {}", movie.id, movie.title, user_id);

        favorites::delete_orphaned_favorites(conn)?;
        Ok(Added::Created(movie))
    })
    .map_err(|e| {
        log::error!("Rolled back add of '{}' for user {}: {}", metadata.title, user_id, e);
        e
    })
}

/// Overwrites title and genre of a movie owned by `user_id`.
pub fn update_movie(
    conn: &mut SqliteConnection,
    user_id: i32,
    movie_id: i32,
    update: MovieUpdate,
) -> Result<Movie> {
    let update = MovieUpdate {
        title: update.title.trim().to_string(),
        genre: update
            .genre
            .map(|genre| genre.trim().to_string())
            .filter(|genre| !genre.is_empty()),
    };
    update.validate()?;

    conn.immediate_transaction::<_, DataError, _>(|conn| {
        require_user(conn, user_id)?;
        require_owned_movie(conn, user_id, movie_id)?;

        let movie = diesel::update(movies::table.find(movie_id))
            .set(&update)
            .returning(Movie::as_returning())
            .get_result(conn)?;
        log::info!("Updated movie {} for user {}", movie_id, user_id);
        Ok(movie)
    })
}

/// Deletes a movie by id. Its reviews are left in place and its favorite rows
/// are removed by the next sweep. Unknown ids are a no-op.
pub fn delete_movie(conn: &mut SqliteConnection, movie_id: i32) -> Result<()> {
    let deleted = diesel::delete(movies::table.find(movie_id)).execute(conn)?;
    if deleted > 0 {
        log::info!("Deleted movie {}", movie_id);
    }
    Ok(())
}

/// Deletes `movie_id` on behalf of `user_id`. An unknown id is a no-op; a
/// movie owned by someone else is refused with `NotOwner`.
pub fn delete_owned_movie(
    conn: &mut SqliteConnection,
    user_id: i32,
    movie_id: i32,
) -> Result<()> {
    conn.immediate_transaction::<_, DataError, _>(|conn| {
        match get_movie(conn, movie_id)? {
            Some(movie) if movie.user_id != user_id => {
                Err(DataError::NotOwner { user_id, movie_id })
            }
            _ => delete_movie(conn, movie_id),
        }
    })
}

pub fn get_movie(conn: &mut SqliteConnection, movie_id: i32) -> Result<Option<Movie>> {
    let movie = movies::table
        .find(movie_id)
        .select(Movie::as_select())
        .first(conn)
        .optional()?;
    Ok(movie)
}

pub fn get_user_movies(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<Movie>> {
    let user_movies = movies::table
        .filter(movies::user_id.eq(user_id))
        .order(movies::id.asc())
        .select(Movie::as_select())
        .load(conn)?;
    Ok(user_movies)
}

pub(crate) fn require_movie(conn: &mut SqliteConnection, movie_id: i32) -> Result<Movie> {
    get_movie(conn, movie_id)?.ok_or_else(|| DataError::movie_not_found(movie_id))
}

pub(crate) fn require_owned_movie(
    conn: &mut SqliteConnection,
    user_id: i32,
    movie_id: i32,
) -> Result<Movie> {
    let movie = require_movie(conn, movie_id)?;
    if movie.user_id != user_id {
        return Err(DataError::NotOwner { user_id, movie_id });
    }
    Ok(movie)
}
