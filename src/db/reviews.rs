use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper,
    SqliteConnection,
};
use validator::Validate;

use crate::db::movies::{get_movie, require_movie};
use crate::db::users::require_user;
use crate::error::{DataError, Result};
use crate::model::{NewReview, Review};
use crate::schema::reviews;

pub fn add_review(conn: &mut SqliteConnection, new_review: NewReview) -> Result<Review> {
    new_review.validate()?;
    require_user(conn, new_review.user_id)?;
    require_movie(conn, new_review.movie_id)?;

    let review = diesel::insert_into(reviews::table)
        .values(&new_review)
        .returning(Review::as_returning())
        .get_result(conn)?;
    log::info!(
        "User {} reviewed movie {} ({}/10)",
        review.user_id,
        review.movie_id,
        review.rating
    );
    Ok(review)
}

/// Persists the text and rating of a previously fetched review.
pub fn update_review(conn: &mut SqliteConnection, review: &Review) -> Result<()> {
    review.validate()?;

    let updated = diesel::update(reviews::table.find(review.id))
        .set((
            reviews::review_text.eq(&review.review_text),
            reviews::rating.eq(review.rating),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(DataError::review_not_found(review.id));
    }
    log::info!("Updated review {}", review.id);
    Ok(())
}

/// Unknown ids are a no-op.
pub fn delete_review(conn: &mut SqliteConnection, review_id: i32) -> Result<()> {
    let deleted = diesel::delete(reviews::table.find(review_id)).execute(conn)?;
    if deleted > 0 {
        log::info!("Deleted review {}", review_id);
    }
    Ok(())
}

pub fn get_review(conn: &mut SqliteConnection, review_id: i32) -> Result<Option<Review>> {
    let review = reviews::table
        .find(review_id)
        .select(Review::as_select())
        .first(conn)
        .optional()?;
    Ok(review)
}

/// Reviews of a live movie; empty when the movie is gone.
pub fn get_movie_reviews(conn: &mut SqliteConnection, movie_id: i32) -> Result<Vec<Review>> {
    if get_movie(conn, movie_id)?.is_none() {
        return Ok(Vec::new());
    }

    let movie_reviews = reviews::table
        .filter(reviews::movie_id.eq(movie_id))
        .order(reviews::id.asc())
        .select(Review::as_select())
        .load(conn)?;
    Ok(movie_reviews)
}
