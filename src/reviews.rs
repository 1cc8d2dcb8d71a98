use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::db::{self, DbPool};
use crate::error::{DataError, Result};
use crate::model::{NewReview, Review};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewRequest {
    pub user_id: i32,
    pub review_text: String,
    pub rating: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub review_text: String,
    pub rating: i32,
}

#[get("/movies/{movie_id}/reviews")]
pub async fn list_movie_reviews(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let movie_id = path.into_inner();
    let reviews = web::block(move || -> Result<Vec<Review>> {
        let mut conn = pool.get()?;
        db::reviews::get_movie_reviews(&mut conn, movie_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(reviews))
}

#[post("/movies/{movie_id}/reviews")]
pub async fn add_review(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    request: web::Json<AddReviewRequest>,
) -> Result<HttpResponse> {
    let movie_id = path.into_inner();
    let AddReviewRequest {
        user_id,
        review_text,
        rating,
    } = request.into_inner();
    let review = web::block(move || -> Result<Review> {
        let mut conn = pool.get()?;
        db::reviews::add_review(
            &mut conn,
            NewReview {
                user_id,
                movie_id,
                review_text,
                rating,
            },
        )
    })
    .await??;

    Ok(HttpResponse::Created().json(review))
}

#[get("/reviews/{review_id}")]
pub async fn get_review(pool: web::Data<DbPool>, path: web::Path<i32>) -> Result<HttpResponse> {
    let review_id = path.into_inner();
    let review = web::block(move || -> Result<Option<Review>> {
        let mut conn = pool.get()?;
        db::reviews::get_review(&mut conn, review_id)
    })
    .await??
    .ok_or_else(|| DataError::review_not_found(review_id))?;

    Ok(HttpResponse::Ok().json(review))
}

#[put("/reviews/{review_id}")]
pub async fn update_review(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    request: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse> {
    let review_id = path.into_inner();
    let UpdateReviewRequest {
        review_text,
        rating,
    } = request.into_inner();
    let review = web::block(move || -> Result<Review> {
        let mut conn = pool.get()?;
        let mut review = db::reviews::get_review(&mut conn, review_id)?
            .ok_or_else(|| DataError::review_not_found(review_id))?;
        review.review_text = review_text;
        review.rating = rating;
        db::reviews::update_review(&mut conn, &review)?;
        Ok(review)
    })
    .await??;

    Ok(HttpResponse::Ok().json(review))
}

#[delete("/reviews/{review_id}")]
pub async fn delete_review(pool: web::Data<DbPool>, path: web::Path<i32>) -> Result<HttpResponse> {
    let review_id = path.into_inner();
    web::block(move || -> Result<()> {
        let mut conn = pool.get()?;
        db::reviews::delete_review(&mut conn, review_id)
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}
