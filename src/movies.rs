use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{self, MetadataLookup};
use crate::db::{self, Added, DbPool};
use crate::error::{DataError, Result};
use crate::model::{Movie, MovieUpdate};
use crate::users::added_response;

#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    pub title: String,
    #[serde(default)]
    pub genre: Option<String>,
}

/// Resolves `title` through the catalog and stores the canonical result for
/// `user_id`. The user is checked before the catalog is contacted.
pub async fn add_movie_from_catalog(
    pool: &DbPool,
    lookup: &dyn MetadataLookup,
    user_id: i32,
    title: &str,
    genre: Option<String>,
) -> Result<Added<Movie>> {
    let check_pool = pool.clone();
    let exists = web::block(move || -> Result<bool> {
        let mut conn = check_pool.get()?;
        Ok(db::users::get_user(&mut conn, user_id)?.is_some())
    })
    .await??;
    if !exists {
        return Err(DataError::user_not_found(user_id));
    }

    let metadata = lookup.lookup(title).await?;

    let pool = pool.clone();
    let added = web::block(move || -> Result<Added<Movie>> {
        let mut conn = pool.get()?;
        db::movies::add_movie(&mut conn, user_id, &metadata, genre.as_deref())
    })
    .await??;
    Ok(added)
}

#[get("/users/{user_id}/movies")]
pub async fn list_user_movies(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let movies = web::block(move || -> Result<Vec<Movie>> {
        let mut conn = pool.get()?;
        db::movies::get_user_movies(&mut conn, user_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(movies))
}

#[post("/users/{user_id}/movies")]
pub async fn add_movie(
    pool: web::Data<DbPool>,
    lookup: web::Data<dyn MetadataLookup>,
    path: web::Path<i32>,
    request: web::Json<AddMovieRequest>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let AddMovieRequest { title, genre } = request.into_inner();
    let added =
        add_movie_from_catalog(pool.get_ref(), lookup.get_ref(), user_id, &title, genre).await?;

    Ok(added_response(added))
}

#[put("/users/{user_id}/movies/{movie_id}")]
pub async fn update_movie(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    update: web::Json<MovieUpdate>,
) -> Result<HttpResponse> {
    let (user_id, movie_id) = path.into_inner();
    let movie = web::block(move || -> Result<Movie> {
        let mut conn = pool.get()?;
        db::movies::update_movie(&mut conn, user_id, movie_id, update.into_inner())
    })
    .await??;

    Ok(HttpResponse::Ok().json(movie))
}

#[delete("/users/{user_id}/movies/{movie_id}")]
pub async fn delete_movie(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (user_id, movie_id) = path.into_inner();
    web::block(move || -> Result<()> {
        let mut conn = pool.get()?;
        db::movies::delete_owned_movie(&mut conn, user_id, movie_id)
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}

#[get("/movie_details/{movie_name}")]
pub async fn movie_details(
    lookup: web::Data<dyn MetadataLookup>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let movie_name = path.into_inner();
    match catalog::movie_details(lookup.get_ref(), &movie_name).await? {
        Some(metadata) => Ok(HttpResponse::Ok().json(metadata)),
        None => Ok(HttpResponse::NotFound().json(json!({ "error": "Movie not found in OMDb" }))),
    }
}
