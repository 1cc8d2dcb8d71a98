use actix_web::{delete, get, post, web, HttpResponse};
use serde::Serialize;

use crate::db::{self, Added, DbPool, FavoriteOutcome};
use crate::error::{DataError, Result};
use crate::model::{Movie, NewUser, User};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedResponse<T> {
    pub created: bool,
    pub data: T,
}

/// 201 for a fresh row, 200 when the add resolved to an existing one.
pub fn added_response<T: Serialize>(added: Added<T>) -> HttpResponse {
    let created = added.is_created();
    let body = AddedResponse {
        created,
        data: added.into_inner(),
    };
    if created {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub user_id: i32,
    pub movie_id: i32,
    pub outcome: FavoriteOutcome,
}

#[post("/users")]
pub async fn add_user(
    pool: web::Data<DbPool>,
    new_user: web::Json<NewUser>,
) -> Result<HttpResponse> {
    let added = web::block(move || -> Result<Added<User>> {
        let mut conn = pool.get()?;
        db::users::add_user(&mut conn, new_user.into_inner())
    })
    .await??;

    Ok(added_response(added))
}

#[get("/users")]
pub async fn list_users(pool: web::Data<DbPool>) -> Result<HttpResponse> {
    let users = web::block(move || -> Result<Vec<User>> {
        let mut conn = pool.get()?;
        db::users::list_users(&mut conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(users))
}

#[get("/users/{user_id}")]
pub async fn get_user(pool: web::Data<DbPool>, path: web::Path<i32>) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let user = web::block(move || -> Result<Option<User>> {
        let mut conn = pool.get()?;
        db::users::get_user(&mut conn, user_id)
    })
    .await??
    .ok_or_else(|| DataError::user_not_found(user_id))?;

    Ok(HttpResponse::Ok().json(user))
}

#[delete("/users/{user_id}")]
pub async fn delete_user(pool: web::Data<DbPool>, path: web::Path<i32>) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    web::block(move || -> Result<()> {
        let mut conn = pool.get()?;
        db::users::delete_user(&mut conn, user_id)
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}

#[get("/users/{user_id}/favorites")]
pub async fn list_favorites(pool: web::Data<DbPool>, path: web::Path<i32>) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let favorites = web::block(move || -> Result<Vec<Movie>> {
        let mut conn = pool.get()?;
        db::favorites::get_user_favorite_movies(&mut conn, user_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(favorites))
}

#[post("/users/{user_id}/favorites/{movie_id}")]
pub async fn add_favorite(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (user_id, movie_id) = path.into_inner();
    let outcome = web::block(move || -> Result<FavoriteOutcome> {
        let mut conn = pool.get()?;
        db::favorites::add_favorite_movie(&mut conn, user_id, movie_id)
    })
    .await??;

    let body = FavoriteResponse {
        user_id,
        movie_id,
        outcome,
    };
    Ok(match outcome {
        FavoriteOutcome::Added => HttpResponse::Created().json(body),
        FavoriteOutcome::AlreadyFavorited => HttpResponse::Ok().json(body),
    })
}
