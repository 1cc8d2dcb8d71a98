use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Insertable, Validate)]
#[diesel(table_name = users)]
pub struct NewUser {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = movies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub genre: Option<String>,
    pub user_id: i32,
}

#[derive(Debug, Insertable, Validate)]
#[diesel(table_name = movies)]
pub struct NewMovie<'a> {
    #[validate(length(min = 1, max = 100))]
    pub title: &'a str,
    #[validate(length(max = 50))]
    pub genre: Option<&'a str>,
    pub user_id: i32,
}

/// Title and genre overwrite applied by `update_movie`. A `None` genre clears it.
#[derive(Debug, Clone, Deserialize, AsChangeset, Validate)]
#[diesel(table_name = movies)]
#[diesel(treat_none_as_null = true)]
pub struct MovieUpdate {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 50))]
    pub genre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Validate)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub review_text: String,
    #[validate(range(min = 0, max = 10))]
    pub rating: i32,
}

#[derive(Debug, Clone, Deserialize, Insertable, Validate)]
#[diesel(table_name = reviews)]
pub struct NewReview {
    pub user_id: i32,
    pub movie_id: i32,
    pub review_text: String,
    #[validate(range(min = 0, max = 10))]
    pub rating: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_favorite_movies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FavoriteMovie {
    pub user_id: i32,
    pub movie_id: i32,
}
