use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use env_logger::Env;

mod catalog;
mod config;
mod db;
mod error;
mod model;
mod movies;
mod reviews;
mod schema;
mod users;

use crate::catalog::{MetadataLookup, OmdbClient};
use crate::config::Settings;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = Settings::load().context("Failed to load configuration")?;

    let pool = db::build_pool(&settings.database).context("Failed to create pool")?;
    {
        let mut conn = pool.get()?;
        db::init_schema(&mut conn)?;
        log::info!("Schema ready in {}", settings.database.url);
    }

    let lookup: Arc<dyn MetadataLookup> = Arc::new(OmdbClient::new(&settings.omdb)?);
    let lookup = web::Data::from(lookup);

    log::info!(
        "Listening on {}:{}",
        settings.server.host,
        settings.server.port
    );
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(lookup.clone())
            .configure(configure)
    })
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await?;

    Ok(())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(users::add_user)
            .service(users::list_users)
            .service(users::get_user)
            .service(users::delete_user)
            .service(users::list_favorites)
            .service(users::add_favorite)
            .service(movies::list_user_movies)
            .service(movies::add_movie)
            .service(movies::update_movie)
            .service(movies::delete_movie)
            .service(reviews::list_movie_reviews)
            .service(reviews::add_review)
            .service(reviews::get_review)
            .service(reviews::update_review)
            .service(reviews::delete_review),
    )
    .service(web::scope("/api").service(movies::movie_details));
}
