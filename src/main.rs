#[macro_use]
extern crate rocket;
#[macro_use]
extern crate tracing;

mod auth;
mod controllers;
mod db;
mod env;
mod error;
mod models;
mod routes;
mod telemetry;
#[cfg(test)]
mod test;
mod timetable;

use rocket::{tokio, Build, Rocket};
use rocket_dyn_templates::Template;
use sqlx::SqlitePool;

use db::clean_expired_sessions;
use routes::RouteTable;
use telemetry::{init_tracing, TelemetryFairing};

#[launch]
async fn rocket() -> _ {
    init_tracing();

    if let Err(e) = env::load_environment() {
        warn!("Failed to load environment files: {}", e);
    }

    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired login sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired login sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting High Street Gym");

    rocket::build()
        .manage(pool)
        .manage(RouteTable::new())
        .mount(
            "/",
            routes![
                controllers::pages::home,
                controllers::pages::about,
                controllers::pages::privacy,
                controllers::pages::terms,
                controllers::activities::activities,
                controllers::sessions::sessions,
                controllers::bookings::my_bookings,
                controllers::bookings::create_booking,
                controllers::bookings::cancel_booking,
                controllers::contact::contact,
                controllers::microblogs::feed,
                controllers::microblogs::create_post,
                controllers::microblogs::delete_post,
                controllers::dashboard::dashboard,
                controllers::dashboard::update_account,
                controllers::manage_activities::list,
                controllers::manage_activities::create,
                controllers::manage_activities::update,
                controllers::manage_activities::delete,
                controllers::manage_locations::list,
                controllers::manage_locations::create,
                controllers::manage_locations::update,
                controllers::manage_locations::delete,
                controllers::manage_users::list,
                controllers::manage_users::create,
                controllers::manage_users::update,
                controllers::manage_users::delete,
                controllers::manage_bookings::list,
                controllers::manage_bookings::create,
                controllers::manage_bookings::update,
                controllers::manage_bookings::delete,
                controllers::manage_sessions::list,
                controllers::manage_sessions::create,
                controllers::manage_sessions::update,
                controllers::manage_sessions::delete,
                controllers::manage_sessions::add_booking,
                controllers::manage_sessions::remove_booking,
                auth::forms::login,
                auth::forms::process_login,
                auth::forms::logout,
                auth::forms::register,
                auth::forms::process_register,
            ],
        )
        .register(
            "/",
            catchers![
                auth::authentication::unauthorized,
                auth::authentication::forbidden,
                controllers::pages::not_found,
                controllers::pages::unprocessable,
                controllers::pages::internal_error,
            ],
        )
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
