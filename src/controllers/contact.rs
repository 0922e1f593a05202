use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;

use crate::auth::User;
use crate::controllers::util::{app_error_page, PageResult};
use crate::db;
use crate::routes::RouteTable;

/// Contact page listing every gym location and its availability.
#[get("/contact")]
pub async fn contact(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: Option<User>,
) -> PageResult {
    let locations = db::get_all_locations(pool)
        .await
        .map_err(|e| app_error_page(&e, "Contact page", routes.home))?;

    Ok(Template::render(
        "contact",
        context! {
            title: "Contact - High Street Gym",
            locations: locations,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}
