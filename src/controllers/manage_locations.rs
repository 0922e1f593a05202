use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;

use crate::auth::{authorize, Role, User};
use crate::controllers::util::{
    app_error_page, forbidden_page, not_found_page, validation_failed, PageResult,
};
use crate::db;
use crate::routes::RouteTable;

use super::manage_activities::IdForm;

#[derive(FromForm)]
pub struct LocationForm {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub address: String,
    pub availability: String,
}

#[get("/manage/location")]
pub async fn list(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
) -> PageResult {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let locations = db::get_all_locations(pool)
        .await
        .map_err(|e| app_error_page(&e, "Location management", routes.home))?;

    Ok(Template::render(
        "location_management",
        context! {
            title: "Location Management - High Street Gym",
            locations: locations,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

#[post("/manage/location/create", data = "<form>")]
pub async fn create(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<LocationForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let name = form.name.trim();
    if name.is_empty() {
        return Err(validation_failed(
            &["Location name is required".to_string()],
            routes.manage_locations,
        ));
    }

    db::create_location(
        pool,
        name,
        form.description.trim(),
        form.address.trim(),
        form.availability.trim(),
    )
    .await
    .map_err(|e| app_error_page(&e, "Creating location", routes.manage_locations))?;

    Ok(Redirect::to(uri!("/manage/location")))
}

#[post("/manage/location/update", data = "<form>")]
pub async fn update(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<LocationForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let id = match form.id {
        Some(id) => id,
        None => {
            return Err(validation_failed(
                &["Missing location id".to_string()],
                routes.manage_locations,
            ))
        }
    };

    if db::get_location(pool, id).await.is_err() {
        return Err(not_found_page("location", routes.manage_locations));
    }

    let name = form.name.trim();
    if name.is_empty() {
        return Err(validation_failed(
            &["Location name is required".to_string()],
            routes.manage_locations,
        ));
    }

    db::update_location(
        pool,
        id,
        name,
        form.description.trim(),
        form.address.trim(),
        form.availability.trim(),
    )
    .await
    .map_err(|e| app_error_page(&e, "Updating location", routes.manage_locations))?;

    Ok(Redirect::to(uri!("/manage/location")))
}

#[post("/manage/location/delete", data = "<form>")]
pub async fn delete(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<IdForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    db::delete_location(pool, form.id)
        .await
        .map_err(|e| app_error_page(&e, "Deleting location", routes.manage_locations))?;

    Ok(Redirect::to(uri!("/manage/location")))
}
