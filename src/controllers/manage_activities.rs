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
use crate::models::{normalize_capacity, quantize_hours_to_minutes};
use crate::routes::RouteTable;

#[derive(FromForm)]
pub struct ActivityForm {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub capacity: Option<i64>,
    pub duration_hours: Option<f64>,
}

#[derive(FromForm)]
pub struct IdForm {
    pub id: i64,
}

#[get("/manage/activity")]
pub async fn list(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
) -> PageResult {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let activities = db::get_all_activities(pool)
        .await
        .map_err(|e| app_error_page(&e, "Activity management", routes.home))?;

    Ok(Template::render(
        "activity_management",
        context! {
            title: "Activity Management - High Street Gym",
            activities: activities,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

#[post("/manage/activity/create", data = "<form>")]
pub async fn create(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<ActivityForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let name = form.name.trim();
    if name.is_empty() {
        return Err(validation_failed(
            &["Activity name is required".to_string()],
            routes.manage_activities,
        ));
    }

    let capacity = normalize_capacity(form.capacity);
    let duration_minutes = quantize_hours_to_minutes(form.duration_hours.unwrap_or(1.0));

    db::create_activity(pool, name, form.description.trim(), capacity, duration_minutes)
        .await
        .map_err(|e| app_error_page(&e, "Creating activity", routes.manage_activities))?;

    Ok(Redirect::to(uri!("/manage/activity")))
}

#[post("/manage/activity/update", data = "<form>")]
pub async fn update(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<ActivityForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let id = match form.id {
        Some(id) => id,
        None => {
            return Err(validation_failed(
                &["Missing activity id".to_string()],
                routes.manage_activities,
            ))
        }
    };

    if db::get_activity(pool, id).await.is_err() {
        return Err(not_found_page("activity", routes.manage_activities));
    }

    let name = form.name.trim();
    if name.is_empty() {
        return Err(validation_failed(
            &["Activity name is required".to_string()],
            routes.manage_activities,
        ));
    }

    let capacity = normalize_capacity(form.capacity);
    let duration_minutes = quantize_hours_to_minutes(form.duration_hours.unwrap_or(1.0));

    db::update_activity(pool, id, name, form.description.trim(), capacity, duration_minutes)
        .await
        .map_err(|e| app_error_page(&e, "Updating activity", routes.manage_activities))?;

    Ok(Redirect::to(uri!("/manage/activity")))
}

#[post("/manage/activity/delete", data = "<form>")]
pub async fn delete(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<IdForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    db::delete_activity(pool, form.id)
        .await
        .map_err(|e| app_error_page(&e, "Deleting activity", routes.manage_activities))?;

    Ok(Redirect::to(uri!("/manage/activity")))
}
