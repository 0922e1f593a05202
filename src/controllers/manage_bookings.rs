use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;

use crate::auth::{authorize, Role, User};
use crate::controllers::util::{
    app_error_page, forbidden_page, format_display_date, not_found_page, validation_failed,
    PageResult,
};
use crate::db;
use crate::routes::RouteTable;

use super::manage_activities::IdForm;

#[derive(FromForm)]
pub struct ManageBookingForm {
    pub id: Option<i64>,
    pub member: i64,
    pub session: i64,
}

#[get("/manage/booking")]
pub async fn list(pool: &State<SqlitePool>, routes: &State<RouteTable>, user: User) -> PageResult {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let bookings = db::get_all_booking_details(pool)
        .await
        .map_err(|e| app_error_page(&e, "Booking management", routes.home))?;
    let members = db::get_users_by_role(pool, Role::Member)
        .await
        .map_err(|e| app_error_page(&e, "Booking management", routes.home))?;
    let sessions = db::get_upcoming_session_details(pool, chrono::Utc::now().naive_utc())
        .await
        .map_err(|e| app_error_page(&e, "Booking management", routes.home))?;

    let bookings: Vec<_> = bookings
        .into_iter()
        .map(|b| {
            serde_json::json!({
                "start_display": format_display_date(b.session.start),
                "booking": b,
            })
        })
        .collect();

    Ok(Template::render(
        "booking_management",
        context! {
            title: "Booking Management - High Street Gym",
            bookings: bookings,
            members: members,
            sessions: sessions,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

/// Validate the target user actually holds the member role; bookings only
/// belong to members.
async fn check_member(
    pool: &SqlitePool,
    routes: &RouteTable,
    member: i64,
) -> Result<(), (Status, Template)> {
    match db::get_user(pool, member).await {
        Ok(target) if target.role == Role::Member => Ok(()),
        Ok(_) => Err(validation_failed(
            &["Bookings can only be made for members".to_string()],
            routes.manage_bookings,
        )),
        Err(_) => Err(not_found_page("member", routes.manage_bookings)),
    }
}

#[post("/manage/booking/create", data = "<form>")]
pub async fn create(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<ManageBookingForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    check_member(pool, routes, form.member).await?;
    if db::get_session(pool, form.session).await.is_err() {
        return Err(not_found_page("session", routes.manage_bookings));
    }

    db::create_booking(pool, form.member, form.session)
        .await
        .map_err(|e| app_error_page(&e, "Creating booking (admin)", routes.manage_bookings))?;

    Ok(Redirect::to(uri!("/manage/booking")))
}

#[post("/manage/booking/update", data = "<form>")]
pub async fn update(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<ManageBookingForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let id = match form.id {
        Some(id) => id,
        None => {
            return Err(validation_failed(
                &["Missing booking id".to_string()],
                routes.manage_bookings,
            ))
        }
    };

    check_member(pool, routes, form.member).await?;
    if db::get_session(pool, form.session).await.is_err() {
        return Err(not_found_page("session", routes.manage_bookings));
    }

    db::update_booking(pool, id, form.member, form.session)
        .await
        .map_err(|e| app_error_page(&e, "Updating booking (admin)", routes.manage_bookings))?;

    Ok(Redirect::to(uri!("/manage/booking")))
}

#[post("/manage/booking/delete", data = "<form>")]
pub async fn delete(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<IdForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    if db::get_booking(pool, form.id).await.is_err() {
        return Err(not_found_page("booking", routes.manage_bookings));
    }

    db::delete_booking(pool, form.id)
        .await
        .map_err(|e| app_error_page(&e, "Deleting booking (admin)", routes.manage_bookings))?;

    Ok(Redirect::to(uri!("/manage/booking")))
}
