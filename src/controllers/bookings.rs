use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::{authorize, Role, User};
use crate::controllers::util::{
    app_error_page, forbidden_page, format_display_date, not_found_page, PageResult,
};
use crate::db;
use crate::models::BookingDetails;
use crate::routes::RouteTable;

#[derive(Serialize)]
struct BookingView {
    booking: BookingDetails,
    start_display: String,
}

impl From<BookingDetails> for BookingView {
    fn from(booking: BookingDetails) -> Self {
        Self {
            start_display: format_display_date(booking.session.start),
            booking,
        }
    }
}

#[derive(FromForm)]
pub struct BookingForm {
    pub session: i64,
}

/// A member's own bookings, soonest first.
#[get("/bookings")]
pub async fn my_bookings(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
) -> PageResult {
    let member = authorize(Some(&user), &[Role::Member])
        .map_err(|_| forbidden_page(routes.home))?;

    let bookings = db::get_booking_details_for_member(pool, member.id)
        .await
        .map_err(|e| app_error_page(&e, "Listing member bookings", routes.home))?;

    Ok(Template::render(
        "bookings",
        context! {
            title: "My Bookings - High Street Gym",
            bookings: bookings.into_iter().map(BookingView::from).collect::<Vec<_>>(),
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

/// Book the logged-in member onto a session.
#[post("/bookings", data = "<form>")]
pub async fn create_booking(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<BookingForm>,
) -> Result<Redirect, (Status, Template)> {
    let member = authorize(Some(&user), &[Role::Member])
        .map_err(|_| forbidden_page(routes.sessions))?;

    // Look the session up first so a bad id reads as "not found" rather
    // than "session full".
    if db::get_session(pool, form.session).await.is_err() {
        return Err(not_found_page("session", routes.sessions));
    }

    db::create_booking(pool, member.id, form.session)
        .await
        .map_err(|e| app_error_page(&e, "Creating booking", routes.sessions))?;

    Ok(Redirect::to(uri!("/bookings")))
}

/// Cancel the logged-in member's booking on a session.
#[post("/bookings/cancel", data = "<form>")]
pub async fn cancel_booking(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<BookingForm>,
) -> Result<Redirect, (Status, Template)> {
    let member = authorize(Some(&user), &[Role::Member])
        .map_err(|_| forbidden_page(routes.home))?;

    db::delete_booking_by_member_and_session(pool, member.id, form.session)
        .await
        .map_err(|e| app_error_page(&e, "Cancelling booking", routes.bookings))?;

    Ok(Redirect::to(uri!("/bookings")))
}
