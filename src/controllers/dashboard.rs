use chrono::Utc;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::forms::{validate_password, NAME_REGEX};
use crate::auth::{Role, User};
use crate::controllers::util::{
    app_error_page, format_display_date, validation_failed, PageResult,
};
use crate::db;
use crate::error::AppError;
use crate::routes::RouteTable;
use crate::timetable::week_bounds;

/// Role-specific landing page after login.
#[get("/dashboard")]
pub async fn dashboard(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
) -> PageResult {
    match user.role {
        Role::Member => member_dashboard(pool, routes, user).await,
        Role::Trainer => trainer_dashboard(pool, routes, user).await,
        Role::Admin => admin_dashboard(pool, routes, user).await,
    }
}

async fn member_dashboard(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
) -> PageResult {
    let bookings = db::get_booking_details_for_member(pool, user.id)
        .await
        .map_err(|e| app_error_page(&e, "Member dashboard", routes.home))?;

    let now = Utc::now().naive_utc();
    let upcoming: Vec<_> = bookings
        .into_iter()
        .filter(|b| b.session.start >= now)
        .map(|b| {
            serde_json::json!({
                "start_display": format_display_date(b.session.start),
                "booking": b,
            })
        })
        .collect();

    Ok(Template::render(
        "dashboard_member",
        context! {
            title: "Dashboard - High Street Gym",
            upcoming_bookings: upcoming,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

async fn trainer_dashboard(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
) -> PageResult {
    let sessions = db::get_sessions_with_bookings(pool, Some(user.id))
        .await
        .map_err(|e| app_error_page(&e, "Trainer dashboard", routes.home))?;

    let (week_start, week_end) = week_bounds(Utc::now().date_naive());
    let this_week: Vec<_> = sessions
        .into_iter()
        .filter(|s| s.session.start >= week_start && s.session.start < week_end)
        .map(|s| {
            serde_json::json!({
                "session": s.session,
                "start_display": format_display_date(s.session.start),
                "attendee_count": s.attendees.len(),
                "spots_left": s.spots_left(),
            })
        })
        .collect();

    Ok(Template::render(
        "dashboard_trainer",
        context! {
            title: "Dashboard - High Street Gym",
            week_sessions: this_week,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

async fn admin_dashboard(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
) -> PageResult {
    let users = db::get_all_users(pool)
        .await
        .map_err(|e| app_error_page(&e, "Admin dashboard", routes.home))?;
    let bookings = db::get_all_booking_details(pool)
        .await
        .map_err(|e| app_error_page(&e, "Admin dashboard", routes.home))?;
    let activities = db::get_all_activities(pool)
        .await
        .map_err(|e| app_error_page(&e, "Admin dashboard", routes.home))?;
    let locations = db::get_all_locations(pool)
        .await
        .map_err(|e| app_error_page(&e, "Admin dashboard", routes.home))?;
    let posts = db::get_all_microblog_posts(pool)
        .await
        .map_err(|e| app_error_page(&e, "Admin dashboard", routes.home))?;
    let now = Utc::now().naive_utc();
    let upcoming_sessions = db::get_upcoming_session_details(pool, now)
        .await
        .map_err(|e| app_error_page(&e, "Admin dashboard", routes.home))?;

    Ok(Template::render(
        "dashboard_admin",
        context! {
            title: "Dashboard - High Street Gym",
            user_count: users.len(),
            booking_count: bookings.len(),
            activity_count: activities.len(),
            location_count: locations.len(),
            post_count: posts.len(),
            upcoming_session_count: upcoming_sessions.len(),
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

#[derive(FromForm, Validate)]
pub struct AccountForm {
    #[validate(regex(
        path = *NAME_REGEX,
        message = "First name must be 2-50 letters, spaces, hyphens or apostrophes"
    ))]
    pub first_name: String,
    #[validate(regex(
        path = *NAME_REGEX,
        message = "Last name must be 2-50 letters, spaces, hyphens or apostrophes"
    ))]
    pub last_name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    pub password: Option<String>,
}

/// Update the logged-in user's own details. A blank password keeps the
/// current one.
#[post("/dashboard/account", data = "<form>")]
pub async fn update_account(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<AccountForm>,
) -> Result<Redirect, (Status, Template)> {
    if let Err(errors) = form.validate() {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect();
        return Err(validation_failed(&messages, routes.dashboard));
    }

    let password = form.password.as_deref().filter(|p| !p.is_empty());
    if let Some(password) = password {
        if validate_password(password).is_err() {
            return Err(validation_failed(
                &["Password must be at least 8 characters with a digit, an uppercase letter, a lowercase letter and a symbol".to_string()],
                routes.dashboard,
            ));
        }
    }

    match db::ensure_unique_username_email(pool, &user.username, &form.email, Some(user.id)).await {
        Ok(()) => {}
        Err(AppError::Validation(msg)) => {
            return Err(validation_failed(&[msg], routes.dashboard))
        }
        Err(err) => return Err(app_error_page(&err, "Account update", routes.dashboard)),
    }

    db::update_user(
        pool,
        user.id,
        user.role,
        &user.username,
        &form.first_name,
        &form.last_name,
        user.birthday,
        &form.email,
        password,
    )
    .await
    .map_err(|e| app_error_page(&e, "Account update", routes.dashboard))?;

    Ok(Redirect::to(uri!("/dashboard")))
}
