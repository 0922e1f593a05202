use chrono::{NaiveDateTime, Utc};
use rocket::http::Status;
use rocket_dyn_templates::{context, Template};

use crate::error::AppError;
use crate::routes::NamedRoute;
use crate::timetable::format_time_12h;

/// A page handler either renders its view or falls back to a status page
/// with the matching HTTP code.
pub type PageResult = Result<Template, (Status, Template)>;

/// Render the shared status template with a "return to X" link.
pub fn render_status(
    status: Status,
    heading: &str,
    message: &str,
    back: NamedRoute,
) -> (Status, Template) {
    (
        status,
        Template::render(
            "status",
            context! {
                title: heading,
                heading: heading,
                message: message,
                route_name: back.name,
                route_path: back.path,
            },
        ),
    )
}

pub fn validation_failed(messages: &[String], back: NamedRoute) -> (Status, Template) {
    render_status(
        Status::BadRequest,
        "Invalid input",
        &messages.join(" "),
        back,
    )
}

pub fn not_found_page(what: &str, back: NamedRoute) -> (Status, Template) {
    render_status(
        Status::NotFound,
        "Not found",
        &format!("That {} does not exist.", what),
        back,
    )
}

pub fn forbidden_page(back: NamedRoute) -> (Status, Template) {
    render_status(
        Status::Forbidden,
        "Forbidden",
        "You do not have access to this page.",
        back,
    )
}

pub fn server_error(back: NamedRoute) -> (Status, Template) {
    render_status(
        Status::InternalServerError,
        "Something went wrong",
        "An unexpected error occurred. Please try again later.",
        back,
    )
}

/// Turn a domain error into the right status page. Logs the error against
/// `ctx` on the way through.
pub fn app_error_page(err: &AppError, ctx: &str, back: NamedRoute) -> (Status, Template) {
    err.log_and_record(ctx);
    match err {
        AppError::Validation(msg) => {
            render_status(Status::BadRequest, "Invalid input", msg, back)
        }
        AppError::NotFound(_) => render_status(
            Status::NotFound,
            "Not found",
            "The record you asked for does not exist.",
            back,
        ),
        AppError::SessionFull => render_status(
            Status::Conflict,
            "Session full",
            "That session has no spots left. Pick another time.",
            back,
        ),
        AppError::AlreadyBooked => render_status(
            Status::Conflict,
            "Already booked",
            "You already have a booking for that session.",
            back,
        ),
        AppError::Authorization(_) => forbidden_page(back),
        AppError::Authentication(_) => render_status(
            Status::Unauthorized,
            "Not logged in",
            "Please log in to continue.",
            back,
        ),
        AppError::Database(_) | AppError::Internal(_) => server_error(back),
    }
}

/// "Mon 10 Jun 2024, 9:00 AM"
pub fn format_display_date(dt: NaiveDateTime) -> String {
    format!(
        "{}, {}",
        dt.format("%a %-d %b %Y"),
        format_time_12h(dt.time())
    )
}

/// Rough distance to a future start, for session listings.
pub fn time_until(dt: NaiveDateTime) -> String {
    time_until_from(Utc::now().naive_utc(), dt)
}

pub fn time_until_from(now: NaiveDateTime, dt: NaiveDateTime) -> String {
    let delta = dt - now;
    if delta.num_seconds() < 0 {
        return "already started".to_string();
    }
    let days = delta.num_days();
    let hours = delta.num_hours();
    let minutes = delta.num_minutes();
    if days >= 1 {
        format!("in {} day{}", days, if days == 1 { "" } else { "s" })
    } else if hours >= 1 {
        format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else {
        format!("in {} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    }
}

/// Parse the value of an `<input type="datetime-local">`.
pub fn parse_input_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
