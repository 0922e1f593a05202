use chrono::Utc;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::User;
use crate::controllers::util::{app_error_page, format_display_date, time_until, PageResult};
use crate::db;
use crate::models::SessionDetails;
use crate::routes::RouteTable;

#[derive(Serialize)]
struct SessionView {
    session: SessionDetails,
    start_display: String,
    starts_in: String,
}

impl From<SessionDetails> for SessionView {
    fn from(session: SessionDetails) -> Self {
        Self {
            start_display: format_display_date(session.start),
            starts_in: time_until(session.start),
            session,
        }
    }
}

/// Upcoming sessions, soonest first, optionally filtered by activity or
/// location.
#[get("/sessions?<activity>&<location>")]
pub async fn sessions(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: Option<User>,
    activity: Option<i64>,
    location: Option<i64>,
) -> PageResult {
    let now = Utc::now().naive_utc();
    let mut upcoming = db::get_upcoming_session_details(pool, now)
        .await
        .map_err(|e| app_error_page(&e, "Listing sessions", routes.home))?;

    if let Some(activity) = activity {
        upcoming.retain(|s| s.activity.id == activity);
    }
    if let Some(location) = location {
        upcoming.retain(|s| s.location.id == location);
    }

    let activities = db::get_all_activities(pool)
        .await
        .map_err(|e| app_error_page(&e, "Listing sessions", routes.home))?;
    let locations = db::get_all_locations(pool)
        .await
        .map_err(|e| app_error_page(&e, "Listing sessions", routes.home))?;

    Ok(Template::render(
        "sessions",
        context! {
            title: "Sessions - High Street Gym",
            sessions: upcoming.into_iter().map(SessionView::from).collect::<Vec<_>>(),
            activities: activities,
            locations: locations,
            selected_activity: activity,
            selected_location: location,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}
