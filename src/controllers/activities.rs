use chrono::Utc;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;

use crate::auth::User;
use crate::controllers::util::{app_error_page, PageResult};
use crate::db;
use crate::routes::RouteTable;
use crate::timetable::{build_timetable, week_bounds, DAY_NAMES};

/// Public activity list with this week's timetable grid.
#[get("/activities")]
pub async fn activities(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: Option<User>,
) -> PageResult {
    let activities = db::get_all_activities(pool)
        .await
        .map_err(|e| app_error_page(&e, "Listing activities", routes.home))?;

    let (week_start, week_end) = week_bounds(Utc::now().date_naive());
    let week_sessions = db::get_week_sessions(pool, week_start, week_end)
        .await
        .map_err(|e| app_error_page(&e, "Loading weekly timetable", routes.home))?;
    let timetable = build_timetable(
        activities.iter().map(|a| a.name.as_str()),
        &week_sessions,
    );

    Ok(Template::render(
        "activities",
        context! {
            title: "Activities - High Street Gym",
            activities: activities,
            day_names: DAY_NAMES,
            timetable: timetable,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}
