use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;

use crate::auth::{authorize, Role, User};
use crate::controllers::util::{
    app_error_page, forbidden_page, format_display_date, not_found_page, parse_input_datetime,
    validation_failed, PageResult,
};
use crate::db;
use crate::routes::RouteTable;

use super::manage_activities::IdForm;

#[derive(FromForm)]
pub struct SessionForm {
    pub id: Option<i64>,
    pub activity: i64,
    pub trainer: Option<i64>,
    pub location: i64,
    pub start: String,
}

#[derive(FromForm)]
pub struct AttendeeForm {
    pub session: i64,
    pub member: i64,
}

/// Trainers manage their own sessions; admins manage everyone's.
#[get("/manage/session")]
pub async fn list(pool: &State<SqlitePool>, routes: &State<RouteTable>, user: User) -> PageResult {
    let actor =
        authorize(Some(&user), &[Role::Admin, Role::Trainer]).map_err(|_| forbidden_page(routes.home))?;

    let trainer_filter = match actor.role {
        Role::Admin => None,
        _ => Some(actor.id),
    };

    let sessions = db::get_sessions_with_bookings(pool, trainer_filter)
        .await
        .map_err(|e| app_error_page(&e, "Session management", routes.home))?;
    let activities = db::get_all_activities(pool)
        .await
        .map_err(|e| app_error_page(&e, "Session management", routes.home))?;
    let locations = db::get_all_locations(pool)
        .await
        .map_err(|e| app_error_page(&e, "Session management", routes.home))?;
    let trainers = db::get_users_by_role(pool, Role::Trainer)
        .await
        .map_err(|e| app_error_page(&e, "Session management", routes.home))?;
    let members = db::get_users_by_role(pool, Role::Member)
        .await
        .map_err(|e| app_error_page(&e, "Session management", routes.home))?;

    let sessions: Vec<_> = sessions
        .into_iter()
        .map(|s| {
            serde_json::json!({
                "start_display": format_display_date(s.session.start),
                "attendee_count": s.attendees.len(),
                "spots_left": s.spots_left(),
                "session": s.session,
                "attendees": s.attendees,
            })
        })
        .collect();

    Ok(Template::render(
        "session_management",
        context! {
            title: "Session Management - High Street Gym",
            sessions: sessions,
            activities: activities,
            locations: locations,
            trainers: trainers,
            members: members,
            is_admin: user.role == Role::Admin,
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

/// Resolve who the session's trainer should be. Trainers always schedule
/// themselves; admins pick from the trainer list.
async fn resolve_trainer(
    pool: &SqlitePool,
    routes: &RouteTable,
    actor: &User,
    requested: Option<i64>,
) -> Result<i64, (Status, Template)> {
    if actor.role != Role::Admin {
        return Ok(actor.id);
    }

    let trainer = requested.ok_or_else(|| {
        validation_failed(
            &["A trainer must be selected".to_string()],
            routes.manage_sessions,
        )
    })?;

    match db::get_user(pool, trainer).await {
        Ok(target) if target.role == Role::Trainer => Ok(trainer),
        Ok(_) => Err(validation_failed(
            &["Sessions can only be assigned to trainers".to_string()],
            routes.manage_sessions,
        )),
        Err(_) => Err(not_found_page("trainer", routes.manage_sessions)),
    }
}

async fn check_references(
    pool: &SqlitePool,
    routes: &RouteTable,
    activity: i64,
    location: i64,
) -> Result<(), (Status, Template)> {
    if db::get_activity(pool, activity).await.is_err() {
        return Err(not_found_page("activity", routes.manage_sessions));
    }
    if db::get_location(pool, location).await.is_err() {
        return Err(not_found_page("location", routes.manage_sessions));
    }
    Ok(())
}

#[post("/manage/session/create", data = "<form>")]
pub async fn create(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<SessionForm>,
) -> Result<Redirect, (Status, Template)> {
    let actor =
        authorize(Some(&user), &[Role::Admin, Role::Trainer]).map_err(|_| forbidden_page(routes.home))?;

    let start = parse_input_datetime(&form.start).ok_or_else(|| {
        validation_failed(
            &["Start must be a valid date and time".to_string()],
            routes.manage_sessions,
        )
    })?;

    check_references(pool, routes, form.activity, form.location).await?;
    let trainer = resolve_trainer(pool, routes, actor, form.trainer).await?;

    db::create_session(pool, form.activity, trainer, form.location, start)
        .await
        .map_err(|e| app_error_page(&e, "Creating session", routes.manage_sessions))?;

    Ok(Redirect::to(uri!("/manage/session")))
}

#[post("/manage/session/update", data = "<form>")]
pub async fn update(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<SessionForm>,
) -> Result<Redirect, (Status, Template)> {
    let actor =
        authorize(Some(&user), &[Role::Admin, Role::Trainer]).map_err(|_| forbidden_page(routes.home))?;

    let id = match form.id {
        Some(id) => id,
        None => {
            return Err(validation_failed(
                &["Missing session id".to_string()],
                routes.manage_sessions,
            ))
        }
    };

    owned_session(pool, routes, actor, id).await?;

    let start = parse_input_datetime(&form.start).ok_or_else(|| {
        validation_failed(
            &["Start must be a valid date and time".to_string()],
            routes.manage_sessions,
        )
    })?;

    check_references(pool, routes, form.activity, form.location).await?;
    let trainer = resolve_trainer(pool, routes, actor, form.trainer).await?;

    db::update_session(pool, id, form.activity, trainer, form.location, start)
        .await
        .map_err(|e| app_error_page(&e, "Updating session", routes.manage_sessions))?;

    Ok(Redirect::to(uri!("/manage/session")))
}

#[post("/manage/session/delete", data = "<form>")]
pub async fn delete(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<IdForm>,
) -> Result<Redirect, (Status, Template)> {
    let actor =
        authorize(Some(&user), &[Role::Admin, Role::Trainer]).map_err(|_| forbidden_page(routes.home))?;

    owned_session(pool, routes, actor, form.id).await?;

    db::delete_session(pool, form.id)
        .await
        .map_err(|e| app_error_page(&e, "Deleting session", routes.manage_sessions))?;

    Ok(Redirect::to(uri!("/manage/session")))
}

/// Fetch the session and make sure the actor may manage its bookings.
async fn owned_session(
    pool: &SqlitePool,
    routes: &RouteTable,
    actor: &User,
    session: i64,
) -> Result<(), (Status, Template)> {
    let existing = match db::get_session(pool, session).await {
        Ok(session) => session,
        Err(_) => return Err(not_found_page("session", routes.manage_sessions)),
    };

    if actor.role != Role::Admin && existing.trainer != actor.id {
        return Err(forbidden_page(routes.manage_sessions));
    }
    Ok(())
}

async fn check_member(
    pool: &SqlitePool,
    routes: &RouteTable,
    member: i64,
) -> Result<(), (Status, Template)> {
    match db::get_user(pool, member).await {
        Ok(target) if target.role == Role::Member => Ok(()),
        Ok(_) => Err(validation_failed(
            &["Bookings can only be made for members".to_string()],
            routes.manage_sessions,
        )),
        Err(_) => Err(not_found_page("member", routes.manage_sessions)),
    }
}

/// Book a member onto a session from the management page.
#[post("/manage/session/booking/create", data = "<form>")]
pub async fn add_booking(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<AttendeeForm>,
) -> Result<Redirect, (Status, Template)> {
    let actor =
        authorize(Some(&user), &[Role::Admin, Role::Trainer]).map_err(|_| forbidden_page(routes.home))?;

    owned_session(pool, routes, actor, form.session).await?;
    check_member(pool, routes, form.member).await?;

    db::create_booking(pool, form.member, form.session)
        .await
        .map_err(|e| app_error_page(&e, "Adding booking to session", routes.manage_sessions))?;

    Ok(Redirect::to(uri!("/manage/session")))
}

#[post("/manage/session/booking/delete", data = "<form>")]
pub async fn remove_booking(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<AttendeeForm>,
) -> Result<Redirect, (Status, Template)> {
    let actor =
        authorize(Some(&user), &[Role::Admin, Role::Trainer]).map_err(|_| forbidden_page(routes.home))?;

    owned_session(pool, routes, actor, form.session).await?;

    db::delete_booking_by_member_and_session(pool, form.member, form.session)
        .await
        .map_err(|e| app_error_page(&e, "Removing booking from session", routes.manage_sessions))?;

    Ok(Redirect::to(uri!("/manage/session")))
}
