use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, Role, User, UserSession};
use crate::error::AppError;
use crate::models::{
    Activity, Booking, BookingDetails, DbActivity, DbBooking, DbBookingDetailsRow, DbGymSession,
    DbLocation, DbMicroblog, DbMicroblogPostRow, DbSessionDetailsRow, GymSession, Location,
    Microblog, MicroblogPost, SessionDetails, SessionWithBookings,
};
use crate::timetable::WeekSessionRow;

const USER_COLUMNS: &str = "id, role, username, first_name, last_name, birthday, email";

const SESSION_DETAIL_COLUMNS: &str = "s.id AS s_id, s.start AS s_start, \
     a.id AS a_id, a.name AS a_name, a.description AS a_description, \
     a.capacity AS a_capacity, a.duration_minutes AS a_duration_minutes, \
     t.id AS t_id, t.role AS t_role, t.username AS t_username, \
     t.first_name AS t_first_name, t.last_name AS t_last_name, \
     t.birthday AS t_birthday, t.email AS t_email, \
     l.id AS l_id, l.name AS l_name, l.description AS l_description, \
     l.address AS l_address, l.availability AS l_availability";

const SESSION_DETAIL_JOINS: &str = "FROM sessions s \
     INNER JOIN activities a ON a.id = s.activity \
     INNER JOIN users t ON t.id = s.trainer \
     INNER JOIN locations l ON l.id = s.location";

// ---------------------------------------------------------------------------
// Users

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query_as::<_, DbUser>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_all_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Fetching all users");
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY last_name, first_name");
    let rows = sqlx::query_as::<_, DbUser>(&sql).fetch_all(pool).await?;

    Ok(rows.into_iter().map(User::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_users_by_role(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<User>, AppError> {
    info!("Fetching users by role");
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(role) = ? ORDER BY last_name, first_name"
    );
    let rows = sqlx::query_as::<_, DbUser>(&sql)
        .bind(role.as_str())
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

/// Reject a username or email already taken by a different user. Pass the
/// user's own id when updating so their current values don't collide with
/// themselves.
#[instrument(skip(pool))]
pub async fn ensure_unique_username_email(
    pool: &Pool<Sqlite>,
    username: &str,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let exclude = exclude_id.unwrap_or(-1);

    let username_taken =
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE LOWER(username) = LOWER(?) AND id != ?")
            .bind(username)
            .bind(exclude)
            .fetch_optional(pool)
            .await?;
    if username_taken.is_some() {
        return Err(AppError::Validation("Username is already taken".to_string()));
    }

    let email_taken =
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE LOWER(email) = LOWER(?) AND id != ?")
            .bind(email)
            .bind(exclude)
            .fetch_optional(pool)
            .await?;
    if email_taken.is_some() {
        return Err(AppError::Validation("Email is already in use".to_string()));
    }

    Ok(())
}

#[instrument(skip(pool, password))]
#[allow(clippy::too_many_arguments)]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    role: Role,
    username: &str,
    first_name: &str,
    last_name: &str,
    birthday: Option<NaiveDate>,
    email: &str,
    password: &str,
) -> Result<i64, AppError> {
    info!("Creating user");
    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query(
        "INSERT INTO users (role, username, first_name, last_name, birthday, email, password)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(role.as_str())
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(birthday)
    .bind(email.to_lowercase())
    .bind(hashed_password)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Self-service registration always creates a member.
pub async fn register_member(
    pool: &Pool<Sqlite>,
    username: &str,
    first_name: &str,
    last_name: &str,
    birthday: Option<NaiveDate>,
    email: &str,
    password: &str,
) -> Result<i64, AppError> {
    create_user(
        pool,
        Role::Member,
        username,
        first_name,
        last_name,
        birthday,
        email,
        password,
    )
    .await
}

/// Update a user's record. A `None` password keeps the stored hash.
#[instrument(skip(pool, password))]
#[allow(clippy::too_many_arguments)]
pub async fn update_user(
    pool: &Pool<Sqlite>,
    id: i64,
    role: Role,
    username: &str,
    first_name: &str,
    last_name: &str,
    birthday: Option<NaiveDate>,
    email: &str,
    password: Option<&str>,
) -> Result<(), AppError> {
    info!("Updating user");
    ensure_unique_username_email(pool, username, email, Some(id)).await?;
    let email = email.to_lowercase();

    match password {
        Some(password) if !password.is_empty() => {
            let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
            sqlx::query(
                "UPDATE users
                 SET role = ?, username = ?, first_name = ?, last_name = ?,
                     birthday = ?, email = ?, password = ?
                 WHERE id = ?",
            )
            .bind(role.as_str())
            .bind(username)
            .bind(first_name)
            .bind(last_name)
            .bind(birthday)
            .bind(email)
            .bind(hashed_password)
            .bind(id)
            .execute(pool)
            .await?;
        }
        _ => {
            sqlx::query(
                "UPDATE users
                 SET role = ?, username = ?, first_name = ?, last_name = ?,
                     birthday = ?, email = ?
                 WHERE id = ?",
            )
            .bind(role.as_str())
            .bind(username)
            .bind(first_name)
            .bind(last_name)
            .bind(birthday)
            .bind(email)
            .bind(id)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

/// Removes the user along with their bookings and login sessions.
#[instrument(skip(pool))]
pub async fn delete_user(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting user");
    sqlx::query("DELETE FROM bookings WHERE member = ?")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool, password))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    info!("Authenticating user");

    #[derive(sqlx::FromRow)]
    struct Credentials {
        id: i64,
        password: String,
    }

    let row = sqlx::query_as::<_, Credentials>(
        "SELECT id, password FROM users WHERE LOWER(username) = LOWER(?)",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let credentials = row.ok_or_else(|| {
        AppError::Authentication(format!("No user named {}", username))
    })?;

    if bcrypt::verify(password, &credentials.password)? {
        get_user(pool, credentials.id).await
    } else {
        Err(AppError::Authentication(format!(
            "Bad password for {}",
            username
        )))
    }
}

// ---------------------------------------------------------------------------
// Login sessions

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating login session");
    let res = sqlx::query("INSERT INTO user_sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    let row = sqlx::query_as::<_, UserSession>(
        "SELECT id, user_id, token, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::Authentication("Unknown session token".to_string()))
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating login session");
    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    let now = Utc::now().naive_utc();
    let res = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    if res.rows_affected() > 0 {
        info!(count = res.rows_affected(), "Removed expired login sessions");
    }
    Ok(res.rows_affected())
}

// ---------------------------------------------------------------------------
// Activities

#[instrument(skip(pool))]
pub async fn get_all_activities(pool: &Pool<Sqlite>) -> Result<Vec<Activity>, AppError> {
    info!("Fetching all activities");
    let rows = sqlx::query_as::<_, DbActivity>(
        "SELECT id, name, description, capacity, duration_minutes FROM activities ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Activity::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_activity(pool: &Pool<Sqlite>, id: i64) -> Result<Activity, AppError> {
    let row = sqlx::query_as::<_, DbActivity>(
        "SELECT id, name, description, capacity, duration_minutes FROM activities WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(activity) => Ok(Activity::from(activity)),
        _ => Err(AppError::NotFound(format!(
            "Activity with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn create_activity(
    pool: &Pool<Sqlite>,
    name: &str,
    description: &str,
    capacity: i64,
    duration_minutes: i64,
) -> Result<i64, AppError> {
    info!("Creating activity");
    let res = sqlx::query(
        "INSERT INTO activities (name, description, capacity, duration_minutes) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(capacity)
    .bind(duration_minutes)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn update_activity(
    pool: &Pool<Sqlite>,
    id: i64,
    name: &str,
    description: &str,
    capacity: i64,
    duration_minutes: i64,
) -> Result<(), AppError> {
    info!("Updating activity");
    sqlx::query(
        "UPDATE activities SET name = ?, description = ?, capacity = ?, duration_minutes = ? WHERE id = ?",
    )
    .bind(name)
    .bind(description)
    .bind(capacity)
    .bind(duration_minutes)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_activity(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting activity");
    sqlx::query("DELETE FROM activities WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Locations

#[instrument(skip(pool))]
pub async fn get_all_locations(pool: &Pool<Sqlite>) -> Result<Vec<Location>, AppError> {
    info!("Fetching all locations");
    let rows = sqlx::query_as::<_, DbLocation>(
        "SELECT id, name, description, address, availability FROM locations ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Location::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_location(pool: &Pool<Sqlite>, id: i64) -> Result<Location, AppError> {
    let row = sqlx::query_as::<_, DbLocation>(
        "SELECT id, name, description, address, availability FROM locations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(location) => Ok(Location::from(location)),
        _ => Err(AppError::NotFound(format!(
            "Location with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn create_location(
    pool: &Pool<Sqlite>,
    name: &str,
    description: &str,
    address: &str,
    availability: &str,
) -> Result<i64, AppError> {
    info!("Creating location");
    let res = sqlx::query(
        "INSERT INTO locations (name, description, address, availability) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(address)
    .bind(availability)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn update_location(
    pool: &Pool<Sqlite>,
    id: i64,
    name: &str,
    description: &str,
    address: &str,
    availability: &str,
) -> Result<(), AppError> {
    info!("Updating location");
    sqlx::query(
        "UPDATE locations SET name = ?, description = ?, address = ?, availability = ? WHERE id = ?",
    )
    .bind(name)
    .bind(description)
    .bind(address)
    .bind(availability)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_location(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting location");
    sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Sessions

#[instrument(skip(pool))]
pub async fn get_session(pool: &Pool<Sqlite>, id: i64) -> Result<GymSession, AppError> {
    let row = sqlx::query_as::<_, DbGymSession>(
        "SELECT id, activity, trainer, location, start FROM sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(session) => Ok(GymSession::from(session)),
        _ => Err(AppError::NotFound(format!(
            "Session with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn create_session(
    pool: &Pool<Sqlite>,
    activity: i64,
    trainer: i64,
    location: i64,
    start: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating session");
    let res =
        sqlx::query("INSERT INTO sessions (activity, trainer, location, start) VALUES (?, ?, ?, ?)")
            .bind(activity)
            .bind(trainer)
            .bind(location)
            .bind(start)
            .execute(pool)
            .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn update_session(
    pool: &Pool<Sqlite>,
    id: i64,
    activity: i64,
    trainer: i64,
    location: i64,
    start: NaiveDateTime,
) -> Result<(), AppError> {
    info!("Updating session");
    sqlx::query("UPDATE sessions SET activity = ?, trainer = ?, location = ?, start = ? WHERE id = ?")
        .bind(activity)
        .bind(trainer)
        .bind(location)
        .bind(start)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Removes the session and every booking made against it.
#[instrument(skip(pool))]
pub async fn delete_session(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting session");
    sqlx::query("DELETE FROM bookings WHERE session = ?")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Upcoming sessions with their activity, trainer and location, soonest
/// first. `from` is normally "now"; tests pin it.
#[instrument(skip(pool))]
pub async fn get_upcoming_session_details(
    pool: &Pool<Sqlite>,
    from: NaiveDateTime,
) -> Result<Vec<SessionDetails>, AppError> {
    info!("Fetching upcoming sessions");
    let sql = format!(
        "SELECT {SESSION_DETAIL_COLUMNS} {SESSION_DETAIL_JOINS} WHERE s.start >= ? ORDER BY s.start, s.id"
    );
    let rows = sqlx::query_as::<_, DbSessionDetailsRow>(&sql)
        .bind(from)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(SessionDetails::from).collect())
}

/// Session starts and activity names within a half-open week window, for
/// the timetable grid.
#[instrument(skip(pool))]
pub async fn get_week_sessions(
    pool: &Pool<Sqlite>,
    week_start: NaiveDateTime,
    week_end: NaiveDateTime,
) -> Result<Vec<WeekSessionRow>, AppError> {
    let rows = sqlx::query_as::<_, WeekSessionRow>(
        "SELECT s.start AS start, a.name AS activity_name
         FROM sessions s
         INNER JOIN activities a ON a.id = s.activity
         WHERE s.start >= ? AND s.start < ?
         ORDER BY s.start",
    )
    .bind(week_start)
    .bind(week_end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[derive(sqlx::FromRow)]
struct DbSessionBookingRow {
    #[sqlx(flatten)]
    session: DbSessionDetailsRow,
    m_id: Option<i64>,
    m_role: Option<String>,
    m_username: Option<String>,
    m_first_name: Option<String>,
    m_last_name: Option<String>,
    m_birthday: Option<NaiveDate>,
    m_email: Option<String>,
}

fn group_session_booking_rows(rows: Vec<DbSessionBookingRow>) -> Vec<SessionWithBookings> {
    let mut grouped: Vec<SessionWithBookings> = Vec::new();

    for row in rows {
        let attendee = row.m_id.map(|id| User {
            id,
            role: row
                .m_role
                .as_deref()
                .and_then(|r| Role::from_str(r).ok())
                .unwrap_or(Role::Member),
            username: row.m_username.clone().unwrap_or_default(),
            first_name: row.m_first_name.clone().unwrap_or_default(),
            last_name: row.m_last_name.clone().unwrap_or_default(),
            birthday: row.m_birthday,
            email: row.m_email.clone().unwrap_or_default(),
        });

        let session_id = row.session.s_id.unwrap_or_default();
        match grouped.last_mut() {
            Some(last) if last.session.id == session_id => {
                if let Some(attendee) = attendee {
                    last.attendees.push(attendee);
                }
            }
            _ => grouped.push(SessionWithBookings {
                session: SessionDetails::from(row.session),
                attendees: attendee.into_iter().collect(),
            }),
        }
    }

    grouped
}

/// Sessions with the members booked onto each, optionally restricted to one
/// trainer (trainers only see their own sessions).
#[instrument(skip(pool))]
pub async fn get_sessions_with_bookings(
    pool: &Pool<Sqlite>,
    trainer: Option<i64>,
) -> Result<Vec<SessionWithBookings>, AppError> {
    info!("Fetching sessions with bookings");
    let filter = match trainer {
        Some(_) => "WHERE s.trainer = ?",
        None => "",
    };
    let sql = format!(
        "SELECT {SESSION_DETAIL_COLUMNS}, \
         m.id AS m_id, m.role AS m_role, m.username AS m_username, \
         m.first_name AS m_first_name, m.last_name AS m_last_name, \
         m.birthday AS m_birthday, m.email AS m_email \
         {SESSION_DETAIL_JOINS} \
         LEFT JOIN bookings b ON b.session = s.id \
         LEFT JOIN users m ON m.id = b.member \
         {filter} ORDER BY s.start, s.id, b.id"
    );

    let mut query = sqlx::query_as::<_, DbSessionBookingRow>(&sql);
    if let Some(trainer) = trainer {
        query = query.bind(trainer);
    }
    let rows = query.fetch_all(pool).await?;

    Ok(group_session_booking_rows(rows))
}

// ---------------------------------------------------------------------------
// Bookings

/// Insert a booking only while the session still has space. The capacity
/// check and the insert are one statement, so two racing requests can never
/// both land in the last spot: whichever commits second matches no row.
#[instrument(skip(pool))]
pub async fn create_booking(
    pool: &Pool<Sqlite>,
    member: i64,
    session: i64,
) -> Result<i64, AppError> {
    info!("Creating booking");
    let res = sqlx::query(
        "INSERT INTO bookings (member, session)
         SELECT ?, s.id
         FROM sessions s
         INNER JOIN activities a ON a.id = s.activity
         LEFT JOIN bookings b ON b.session = s.id
         WHERE s.id = ?
         GROUP BY s.id, a.capacity
         HAVING COUNT(b.id) < a.capacity",
    )
    .bind(member)
    .bind(session)
    .execute(pool)
    .await;

    match res {
        Ok(res) if res.rows_affected() == 0 => Err(AppError::SessionFull),
        Ok(res) => Ok(res.last_insert_rowid()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::AlreadyBooked)
        }
        Err(err) => Err(err.into()),
    }
}

/// Rebooking goes through the same guarded insert: create the replacement
/// first, and only then drop the old row. An unchanged member/session pair
/// is a no-op rather than a spurious `AlreadyBooked`.
#[instrument(skip(pool))]
pub async fn update_booking(
    pool: &Pool<Sqlite>,
    booking_id: i64,
    member: i64,
    session: i64,
) -> Result<i64, AppError> {
    info!("Updating booking");
    let existing = get_booking(pool, booking_id).await?;

    if existing.member == member && existing.session == session {
        return Ok(booking_id);
    }

    let new_id = create_booking(pool, member, session).await?;
    delete_booking(pool, booking_id).await?;

    Ok(new_id)
}

#[instrument(skip(pool))]
pub async fn get_booking(pool: &Pool<Sqlite>, id: i64) -> Result<Booking, AppError> {
    let row = sqlx::query_as::<_, DbBooking>("SELECT id, member, session FROM bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(booking) => Ok(Booking::from(booking)),
        _ => Err(AppError::NotFound(format!(
            "Booking with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn delete_booking(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting booking");
    sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Cancel a member's booking on a session. Reports not-found when there was
/// nothing to cancel.
#[instrument(skip(pool))]
pub async fn delete_booking_by_member_and_session(
    pool: &Pool<Sqlite>,
    member: i64,
    session: i64,
) -> Result<(), AppError> {
    info!("Cancelling booking");
    let res = sqlx::query("DELETE FROM bookings WHERE member = ? AND session = ?")
        .bind(member)
        .bind(session)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "No booking for member {} on session {}",
            member, session
        )));
    }

    Ok(())
}

const BOOKING_DETAIL_COLUMNS: &str = "b.id AS b_id, \
     m.id AS m_id, m.role AS m_role, m.username AS m_username, \
     m.first_name AS m_first_name, m.last_name AS m_last_name, \
     m.birthday AS m_birthday, m.email AS m_email";

const BOOKING_DETAIL_JOINS: &str = "FROM bookings b \
     INNER JOIN users m ON m.id = b.member \
     INNER JOIN sessions s ON s.id = b.session \
     INNER JOIN activities a ON a.id = s.activity \
     INNER JOIN users t ON t.id = s.trainer \
     INNER JOIN locations l ON l.id = s.location";

#[instrument(skip(pool))]
pub async fn get_all_booking_details(pool: &Pool<Sqlite>) -> Result<Vec<BookingDetails>, AppError> {
    info!("Fetching all bookings");
    let sql = format!(
        "SELECT {BOOKING_DETAIL_COLUMNS}, {SESSION_DETAIL_COLUMNS} {BOOKING_DETAIL_JOINS} ORDER BY s.start, b.id"
    );
    let rows = sqlx::query_as::<_, DbBookingDetailsRow>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(BookingDetails::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_booking_details_for_member(
    pool: &Pool<Sqlite>,
    member: i64,
) -> Result<Vec<BookingDetails>, AppError> {
    info!("Fetching member bookings");
    let sql = format!(
        "SELECT {BOOKING_DETAIL_COLUMNS}, {SESSION_DETAIL_COLUMNS} {BOOKING_DETAIL_JOINS} \
         WHERE b.member = ? ORDER BY s.start, b.id"
    );
    let rows = sqlx::query_as::<_, DbBookingDetailsRow>(&sql)
        .bind(member)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(BookingDetails::from).collect())
}

// ---------------------------------------------------------------------------
// Microblogs

#[instrument(skip(pool))]
pub async fn get_all_microblog_posts(pool: &Pool<Sqlite>) -> Result<Vec<MicroblogPost>, AppError> {
    info!("Fetching microblog feed");
    let rows = sqlx::query_as::<_, DbMicroblogPostRow>(
        "SELECT mb.id, mb.user, mb.upload_time, mb.title, mb.content,
                u.first_name AS u_first_name, u.last_name AS u_last_name
         FROM microblogs mb
         INNER JOIN users u ON u.id = mb.user
         ORDER BY mb.upload_time DESC, mb.id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MicroblogPost::from).collect())
}

#[instrument(skip(pool))]
pub async fn create_microblog(
    pool: &Pool<Sqlite>,
    user: i64,
    title: &str,
    content: &str,
) -> Result<i64, AppError> {
    info!("Creating microblog post");
    let now = Utc::now().naive_utc();
    let res =
        sqlx::query("INSERT INTO microblogs (user, upload_time, title, content) VALUES (?, ?, ?, ?)")
            .bind(user)
            .bind(now)
            .bind(title)
            .bind(content)
            .execute(pool)
            .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_microblog(pool: &Pool<Sqlite>, id: i64) -> Result<Microblog, AppError> {
    let row = sqlx::query_as::<_, DbMicroblog>(
        "SELECT id, user, upload_time, title, content FROM microblogs WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(blog) => Ok(Microblog::from(blog)),
        _ => Err(AppError::NotFound(format!(
            "Microblog post with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn delete_microblog(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting microblog post");
    sqlx::query("DELETE FROM microblogs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
