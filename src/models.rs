use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::auth::{Role, User};

pub const DEFAULT_CAPACITY: i64 = 6;
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// A class the gym offers. Duration is stored as whole minutes and exposed
/// to forms and views as hours.
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub capacity: i64,
    pub duration_hours: f64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbActivity {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i64>,
    pub duration_minutes: Option<i64>,
}

impl From<DbActivity> for Activity {
    fn from(activity: DbActivity) -> Self {
        Self {
            id: activity.id.unwrap_or_default(),
            name: activity.name.unwrap_or_default(),
            description: activity.description.unwrap_or_default(),
            capacity: activity.capacity.unwrap_or(DEFAULT_CAPACITY),
            duration_hours: activity.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES) as f64
                / 60.0,
        }
    }
}

/// Round a duration entered in hours to the nearest quarter hour, in
/// minutes. Nonsense input falls back to one hour.
pub fn quantize_hours_to_minutes(hours: f64) -> i64 {
    if !hours.is_finite() || hours <= 0.0 {
        return DEFAULT_DURATION_MINUTES;
    }
    let quarters = (hours * 4.0).round() as i64;
    if quarters < 1 {
        15
    } else {
        quarters * 15
    }
}

/// Capacity must be a positive whole number; anything else gets the default.
pub fn normalize_capacity(capacity: Option<i64>) -> i64 {
    match capacity {
        Some(c) if c > 0 => c,
        _ => DEFAULT_CAPACITY,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub address: String,
    pub availability: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbLocation {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub availability: Option<String>,
}

impl From<DbLocation> for Location {
    fn from(location: DbLocation) -> Self {
        Self {
            id: location.id.unwrap_or_default(),
            name: location.name.unwrap_or_default(),
            description: location.description.unwrap_or_default(),
            address: location.address.unwrap_or_default(),
            availability: location.availability.unwrap_or_default(),
        }
    }
}

/// A scheduled occurrence of an activity, run by one trainer at one location.
#[derive(Debug, Clone, Serialize)]
pub struct GymSession {
    pub id: i64,
    pub activity: i64,
    pub trainer: i64,
    pub location: i64,
    pub start: NaiveDateTime,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbGymSession {
    pub id: Option<i64>,
    pub activity: Option<i64>,
    pub trainer: Option<i64>,
    pub location: Option<i64>,
    pub start: Option<NaiveDateTime>,
}

impl From<DbGymSession> for GymSession {
    fn from(session: DbGymSession) -> Self {
        Self {
            id: session.id.unwrap_or_default(),
            activity: session.activity.unwrap_or_default(),
            trainer: session.trainer.unwrap_or_default(),
            location: session.location.unwrap_or_default(),
            start: session.start.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: i64,
    pub member: i64,
    pub session: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbBooking {
    pub id: Option<i64>,
    pub member: Option<i64>,
    pub session: Option<i64>,
}

impl From<DbBooking> for Booking {
    fn from(booking: DbBooking) -> Self {
        Self {
            id: booking.id.unwrap_or_default(),
            member: booking.member.unwrap_or_default(),
            session: booking.session.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Microblog {
    pub id: i64,
    pub user: i64,
    pub upload_time: NaiveDateTime,
    pub title: String,
    pub content: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbMicroblog {
    pub id: Option<i64>,
    pub user: Option<i64>,
    pub upload_time: Option<NaiveDateTime>,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<DbMicroblog> for Microblog {
    fn from(blog: DbMicroblog) -> Self {
        Self {
            id: blog.id.unwrap_or_default(),
            user: blog.user.unwrap_or_default(),
            upload_time: blog.upload_time.unwrap_or_default(),
            title: blog.title.unwrap_or_default(),
            content: blog.content.unwrap_or_default(),
        }
    }
}

/// A microblog post joined with its author, for the public feed.
#[derive(Debug, Clone, Serialize)]
pub struct MicroblogPost {
    pub blog: Microblog,
    pub author_name: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbMicroblogPostRow {
    pub id: Option<i64>,
    pub user: Option<i64>,
    pub upload_time: Option<NaiveDateTime>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub u_first_name: Option<String>,
    pub u_last_name: Option<String>,
}

impl From<DbMicroblogPostRow> for MicroblogPost {
    fn from(row: DbMicroblogPostRow) -> Self {
        Self {
            author_name: format!(
                "{} {}",
                row.u_first_name.clone().unwrap_or_default(),
                row.u_last_name.clone().unwrap_or_default()
            ),
            blog: Microblog {
                id: row.id.unwrap_or_default(),
                user: row.user.unwrap_or_default(),
                upload_time: row.upload_time.unwrap_or_default(),
                title: row.title.unwrap_or_default(),
                content: row.content.unwrap_or_default(),
            },
        }
    }
}

/// A session joined with its activity, trainer and location. The workhorse
/// read model for the public session list and the booking pages.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetails {
    pub id: i64,
    pub start: NaiveDateTime,
    pub activity: Activity,
    pub trainer: User,
    pub location: Location,
}

/// Flat join row; column aliases carry a table prefix so the single result
/// set can be split back into its entities.
#[derive(sqlx::FromRow, Clone)]
pub struct DbSessionDetailsRow {
    pub s_id: Option<i64>,
    pub s_start: Option<NaiveDateTime>,
    pub a_id: Option<i64>,
    pub a_name: Option<String>,
    pub a_description: Option<String>,
    pub a_capacity: Option<i64>,
    pub a_duration_minutes: Option<i64>,
    pub t_id: Option<i64>,
    pub t_role: Option<String>,
    pub t_username: Option<String>,
    pub t_first_name: Option<String>,
    pub t_last_name: Option<String>,
    pub t_birthday: Option<NaiveDate>,
    pub t_email: Option<String>,
    pub l_id: Option<i64>,
    pub l_name: Option<String>,
    pub l_description: Option<String>,
    pub l_address: Option<String>,
    pub l_availability: Option<String>,
}

impl From<DbSessionDetailsRow> for SessionDetails {
    fn from(row: DbSessionDetailsRow) -> Self {
        Self {
            id: row.s_id.unwrap_or_default(),
            start: row.s_start.unwrap_or_default(),
            activity: Activity {
                id: row.a_id.unwrap_or_default(),
                name: row.a_name.unwrap_or_default(),
                description: row.a_description.unwrap_or_default(),
                capacity: row.a_capacity.unwrap_or(DEFAULT_CAPACITY),
                duration_hours: row.a_duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES) as f64
                    / 60.0,
            },
            trainer: User {
                id: row.t_id.unwrap_or_default(),
                role: row
                    .t_role
                    .as_deref()
                    .and_then(|r| Role::from_str(r).ok())
                    .unwrap_or(Role::Trainer),
                username: row.t_username.unwrap_or_default(),
                first_name: row.t_first_name.unwrap_or_default(),
                last_name: row.t_last_name.unwrap_or_default(),
                birthday: row.t_birthday,
                email: row.t_email.unwrap_or_default(),
            },
            location: Location {
                id: row.l_id.unwrap_or_default(),
                name: row.l_name.unwrap_or_default(),
                description: row.l_description.unwrap_or_default(),
                address: row.l_address.unwrap_or_default(),
                availability: row.l_availability.unwrap_or_default(),
            },
        }
    }
}

/// A booking joined out to everything a member (or admin) needs to see
/// about it in one row.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub id: i64,
    pub member: User,
    pub session: SessionDetails,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbBookingDetailsRow {
    pub b_id: Option<i64>,
    pub m_id: Option<i64>,
    pub m_role: Option<String>,
    pub m_username: Option<String>,
    pub m_first_name: Option<String>,
    pub m_last_name: Option<String>,
    pub m_birthday: Option<NaiveDate>,
    pub m_email: Option<String>,
    #[sqlx(flatten)]
    pub session: DbSessionDetailsRow,
}

impl From<DbBookingDetailsRow> for BookingDetails {
    fn from(row: DbBookingDetailsRow) -> Self {
        Self {
            id: row.b_id.unwrap_or_default(),
            member: User {
                id: row.m_id.unwrap_or_default(),
                role: row
                    .m_role
                    .as_deref()
                    .and_then(|r| Role::from_str(r).ok())
                    .unwrap_or(Role::Member),
                username: row.m_username.unwrap_or_default(),
                first_name: row.m_first_name.unwrap_or_default(),
                last_name: row.m_last_name.unwrap_or_default(),
                birthday: row.m_birthday,
                email: row.m_email.unwrap_or_default(),
            },
            session: SessionDetails::from(row.session),
        }
    }
}

/// A session with the members booked onto it, for the trainer and admin
/// management views.
#[derive(Debug, Clone, Serialize)]
pub struct SessionWithBookings {
    pub session: SessionDetails,
    pub attendees: Vec<User>,
}

impl SessionWithBookings {
    pub fn spots_left(&self) -> i64 {
        self.session.activity.capacity - self.attendees.len() as i64
    }
}
