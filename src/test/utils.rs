#[cfg(test)]
pub mod test_db {
    use crate::auth::Role;
    use crate::db::{
        create_activity, create_booking, create_location, create_session, create_user,
    };
    use crate::error::AppError;
    use chrono::NaiveDateTime;
    use sqlx::{Pool, Sqlite, SqlitePool};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Once;
    use tracing::log::LevelFilter;
    use uuid::Uuid;

    static INIT: Once = Once::new();
    static STANDARD_PASSWORD: &str = "Password1!";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        activities: Vec<TestActivity>,
        sessions: Vec<TestSession>,
        bookings: Vec<TestBooking>,
    }

    pub struct TestUser {
        pub username: String,
        pub role: Role,
        pub password: String,
    }

    pub struct TestActivity {
        pub name: String,
        pub capacity: i64,
        pub duration_minutes: i64,
    }

    pub struct TestSession {
        pub key: String,
        pub activity_name: String,
        pub trainer_username: Option<String>,
        pub start: NaiveDateTime,
    }

    pub struct TestBooking {
        pub member_username: String,
        pub session_key: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn member(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Member,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn trainer(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Trainer,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn admin(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Admin,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn user_with_password(mut self, username: &str, role: Role, password: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role,
                password: password.to_string(),
            });
            self
        }

        pub fn activity(mut self, name: &str, capacity: i64, duration_minutes: i64) -> Self {
            self.activities.push(TestActivity {
                name: name.to_string(),
                capacity,
                duration_minutes,
            });
            self
        }

        pub fn session(
            mut self,
            key: &str,
            activity_name: &str,
            trainer_username: Option<&str>,
            start: NaiveDateTime,
        ) -> Self {
            self.sessions.push(TestSession {
                key: key.to_string(),
                activity_name: activity_name.to_string(),
                trainer_username: trainer_username.map(String::from),
                start,
            });
            self
        }

        pub fn booking(mut self, member_username: &str, session_key: &str) -> Self {
            self.bookings.push(TestBooking {
                member_username: member_username.to_string(),
                session_key: session_key.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            // File-backed database: every pool connection must see the same
            // data for the concurrent booking tests to mean anything.
            let db_path = std::env::temp_dir().join(format!("hsg_test_{}.db", Uuid::new_v4()));
            let url = format!("sqlite://{}?mode=rwc", db_path.display());
            let pool = SqlitePool::connect(&url).await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut activity_id_map: HashMap<String, i64> = HashMap::new();
            let mut session_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let user_id = create_user(
                    &pool,
                    user.role,
                    &user.username,
                    "Test",
                    "User",
                    None,
                    &format!("{}@example.com", user.username),
                    &user.password,
                )
                .await?;

                user_id_map.insert(user.username.clone(), user_id);
            }

            for activity in &self.activities {
                let activity_id = create_activity(
                    &pool,
                    &activity.name,
                    "",
                    activity.capacity,
                    activity.duration_minutes,
                )
                .await?;

                activity_id_map.insert(activity.name.clone(), activity_id);
            }

            // Sessions always need a location.
            let default_location_id = if self.sessions.is_empty() {
                0
            } else {
                create_location(&pool, "Test Gym", "", "", "").await?
            };

            for session in &self.sessions {
                let activity_id = activity_id_map
                    .get(&session.activity_name)
                    .copied()
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "Test activity {} not declared",
                            session.activity_name
                        ))
                    })?;

                let trainer_id = match &session.trainer_username {
                    Some(username) => user_id_map.get(username).copied(),
                    None => self
                        .users
                        .iter()
                        .find(|u| matches!(u.role, Role::Trainer))
                        .map(|u| user_id_map[&u.username]),
                }
                .ok_or_else(|| AppError::Internal("No trainer declared for session".to_string()))?;

                let session_id = create_session(
                    &pool,
                    activity_id,
                    trainer_id,
                    default_location_id,
                    session.start,
                )
                .await?;

                session_id_map.insert(session.key.clone(), session_id);
            }

            for booking in &self.bookings {
                let member_id = user_id_map
                    .get(&booking.member_username)
                    .copied()
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "Test member {} not declared",
                            booking.member_username
                        ))
                    })?;
                let session_id = session_id_map
                    .get(&booking.session_key)
                    .copied()
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "Test session {} not declared",
                            booking.session_key
                        ))
                    })?;

                create_booking(&pool, member_id, session_id).await?;
            }

            Ok(TestDb {
                pool,
                user_id_map,
                session_id_map,
                db_path,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub session_id_map: HashMap<String, i64>,
        db_path: PathBuf,
    }

    impl Drop for TestDb {
        fn drop(&mut self) {
            // Connections may still be open; unlinking is enough on unix.
            let _ = std::fs::remove_file(&self.db_path);
            for suffix in ["-wal", "-shm"] {
                let mut sidecar = self.db_path.clone().into_os_string();
                sidecar.push(suffix);
                let _ = std::fs::remove_file(&sidecar);
            }
        }
    }

    impl TestDb {
        pub fn db_path(&self) -> &Path {
            &self.db_path
        }

        pub fn user_id(&self, username: &str) -> Option<i64> {
            self.user_id_map.get(username).copied()
        }

        pub fn session_id(&self, key: &str) -> Option<i64> {
            self.session_id_map.get(key).copied()
        }

        pub async fn booking_count(&self, session_key: &str) -> Result<i64, AppError> {
            let session_id = self
                .session_id(session_key)
                .ok_or_else(|| AppError::Internal(format!("Unknown session {}", session_key)))?;
            let count =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE session = ?")
                    .bind(session_id)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_db::TestDbBuilder;
    use rocket::tokio;

    #[tokio::test]
    async fn removes_the_database_file_when_dropped() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let path = test_db.db_path().to_path_buf();
        assert!(path.exists());

        drop(test_db);
        assert!(!path.exists());
    }
}
