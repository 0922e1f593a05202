#[cfg(test)]
mod tests {
    use crate::{
        db::{
            clean_expired_sessions, create_user_session, delete_session, get_session,
            get_session_by_token, get_sessions_with_bookings,
            get_upcoming_session_details, get_week_sessions, invalidate_session,
        },
        error::AppError,
        test::utils::test_db::TestDbBuilder,
        timetable::{build_timetable, week_bounds},
    };
    use chrono::{Duration, NaiveDate, Utc};
    use rocket::tokio;
    use uuid::Uuid;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    #[tokio::test]
    async fn login_session_roundtrip() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();
        let token = format!("test_token_{}", Uuid::new_v4());
        let expires_at = (Utc::now() + Duration::hours(1)).naive_utc();

        let session_id = create_user_session(&test_db.pool, alice, &token, expires_at)
            .await
            .expect("Failed to create session");
        assert!(session_id > 0);

        let session = get_session_by_token(&test_db.pool, &token)
            .await
            .expect("Failed to get session");
        assert_eq!(session.user_id, alice);
        assert!(session.is_valid());

        invalidate_session(&test_db.pool, &token)
            .await
            .expect("Failed to invalidate session");

        let result = get_session_by_token(&test_db.pool, &token).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_login_sessions() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();

        let expired_token = format!("expired_{}", Uuid::new_v4());
        create_user_session(
            &test_db.pool,
            alice,
            &expired_token,
            (Utc::now() - Duration::hours(1)).naive_utc(),
        )
        .await
        .unwrap();

        let live_token = format!("live_{}", Uuid::new_v4());
        create_user_session(
            &test_db.pool,
            alice,
            &live_token,
            (Utc::now() + Duration::days(1)).naive_utc(),
        )
        .await
        .unwrap();

        let cleaned = clean_expired_sessions(&test_db.pool).await.unwrap();
        assert_eq!(cleaned, 1);

        assert!(get_session_by_token(&test_db.pool, &expired_token)
            .await
            .is_err());
        assert!(get_session_by_token(&test_db.pool, &live_token)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn expired_login_session_is_invalid_but_retrievable() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();
        let token = format!("expired_{}", Uuid::new_v4());

        create_user_session(
            &test_db.pool,
            alice,
            &token,
            (Utc::now() - Duration::hours(1)).naive_utc(),
        )
        .await
        .unwrap();

        let session = get_session_by_token(&test_db.pool, &token).await.unwrap();
        assert!(!session.is_valid());
    }

    #[tokio::test]
    async fn session_details_join_all_entities() {
        let start = monday().and_hms_opt(9, 0, 0).unwrap();
        let test_db = TestDbBuilder::new()
            .trainer("coach")
            .activity("Yoga", 10, 90)
            .session("yoga", "Yoga", Some("coach"), start)
            .build()
            .await
            .expect("Failed to build test database");

        let from = monday().and_hms_opt(0, 0, 0).unwrap();
        let details = get_upcoming_session_details(&test_db.pool, from)
            .await
            .unwrap();

        assert_eq!(details.len(), 1);
        let session = &details[0];
        assert_eq!(session.start, start);
        assert_eq!(session.activity.name, "Yoga");
        assert_eq!(session.activity.capacity, 10);
        assert!((session.activity.duration_hours - 1.5).abs() < f64::EPSILON);
        assert_eq!(session.trainer.username, "coach");
        assert!(!session.location.name.is_empty());
    }

    #[tokio::test]
    async fn upcoming_sessions_exclude_the_past() {
        let test_db = TestDbBuilder::new()
            .trainer("coach")
            .activity("Yoga", 10, 60)
            .session("past", "Yoga", None, monday().and_hms_opt(9, 0, 0).unwrap())
            .session(
                "future",
                "Yoga",
                None,
                (monday() + Duration::days(7)).and_hms_opt(9, 0, 0).unwrap(),
            )
            .build()
            .await
            .expect("Failed to build test database");

        let from = monday().and_hms_opt(12, 0, 0).unwrap();
        let details = get_upcoming_session_details(&test_db.pool, from)
            .await
            .unwrap();

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, test_db.session_id("future").unwrap());
    }

    #[tokio::test]
    async fn sessions_with_bookings_group_attendees() {
        let start = monday().and_hms_opt(9, 0, 0).unwrap();
        let test_db = TestDbBuilder::new()
            .member("alice")
            .member("bob")
            .trainer("coach")
            .activity("Yoga", 10, 60)
            .session("yoga", "Yoga", Some("coach"), start)
            .session("empty", "Yoga", Some("coach"), start + Duration::hours(3))
            .booking("alice", "yoga")
            .booking("bob", "yoga")
            .build()
            .await
            .expect("Failed to build test database");

        let sessions = get_sessions_with_bookings(&test_db.pool, None).await.unwrap();
        assert_eq!(sessions.len(), 2);

        let yoga = sessions
            .iter()
            .find(|s| s.session.id == test_db.session_id("yoga").unwrap())
            .unwrap();
        assert_eq!(yoga.attendees.len(), 2);
        assert_eq!(yoga.spots_left(), 8);

        let empty = sessions
            .iter()
            .find(|s| s.session.id == test_db.session_id("empty").unwrap())
            .unwrap();
        assert!(empty.attendees.is_empty());
        assert_eq!(empty.spots_left(), 10);
    }

    #[tokio::test]
    async fn trainer_filter_limits_to_their_sessions() {
        let start = monday().and_hms_opt(9, 0, 0).unwrap();
        let test_db = TestDbBuilder::new()
            .trainer("coach_a")
            .trainer("coach_b")
            .activity("Yoga", 10, 60)
            .session("a", "Yoga", Some("coach_a"), start)
            .session("b", "Yoga", Some("coach_b"), start + Duration::hours(2))
            .build()
            .await
            .expect("Failed to build test database");

        let coach_a = test_db.user_id("coach_a").unwrap();
        let sessions = get_sessions_with_bookings(&test_db.pool, Some(coach_a))
            .await
            .unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session.trainer.username, "coach_a");
    }

    #[tokio::test]
    async fn missing_session_reports_not_found() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let result = get_session(&test_db.pool, 42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn deleting_a_session_removes_its_bookings() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .trainer("coach")
            .activity("Yoga", 10, 60)
            .session("yoga", "Yoga", None, monday().and_hms_opt(9, 0, 0).unwrap())
            .booking("alice", "yoga")
            .build()
            .await
            .expect("Failed to build test database");

        let session = test_db.session_id("yoga").unwrap();

        delete_session(&test_db.pool, session)
            .await
            .expect("Delete should succeed");

        assert!(get_session(&test_db.pool, session).await.is_err());
        let orphans =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE session = ?")
                .bind(session)
                .fetch_one(&test_db.pool)
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn week_query_feeds_the_timetable() {
        let test_db = TestDbBuilder::new()
            .trainer("coach")
            .activity("Yoga", 10, 60)
            .session("mon_am", "Yoga", None, monday().and_hms_opt(9, 0, 0).unwrap())
            .session("mon_pm", "Yoga", None, monday().and_hms_opt(14, 30, 0).unwrap())
            .session(
                "next_week",
                "Yoga",
                None,
                (monday() + Duration::days(8)).and_hms_opt(9, 0, 0).unwrap(),
            )
            .build()
            .await
            .expect("Failed to build test database");

        let (week_start, week_end) = week_bounds(monday());
        let rows = get_week_sessions(&test_db.pool, week_start, week_end)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2, "Next week's session must stay out of the window");

        let table = build_timetable(["Yoga"], &rows);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].activity, "Yoga");
        assert_eq!(table[0].days[0], "9:00 AM, 2:30 PM");
    }
}
