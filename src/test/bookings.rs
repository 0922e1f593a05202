#[cfg(test)]
mod tests {
    use crate::{
        db::{
            create_booking, delete_booking_by_member_and_session, get_booking, update_booking,
        },
        error::AppError,
        test::utils::test_db::TestDbBuilder,
    };
    use chrono::NaiveDate;
    use rocket::tokio;

    fn next_monday_at(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 7)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn booking_succeeds_while_capacity_remains() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .trainer("coach")
            .activity("Yoga", 2, 60)
            .session("yoga_am", "Yoga", None, next_monday_at(9))
            .build()
            .await
            .expect("Failed to build test database");

        let member = test_db.user_id("alice").unwrap();
        let session = test_db.session_id("yoga_am").unwrap();

        let booking_id = create_booking(&test_db.pool, member, session)
            .await
            .expect("Booking should succeed with spots free");
        assert!(booking_id > 0);
        assert_eq!(test_db.booking_count("yoga_am").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_booking_is_rejected() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .trainer("coach")
            .activity("Yoga", 5, 60)
            .session("yoga_am", "Yoga", None, next_monday_at(9))
            .booking("alice", "yoga_am")
            .build()
            .await
            .expect("Failed to build test database");

        let member = test_db.user_id("alice").unwrap();
        let session = test_db.session_id("yoga_am").unwrap();

        let result = create_booking(&test_db.pool, member, session).await;
        assert!(matches!(result, Err(AppError::AlreadyBooked)));
        assert_eq!(test_db.booking_count("yoga_am").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn full_session_rejects_further_bookings() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .member("bob")
            .member("carol")
            .trainer("coach")
            .activity("Spin", 2, 45)
            .session("spin", "Spin", None, next_monday_at(18))
            .booking("alice", "spin")
            .booking("bob", "spin")
            .build()
            .await
            .expect("Failed to build test database");

        let carol = test_db.user_id("carol").unwrap();
        let session = test_db.session_id("spin").unwrap();

        let result = create_booking(&test_db.pool, carol, session).await;
        assert!(matches!(result, Err(AppError::SessionFull)));
        assert_eq!(test_db.booking_count("spin").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn booking_unknown_session_fails() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let member = test_db.user_id("alice").unwrap();

        let result = create_booking(&test_db.pool, member, 9999).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn concurrent_bookings_never_exceed_capacity() {
        let capacity = 2;
        let mut builder = TestDbBuilder::new()
            .trainer("coach")
            .activity("HIIT", capacity, 30)
            .session("hiit", "HIIT", None, next_monday_at(7));

        for i in 0..5 {
            builder = builder.member(&format!("member_{}", i));
        }

        let test_db = builder.build().await.expect("Failed to build test database");
        let session = test_db.session_id("hiit").unwrap();

        let mut handles = Vec::new();
        for i in 0..5 {
            let pool = test_db.pool.clone();
            let member = test_db.user_id(&format!("member_{}", i)).unwrap();
            handles.push(tokio::spawn(async move {
                create_booking(&pool, member, session).await
            }));
        }

        let mut successes = 0;
        let mut full_rejections = 0;
        for handle in handles {
            match handle.await.expect("Task panicked") {
                Ok(_) => successes += 1,
                Err(AppError::SessionFull) => full_rejections += 1,
                Err(other) => panic!("Unexpected booking error: {:?}", other),
            }
        }

        assert_eq!(successes, capacity);
        assert_eq!(full_rejections, 5 - capacity);
        assert_eq!(
            test_db.booking_count("hiit").await.unwrap(),
            capacity,
            "Stored bookings must never exceed capacity"
        );
    }

    #[tokio::test]
    async fn cancelling_frees_a_spot() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .member("bob")
            .trainer("coach")
            .activity("Pilates", 1, 60)
            .session("pilates", "Pilates", None, next_monday_at(10))
            .booking("alice", "pilates")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();
        let bob = test_db.user_id("bob").unwrap();
        let session = test_db.session_id("pilates").unwrap();

        assert!(matches!(
            create_booking(&test_db.pool, bob, session).await,
            Err(AppError::SessionFull)
        ));

        delete_booking_by_member_and_session(&test_db.pool, alice, session)
            .await
            .expect("Cancellation should succeed");

        create_booking(&test_db.pool, bob, session)
            .await
            .expect("Freed spot should be bookable again");
        assert_eq!(test_db.booking_count("pilates").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancelling_twice_reports_not_found() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .trainer("coach")
            .activity("Yoga", 3, 60)
            .session("yoga", "Yoga", None, next_monday_at(9))
            .booking("alice", "yoga")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();
        let session = test_db.session_id("yoga").unwrap();

        delete_booking_by_member_and_session(&test_db.pool, alice, session)
            .await
            .expect("First cancellation should succeed");

        let result = delete_booking_by_member_and_session(&test_db.pool, alice, session).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn rebooking_moves_to_the_new_session() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .trainer("coach")
            .activity("Yoga", 3, 60)
            .session("morning", "Yoga", None, next_monday_at(9))
            .session("evening", "Yoga", None, next_monday_at(18))
            .booking("alice", "morning")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();
        let morning = test_db.session_id("morning").unwrap();
        let evening = test_db.session_id("evening").unwrap();

        let booking_id =
            sqlx::query_scalar::<_, i64>("SELECT id FROM bookings WHERE member = ? AND session = ?")
                .bind(alice)
                .bind(morning)
                .fetch_one(&test_db.pool)
                .await
                .unwrap();

        let new_id = update_booking(&test_db.pool, booking_id, alice, evening)
            .await
            .expect("Rebooking should succeed");

        assert_ne!(new_id, booking_id);
        assert_eq!(test_db.booking_count("morning").await.unwrap(), 0);
        assert_eq!(test_db.booking_count("evening").await.unwrap(), 1);
        assert!(get_booking(&test_db.pool, booking_id).await.is_err());
    }

    #[tokio::test]
    async fn rebooking_to_the_same_session_is_a_noop() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .trainer("coach")
            .activity("Yoga", 3, 60)
            .session("yoga", "Yoga", None, next_monday_at(9))
            .booking("alice", "yoga")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();
        let session = test_db.session_id("yoga").unwrap();

        let booking_id =
            sqlx::query_scalar::<_, i64>("SELECT id FROM bookings WHERE member = ? AND session = ?")
                .bind(alice)
                .bind(session)
                .fetch_one(&test_db.pool)
                .await
                .unwrap();

        let returned = update_booking(&test_db.pool, booking_id, alice, session)
            .await
            .expect("Unchanged rebooking should be a no-op");

        assert_eq!(returned, booking_id);
        assert_eq!(test_db.booking_count("yoga").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rebooking_into_a_full_session_keeps_the_old_booking() {
        let test_db = TestDbBuilder::new()
            .member("alice")
            .member("bob")
            .trainer("coach")
            .activity("Spin", 1, 45)
            .activity("Yoga", 3, 60)
            .session("spin", "Spin", None, next_monday_at(18))
            .session("yoga", "Yoga", None, next_monday_at(9))
            .booking("bob", "spin")
            .booking("alice", "yoga")
            .build()
            .await
            .expect("Failed to build test database");

        let alice = test_db.user_id("alice").unwrap();
        let yoga = test_db.session_id("yoga").unwrap();
        let spin = test_db.session_id("spin").unwrap();

        let booking_id =
            sqlx::query_scalar::<_, i64>("SELECT id FROM bookings WHERE member = ? AND session = ?")
                .bind(alice)
                .bind(yoga)
                .fetch_one(&test_db.pool)
                .await
                .unwrap();

        let result = update_booking(&test_db.pool, booking_id, alice, spin).await;
        assert!(matches!(result, Err(AppError::SessionFull)));

        // The original booking survives a failed move.
        assert!(get_booking(&test_db.pool, booking_id).await.is_ok());
        assert_eq!(test_db.booking_count("yoga").await.unwrap(), 1);
        assert_eq!(test_db.booking_count("spin").await.unwrap(), 1);
    }
}
