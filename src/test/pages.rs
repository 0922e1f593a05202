#[cfg(test)]
mod tests {
    use crate::test::utils::test_db::TestDbBuilder;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use rocket::tokio;

    #[tokio::test]
    async fn malformed_form_input_renders_the_status_page() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let client = Client::untracked(crate::init_rocket(test_db.pool.clone()).await)
            .await
            .expect("Rocket should launch");

        // A registration post missing its required fields fails form parsing.
        let response = client
            .post("/register")
            .header(ContentType::Form)
            .body("username=alice")
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body = response.into_string().await.expect("Body should render");
        assert!(body.contains("Invalid input"));
        assert!(body.contains("Home"));
    }
}
