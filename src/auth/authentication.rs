use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::Redirect;
use rocket::Request;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;
use tracing::Instrument;

use crate::db::{get_session_by_token, get_user};

use super::User;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        async move {
            let cookies = request.cookies();

            let token = cookies
                .get_private("session_token")
                .map(|c| c.value().to_string());

            if let Some(token) = token {
                let db = match request.rocket().state::<SqlitePool>() {
                    Some(pool) => pool,
                    _ => {
                        tracing::error!("Database pool not found in managed state");
                        return Outcome::Error((Status::InternalServerError, ()));
                    }
                };

                match get_session_by_token(db, &token).await {
                    Ok(session) => {
                        if !session.is_valid() {
                            tracing::warn!(token = %token, "Session token expired");
                            return Outcome::Forward(Status::Unauthorized);
                        }

                        match get_user(db, session.user_id).await {
                            Ok(user) => {
                                tracing::info!(username = %user.username, role = %user.role, "User authenticated via session token");
                                return Outcome::Success(user);
                            }
                            Err(err) => {
                                tracing::error!(user_id = %session.user_id, error = ?err, "Failed to fetch user for valid session");
                                return Outcome::Error((Status::InternalServerError, ()));
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = ?err, "Invalid session token");
                        return Outcome::Forward(Status::Unauthorized);
                    }
                }
            }

            Outcome::Forward(Status::Unauthorized)
        }
        .instrument(tracing::info_span!("user_auth_guard"))
        .await
    }
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Redirect {
    warn!("Unauthorized access attempt");
    Redirect::to(uri!("/login"))
}

#[catch(403)]
pub fn forbidden(req: &Request) -> Template {
    warn!(uri = %req.uri(), "Forbidden access attempt");
    Template::render(
        "status",
        context! {
            title: "Forbidden",
            heading: "Forbidden",
            message: "You do not have access to this page.",
            route_name: "Home",
            route_path: "/",
        },
    )
}
