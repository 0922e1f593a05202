use once_cell::sync::Lazy;
use regex::Regex;
use rocket::form::Form;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;
use validator::{Validate, ValidationError};

use crate::db;
use crate::error::AppError;
use crate::routes::RouteTable;

use super::{User, UserSession, SESSION_LIFETIME_HOURS};

pub(crate) static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_\.]{2,19}$").unwrap());
pub(crate) static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z'\- ]{1,49}$").unwrap());

// At least 8 non-whitespace characters with a digit, an upper, a lower and a
// symbol. Spelled out as scans because the regex crate has no lookahead.
pub(crate) fn validate_password(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let no_whitespace = !password.chars().any(char::is_whitespace);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if long_enough && no_whitespace && has_digit && has_upper && has_lower && has_symbol {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength"))
    }
}

#[derive(FromForm)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(FromForm, Validate)]
pub struct RegisterForm {
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username must start with a letter and be 3-20 letters, digits, underscores or dots"
    ))]
    pub username: String,
    #[validate(regex(
        path = *NAME_REGEX,
        message = "First name must be 2-50 letters, spaces, hyphens or apostrophes"
    ))]
    pub first_name: String,
    #[validate(regex(
        path = *NAME_REGEX,
        message = "Last name must be 2-50 letters, spaces, hyphens or apostrophes"
    ))]
    pub last_name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(custom(
        function = validate_password,
        message = "Password must be at least 8 characters with a digit, an uppercase letter, a lowercase letter and a symbol"
    ))]
    pub password: String,
    pub birthday: Option<String>,
}

pub fn validation_messages(form: &RegisterForm) -> Vec<String> {
    match form.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect(),
    }
}

#[get("/login?<username>&<error>&<message>")]
pub fn login(
    routes: &State<RouteTable>,
    username: Option<String>,
    error: Option<String>,
    message: Option<String>,
) -> Template {
    Template::render(
        "login",
        context! {
            title: "Login - High Street Gym",
            username: username.unwrap_or_default(),
            error: error,
            message: message,
            routes: routes.inner(),
        },
    )
}

#[post("/login", data = "<form>")]
pub async fn process_login(
    pool: &State<SqlitePool>,
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
) -> Result<Redirect, Redirect> {
    info!("Login attempt: {}", &form.username);

    match db::authenticate_user(pool, &form.username, &form.password).await {
        Ok(user) => {
            let token = UserSession::generate_token();
            let expires_at =
                (chrono::Utc::now() + chrono::Duration::hours(SESSION_LIFETIME_HOURS)).naive_utc();

            if let Err(err) = db::create_user_session(pool, user.id, &token, expires_at).await {
                err.log_and_record("Creating login session");
                return Err(Redirect::to(uri!(
                    "/login?error=Login%20failed,%20please%20try%20again"
                )));
            }

            cookies.add_private(Cookie::build(("session_token", token)).same_site(SameSite::Lax));

            info!(username = %user.username, "Authentication successful");
            Ok(Redirect::to("/dashboard"))
        }
        Err(err) => {
            err.log_and_record("Login");
            Err(Redirect::to(format!(
                "/login?username={}&error=Invalid%20username%20or%20password",
                form.username
            )))
        }
    }
}

#[post("/logout")]
pub async fn logout(
    pool: &State<SqlitePool>,
    cookies: &CookieJar<'_>,
    _user: User,
) -> Redirect {
    if let Some(cookie) = cookies.get_private("session_token") {
        if let Err(err) = db::invalidate_session(pool, cookie.value()).await {
            err.log_and_record("Invalidating session on logout");
        }
        cookies.remove_private(Cookie::build("session_token"));
    }
    Redirect::to("/login")
}

#[get("/register")]
pub fn register(routes: &State<RouteTable>) -> Template {
    Template::render(
        "register",
        context! {
            title: "Register - High Street Gym",
            errors: Vec::<String>::new(),
            routes: routes.inner(),
        },
    )
}

#[post("/register", data = "<form>")]
pub async fn process_register(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    form: Form<RegisterForm>,
) -> Result<Redirect, Template> {
    let render_errors = |errors: Vec<String>| {
        Template::render(
            "register",
            context! {
                title: "Register - High Street Gym",
                errors: errors,
                username: form.username.clone(),
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                email: form.email.clone(),
                routes: routes.inner(),
            },
        )
    };

    let errors = validation_messages(&form);
    if !errors.is_empty() {
        return Err(render_errors(errors));
    }

    match db::ensure_unique_username_email(pool, &form.username, &form.email, None).await {
        Ok(()) => {}
        Err(AppError::Validation(msg)) => return Err(render_errors(vec![msg])),
        Err(err) => {
            err.log_and_record("Registration uniqueness check");
            return Err(render_errors(vec!["Registration failed".to_string()]));
        }
    }

    let birthday = form
        .birthday
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    match db::register_member(
        pool,
        &form.username,
        &form.first_name,
        &form.last_name,
        birthday,
        &form.email,
        &form.password,
    )
    .await
    {
        Ok(_) => Ok(Redirect::to(uri!(
            "/login?message=Account%20created,%20please%20log%20in"
        ))),
        Err(err) => {
            err.log_and_record("Registration");
            Err(render_errors(vec!["Registration failed".to_string()]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "new_member".to_string(),
            first_name: "New".to_string(),
            last_name: "Member".to_string(),
            email: "new@example.com".to_string(),
            password: "Str0ng!pass".to_string(),
            birthday: None,
        }
    }

    #[test]
    fn accepts_valid_registration() {
        assert!(validation_messages(&valid_form()).is_empty());
    }

    #[test]
    fn rejects_short_username() {
        let mut form = valid_form();
        form.username = "ab".to_string();
        assert!(!validation_messages(&form).is_empty());
    }

    #[test]
    fn rejects_username_starting_with_digit() {
        let mut form = valid_form();
        form.username = "1abc".to_string();
        assert!(!validation_messages(&form).is_empty());
    }

    #[test]
    fn rejects_weak_passwords() {
        for bad in [
            "Sh0rt!a",        // too short
            "nouppercase1!",  // no uppercase
            "NOLOWERCASE1!",  // no lowercase
            "NoSymbols11aa",  // no symbol
            "NoDigits!here",  // no digit
            "With Space1!Aa", // whitespace
        ] {
            assert!(validate_password(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn accepts_strong_password() {
        assert!(validate_password("Str0ng!pass").is_ok());
    }
}
