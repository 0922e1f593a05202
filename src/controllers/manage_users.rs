use chrono::NaiveDate;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::forms::{validate_password, NAME_REGEX, USERNAME_REGEX};
use crate::auth::{authorize, Role, User};
use crate::controllers::util::{
    app_error_page, forbidden_page, not_found_page, validation_failed, PageResult,
};
use crate::db;
use crate::error::AppError;
use crate::routes::RouteTable;

use super::manage_activities::IdForm;

#[derive(FromForm, Validate)]
pub struct UserForm {
    pub id: Option<i64>,
    pub role: String,
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
    pub birthday: Option<String>,
    pub password: Option<String>,
}

fn form_messages(form: &UserForm) -> Vec<String> {
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

fn parse_birthday(value: Option<&str>) -> Option<NaiveDate> {
    value
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[get("/manage/user")]
pub async fn list(pool: &State<SqlitePool>, routes: &State<RouteTable>, user: User) -> PageResult {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let users = db::get_all_users(pool)
        .await
        .map_err(|e| app_error_page(&e, "User management", routes.home))?;

    Ok(Template::render(
        "user_management",
        context! {
            title: "User Management - High Street Gym",
            users: users,
            roles: [Role::Member, Role::Trainer, Role::Admin],
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

#[post("/manage/user/create", data = "<form>")]
pub async fn create(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<UserForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let mut messages = form_messages(&form);

    let role = match Role::from_str(&form.role) {
        Ok(role) => role,
        Err(_) => {
            messages.push("Unknown role".to_string());
            Role::Member
        }
    };

    match form.password.as_deref() {
        Some(password) if validate_password(password).is_ok() => {}
        _ => messages.push(
            "Password must be at least 8 characters with a digit, an uppercase letter, a lowercase letter and a symbol".to_string(),
        ),
    }

    if !messages.is_empty() {
        return Err(validation_failed(&messages, routes.manage_users));
    }

    match db::ensure_unique_username_email(pool, &form.username, &form.email, None).await {
        Ok(()) => {}
        Err(AppError::Validation(msg)) => {
            return Err(validation_failed(&[msg], routes.manage_users))
        }
        Err(err) => return Err(app_error_page(&err, "Creating user", routes.manage_users)),
    }

    let password = form.password.as_deref().unwrap_or_default();
    db::create_user(
        pool,
        role,
        &form.username,
        &form.first_name,
        &form.last_name,
        parse_birthday(form.birthday.as_deref()),
        &form.email,
        password,
    )
    .await
    .map_err(|e| app_error_page(&e, "Creating user", routes.manage_users))?;

    Ok(Redirect::to(uri!("/manage/user")))
}

#[post("/manage/user/update", data = "<form>")]
pub async fn update(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<UserForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    let id = match form.id {
        Some(id) => id,
        None => {
            return Err(validation_failed(
                &["Missing user id".to_string()],
                routes.manage_users,
            ))
        }
    };

    if db::get_user(pool, id).await.is_err() {
        return Err(not_found_page("user", routes.manage_users));
    }

    let mut messages = form_messages(&form);

    let role = match Role::from_str(&form.role) {
        Ok(role) => role,
        Err(_) => {
            messages.push("Unknown role".to_string());
            Role::Member
        }
    };

    let password = form.password.as_deref().filter(|p| !p.is_empty());
    if let Some(password) = password {
        if validate_password(password).is_err() {
            messages.push(
                "Password must be at least 8 characters with a digit, an uppercase letter, a lowercase letter and a symbol".to_string(),
            );
        }
    }

    if !messages.is_empty() {
        return Err(validation_failed(&messages, routes.manage_users));
    }

    db::update_user(
        pool,
        id,
        role,
        &form.username,
        &form.first_name,
        &form.last_name,
        parse_birthday(form.birthday.as_deref()),
        &form.email,
        password,
    )
    .await
    .map_err(|e| app_error_page(&e, "Updating user", routes.manage_users))?;

    Ok(Redirect::to(uri!("/manage/user")))
}

#[post("/manage/user/delete", data = "<form>")]
pub async fn delete(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<IdForm>,
) -> Result<Redirect, (Status, Template)> {
    authorize(Some(&user), &[Role::Admin]).map_err(|_| forbidden_page(routes.home))?;

    if form.id == user.id {
        return Err(validation_failed(
            &["You cannot delete your own account".to_string()],
            routes.manage_users,
        ));
    }

    db::delete_user(pool, form.id)
        .await
        .map_err(|e| app_error_page(&e, "Deleting user", routes.manage_users))?;

    Ok(Redirect::to(uri!("/manage/user")))
}
