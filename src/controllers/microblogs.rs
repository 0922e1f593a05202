use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::{Role, User};
use crate::controllers::util::{
    app_error_page, forbidden_page, format_display_date, validation_failed, PageResult,
};
use crate::db;
use crate::models::MicroblogPost;
use crate::routes::RouteTable;

#[derive(Serialize)]
struct PostView {
    post: MicroblogPost,
    posted_display: String,
}

impl From<MicroblogPost> for PostView {
    fn from(post: MicroblogPost) -> Self {
        Self {
            posted_display: format_display_date(post.blog.upload_time),
            post,
        }
    }
}

#[derive(FromForm)]
pub struct MicroblogForm {
    pub title: String,
    pub content: String,
}

/// Community feed, newest first. Anyone can read; posting needs a login.
#[get("/microblogs")]
pub async fn feed(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: Option<User>,
) -> PageResult {
    let posts = db::get_all_microblog_posts(pool)
        .await
        .map_err(|e| app_error_page(&e, "Microblog feed", routes.home))?;

    Ok(Template::render(
        "microblogs",
        context! {
            title: "Microblog - High Street Gym",
            posts: posts.into_iter().map(PostView::from).collect::<Vec<_>>(),
            routes: routes.inner(),
            current_user: user,
        },
    ))
}

#[post("/microblogs", data = "<form>")]
pub async fn create_post(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<MicroblogForm>,
) -> Result<Redirect, (Status, Template)> {
    let title = form.title.trim();
    let content = form.content.trim();

    if title.is_empty() || title.len() > 100 {
        return Err(validation_failed(
            &["Post title must be 1-100 characters".to_string()],
            routes.microblogs,
        ));
    }
    if content.is_empty() || content.len() > 2000 {
        return Err(validation_failed(
            &["Post content must be 1-2000 characters".to_string()],
            routes.microblogs,
        ));
    }

    db::create_microblog(pool, user.id, title, content)
        .await
        .map_err(|e| app_error_page(&e, "Creating microblog post", routes.microblogs))?;

    Ok(Redirect::to(uri!("/microblogs")))
}

#[derive(FromForm)]
pub struct DeletePostForm {
    pub id: i64,
}

/// Authors can remove their own posts; admins can remove anyone's.
#[post("/microblogs/delete", data = "<form>")]
pub async fn delete_post(
    pool: &State<SqlitePool>,
    routes: &State<RouteTable>,
    user: User,
    form: Form<DeletePostForm>,
) -> Result<Redirect, (Status, Template)> {
    let post = db::get_microblog(pool, form.id)
        .await
        .map_err(|e| app_error_page(&e, "Deleting microblog post", routes.microblogs))?;

    if post.user != user.id && user.role != Role::Admin {
        return Err(forbidden_page(routes.microblogs));
    }

    db::delete_microblog(pool, form.id)
        .await
        .map_err(|e| app_error_page(&e, "Deleting microblog post", routes.microblogs))?;

    Ok(Redirect::to(uri!("/microblogs")))
}
