use rocket::Request;
use rocket::State;
use rocket_dyn_templates::{context, Template};

use crate::auth::User;
use crate::routes::RouteTable;

#[get("/")]
pub fn home(routes: &State<RouteTable>, user: Option<User>) -> Template {
    Template::render(
        "home",
        context! {
            title: "High Street Gym",
            routes: routes.inner(),
            current_user: user,
        },
    )
}

#[get("/about")]
pub fn about(routes: &State<RouteTable>, user: Option<User>) -> Template {
    Template::render(
        "about",
        context! {
            title: "About - High Street Gym",
            routes: routes.inner(),
            current_user: user,
        },
    )
}

#[get("/privacy")]
pub fn privacy(routes: &State<RouteTable>, user: Option<User>) -> Template {
    Template::render(
        "privacy",
        context! {
            title: "Privacy Policy - High Street Gym",
            routes: routes.inner(),
            current_user: user,
        },
    )
}

#[get("/tos")]
pub fn terms(routes: &State<RouteTable>, user: Option<User>) -> Template {
    Template::render(
        "tos",
        context! {
            title: "Terms of Service - High Street Gym",
            routes: routes.inner(),
            current_user: user,
        },
    )
}

#[catch(404)]
pub fn not_found(req: &Request) -> Template {
    Template::render(
        "status",
        context! {
            title: "Not found",
            heading: "Not found",
            message: format!("No page at {}.", req.uri()),
            route_name: "Home",
            route_path: "/",
        },
    )
}

#[catch(422)]
pub fn unprocessable(req: &Request) -> Template {
    Template::render(
        "status",
        context! {
            title: "Invalid input",
            heading: "Invalid input",
            message: format!("The form submitted to {} could not be read.", req.uri()),
            route_name: "Home",
            route_path: "/",
        },
    )
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Template {
    Template::render(
        "status",
        context! {
            title: "Something went wrong",
            heading: "Something went wrong",
            message: "An unexpected error occurred. Please try again later.",
            route_name: "Home",
            route_path: "/",
        },
    )
}
