use serde::Serialize;

/// A navigable page with the display name templates use for links.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NamedRoute {
    pub name: &'static str,
    pub path: &'static str,
}

/// Every named page in the site, built once at startup and handed to
/// templates through managed state. Handlers and views refer to pages
/// through this table rather than hard-coded paths.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTable {
    pub home: NamedRoute,
    pub about: NamedRoute,
    pub privacy: NamedRoute,
    pub terms: NamedRoute,
    pub activities: NamedRoute,
    pub sessions: NamedRoute,
    pub bookings: NamedRoute,
    pub contact: NamedRoute,
    pub microblogs: NamedRoute,
    pub login: NamedRoute,
    pub register: NamedRoute,
    pub dashboard: NamedRoute,
    pub manage_activities: NamedRoute,
    pub manage_locations: NamedRoute,
    pub manage_users: NamedRoute,
    pub manage_bookings: NamedRoute,
    pub manage_sessions: NamedRoute,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            home: NamedRoute { name: "Home", path: "/" },
            about: NamedRoute { name: "About", path: "/about" },
            privacy: NamedRoute { name: "Privacy Policy", path: "/privacy" },
            terms: NamedRoute { name: "Terms of Service", path: "/tos" },
            activities: NamedRoute { name: "Activities", path: "/activities" },
            sessions: NamedRoute { name: "Sessions", path: "/sessions" },
            bookings: NamedRoute { name: "My Bookings", path: "/bookings" },
            contact: NamedRoute { name: "Contact", path: "/contact" },
            microblogs: NamedRoute { name: "Microblog", path: "/microblogs" },
            login: NamedRoute { name: "Login", path: "/login" },
            register: NamedRoute { name: "Register", path: "/register" },
            dashboard: NamedRoute { name: "Dashboard", path: "/dashboard" },
            manage_activities: NamedRoute { name: "Activity Management", path: "/manage/activity" },
            manage_locations: NamedRoute { name: "Location Management", path: "/manage/location" },
            manage_users: NamedRoute { name: "User Management", path: "/manage/user" },
            manage_bookings: NamedRoute { name: "Booking Management", path: "/manage/booking" },
            manage_sessions: NamedRoute { name: "Session Management", path: "/manage/session" },
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}
