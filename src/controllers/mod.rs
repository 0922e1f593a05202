pub mod activities;
pub mod bookings;
pub mod contact;
pub mod dashboard;
pub mod manage_activities;
pub mod manage_bookings;
pub mod manage_locations;
pub mod manage_sessions;
pub mod manage_users;
pub mod microblogs;
pub mod pages;
pub mod sessions;
pub mod util;
