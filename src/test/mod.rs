pub mod utils;

mod bookings;
mod pages;
mod sessions;
