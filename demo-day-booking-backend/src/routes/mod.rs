pub mod admin;
pub mod booking;
pub mod events;
pub mod index;
pub mod indexcss;
