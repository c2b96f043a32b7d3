pub mod availability;
pub mod health;
pub mod notification;
pub mod push;
pub mod recurring;
pub mod reservation;
pub mod schedule;
