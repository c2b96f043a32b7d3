pub mod closure;
pub mod directory;
pub mod notification;
pub mod recurring;
pub mod reservation;
pub mod schedule;
pub mod session;
pub mod subscription;
