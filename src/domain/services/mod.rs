pub mod availability;
pub mod closure_service;
pub mod clock;
pub mod conflicts;
pub mod dispatcher;
pub mod recurring_service;
pub mod renderer;
pub mod reservation_service;
pub mod retry;
pub mod session;
pub mod subscription_registry;
