pub mod factory;
pub mod push;
pub mod reporting;
pub mod repositories;
