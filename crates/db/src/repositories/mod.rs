mod activity_repository;
mod partner_repository;

pub use activity_repository::*;
pub use partner_repository::*;
