mod activity;
mod exchange;
mod partner;

pub use activity::*;
pub use exchange::*;
pub use partner::*;
