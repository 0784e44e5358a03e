pub mod navigator;
pub mod page;
pub mod session;
pub mod trace;
pub mod wait;
