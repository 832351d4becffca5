pub mod check;
pub mod config;
pub mod state;
pub mod task;
