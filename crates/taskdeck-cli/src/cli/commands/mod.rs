pub mod artifacts;
pub mod chat;
pub mod config;
pub mod logs;
pub mod run;
pub mod sessions;
