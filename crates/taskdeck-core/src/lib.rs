//! Core taskdeck library (API client, streaming transport, session state).

pub mod api;
pub mod config;
pub mod interrupt;
pub mod session;
pub mod stream;
