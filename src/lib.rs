//! Campus Bot — role-aware chat front-end for university services.

pub mod backend;
pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod menu;
pub mod roles;
pub mod router;
