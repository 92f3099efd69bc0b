pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod filters;
pub mod handlers;
pub mod paths;
pub mod quiz;
pub mod session;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;
