pub mod agenda;
pub mod auth;
pub mod authorization;
pub mod filter;
pub mod report;
