pub mod agenda;
pub mod auth;
pub mod authorizations;
pub mod documents;
pub mod events;
pub mod public;
pub mod queues;
pub mod reports;
pub mod users;
