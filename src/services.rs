pub mod agenda;
pub mod auth;
pub mod document_service;
pub mod lead_service;
pub mod lifecycle;
pub mod narrator;
pub mod report_service;
