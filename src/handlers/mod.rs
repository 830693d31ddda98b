// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod products;
pub mod profile;
pub mod sellers;
pub mod uploads;
