// src/models/mod.rs

pub mod product;
pub mod review;
pub mod seller;
pub mod user;
