// src/models/mod.rs

pub mod api;
pub mod badge;
pub mod badge_award;
pub mod challenge;
pub mod progress;
pub mod user;
pub mod xp_transaction;
