//! notenews - personal notes and commented news in one web application
//!
//! The access, ordering, slug and moderation rules live in [`policy`] as
//! plain functions; everything else is the application around them.

pub mod config;
pub mod db;
pub mod models;
pub mod policy;
pub mod services;
pub mod templates;
pub mod web;
