pub mod config;
pub mod database;
pub mod favorites_worker;
pub mod json_file;
pub mod logging;
pub mod tmdb;
pub mod web;
