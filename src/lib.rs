pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod tools;
pub mod web;
