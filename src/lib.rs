#[macro_use]
extern crate log;
#[macro_use]
extern crate derive_builder;

pub mod config;
pub mod scraper;
pub mod service;
pub mod types;
pub mod utils;
