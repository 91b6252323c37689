pub mod app;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod locations;
pub mod output;
pub mod parser;
pub mod render;
pub mod settings;
pub mod stats;
pub mod window;
