pub mod app;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod core;
pub mod favorites;
pub mod media;
pub mod model;
pub mod queue;
pub mod settings;
pub mod stagger;
pub mod time_format;
pub mod ui;
