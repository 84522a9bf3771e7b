pub mod capture;
pub mod config;
pub mod driver;
pub mod renderer;
pub mod spectrum;
pub mod sweep_reader;
pub mod text;
pub mod types;
pub mod wallpaper;
