pub mod animation;
pub mod boundary;
pub mod carousel;
pub mod cli;
pub mod config;
pub mod driver;
pub mod events;
pub mod lifecycle;
pub mod loader;
pub mod scene;
pub mod time;
pub mod zone;

pub use driver::run;
