pub mod fixtures;
mod round;
mod settings;
