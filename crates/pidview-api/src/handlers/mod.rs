pub mod file;
pub mod health;
pub mod pages;
pub mod progress;
pub mod trigger;
pub mod upload;
