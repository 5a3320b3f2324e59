// Library entry shared by the `photo-gallery` binary and the test suites

pub mod app;
pub mod config;
pub mod constants;
pub mod core;
pub mod events;
pub mod models;
pub mod platforms;
pub mod services;
pub mod utils;
pub mod workers;

#[cfg(test)]
mod test_utils;
