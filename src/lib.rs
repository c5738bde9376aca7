// Library surface shared by the binary and the headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod error;
pub mod flow;
pub mod input_field;
pub mod result;
pub mod romaji;
pub mod runtime;
pub mod sequencer;
pub mod session;
pub mod timer;
pub mod typing_policy;
pub mod ui;
pub mod util;

pub use error::{Error, Result};
