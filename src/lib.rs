// Library surface for the binary, headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod preferences;
pub mod question;
pub mod quiz;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod ui;
pub mod util;
