pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

/// Logs go to stderr so they never interleave with the terminal UI.
pub fn init() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
}
