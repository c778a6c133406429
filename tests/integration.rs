//! End-to-end tests through real files: index a bibliography on disk,
//! load the sidecar back, query it, and drive the interactive shell.

mod common;

#[path = "integration/on_disk.rs"]
mod on_disk;

#[path = "integration/shell_session.rs"]
mod shell_session;
