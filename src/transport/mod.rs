/// Filesystem reads and writes for JSON inputs and artifacts.
pub mod fs;
