use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet = 0,
    /// Per-run summary plus warnings
    Normal = 1,
    /// Per-file detail
    Verbose = 2,
}

fn verbosity_cell() -> &'static AtomicU8 {
    static CELL: OnceLock<AtomicU8> = OnceLock::new();
    CELL.get_or_init(|| AtomicU8::new(Verbosity::Normal as u8))
}

pub fn set_verbosity(verbosity: Verbosity) {
    verbosity_cell().store(verbosity as u8, Ordering::Relaxed);
}

pub fn enabled(verbosity: Verbosity) -> bool {
    (verbosity as u8) <= verbosity_cell().load(Ordering::Relaxed)
}

/// Warnings bypass the verbosity gate; the pipeline must never silently
/// drop a skipped message.
pub fn warn(message: &str) {
    eprintln!("Warning: {}", message);
}

pub fn info(message: &str) {
    if enabled(Verbosity::Normal) {
        println!("{}", message);
    }
}

pub fn detail(message: &str) {
    if enabled(Verbosity::Verbose) {
        println!("{}", message);
    }
}
