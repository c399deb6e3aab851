// Logging and verbosity control

use std::sync::atomic::{AtomicU8, Ordering};
use tracing::level_filters::LevelFilter;

/// Global verbosity level
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Verbosity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// Quiet mode - errors only
    Quiet = 0,
    /// Normal mode - standard output
    Normal = 1,
    /// Verbose mode - debug output
    Verbose = 2,
}

impl VerbosityLevel {
    /// Get the current verbosity level
    pub fn current() -> Self {
        match VERBOSITY.load(Ordering::Relaxed) {
            0 => VerbosityLevel::Quiet,
            1 => VerbosityLevel::Normal,
            _ => VerbosityLevel::Verbose,
        }
    }

    /// Set the verbosity level
    pub fn set(level: Self) {
        VERBOSITY.store(level as u8, Ordering::Relaxed);
    }

    /// Check if we should output at this level
    pub fn should_output(&self) -> bool {
        self <= &Self::current()
    }

    /// Tracing filter matching this level
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            VerbosityLevel::Quiet => LevelFilter::ERROR,
            VerbosityLevel::Normal => LevelFilter::WARN,
            VerbosityLevel::Verbose => LevelFilter::DEBUG,
        }
    }
}

/// Resolve the verbosity implied by the CLI flags; quiet wins
pub fn level_from_flags(verbose: bool, quiet: bool) -> VerbosityLevel {
    if quiet {
        VerbosityLevel::Quiet
    } else if verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    }
}

/// Initialize logging based on CLI flags
///
/// Diagnostics go to stderr so stdout carries only operator-facing output.
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = level_from_flags(verbose, quiet);
    VerbosityLevel::set(level);

    // A subscriber may already be installed (tests call this repeatedly)
    let _ = tracing_subscriber::fmt()
        .with_max_level(level.level_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
