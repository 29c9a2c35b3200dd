#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

use alloc::sync::Arc;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Instant;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

struct Uptime;

impl FormatTime for Uptime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let elapsed = START_TIME.elapsed();
        let secs = elapsed.as_secs();
        let millis = elapsed.subsec_millis();
        write!(w, "{:4}.{:03}s", secs, millis)
    }
}

/// Lazy initialization of the global tracing subscriber.
///
/// This ensures the subscriber is set up exactly once, regardless of how many
/// tests run in the same process.
static SUBSCRIBER_INIT: LazyLock<()> = LazyLock::new(|| {
    // Force start time initialization
    let _ = *START_TIME;

    let filter = std::env::var("STAGED_LOG")
        .ok()
        .and_then(|s| s.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_default(tracing::Level::TRACE));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_timer(Uptime)
                .with_target(false)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_test_writer()
                .compact(),
        )
        .with(filter)
        .try_init()
        .ok();
});

/// Set up a tracing subscriber for tests.
///
/// Safe to call from every test: the subscriber is initialized exactly once
/// per process through [`LazyLock`]. Output goes through the test writer, so
/// it is captured like `println!` unless `--nocapture` is passed.
pub fn setup() {
    #[allow(clippy::let_unit_value)]
    let _ = *SUBSCRIBER_INIT;
}

/// Shared record of released [`Tracked`] values, in release order.
///
/// Cloning a log yields another handle to the same record.
#[derive(Debug, Clone, Default)]
pub struct ReleaseLog {
    released: Arc<Mutex<Vec<&'static str>>>,
}

impl ReleaseLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `value` so that dropping it appends `label` to this log.
    pub fn track<T>(&self, label: &'static str, value: T) -> Tracked<T> {
        Tracked {
            label,
            value,
            log: self.clone(),
        }
    }

    /// Labels released so far, in release order.
    pub fn released(&self) -> Vec<&'static str> {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `label` was released.
    pub fn count(&self, label: &str) -> usize {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| **l == label)
            .count()
    }

    /// Whether nothing has been released yet.
    pub fn is_empty(&self) -> bool {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn record(&self, label: &'static str) {
        self.released
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(label);
    }
}

/// A value that records its own release in a [`ReleaseLog`].
pub struct Tracked<T> {
    label: &'static str,
    value: T,
    log: ReleaseLog,
}

impl<T> Tracked<T> {
    /// The label this value reports on release.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<T> core::ops::Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracked")
            .field("label", &self.label)
            .field("value", &self.value)
            .finish()
    }
}

impl<T: PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.value == other.value
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        tracing::trace!(label = self.label, "tracked value released");
        self.log.record(self.label);
    }
}

/// The error [`fallible`] returns: a failure in caller logic between
/// builder steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedFailure;

impl core::fmt::Display for InjectedFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("injected failure")
    }
}

impl core::error::Error for InjectedFailure {}

/// A fallible step: `Ok(())` when `succeed` is true, [`InjectedFailure`]
/// otherwise. Use with `?` between setter calls.
pub fn fallible(succeed: bool) -> Result<(), InjectedFailure> {
    if succeed { Ok(()) } else { Err(InjectedFailure) }
}
