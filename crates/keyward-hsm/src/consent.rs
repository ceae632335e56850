//! Physical user consent.
//!
//! Security-sensitive operations (generate, rotate, sign) require a human
//! to press a button on the device within a bounded window. Board wiring
//! is abstracted behind the [`Button`] and [`Indicator`] traits so that
//! firmware supplies GPIO implementations and tests supply scripted ones.
//!
//! # Probe protocol
//!
//! At construction the gate probes for a button: it samples the line every
//! poll interval for up to the full timeout. A press observed during the
//! probe means a button is wired and consent is enforced from then on; a
//! silent probe marks the gate **disabled**, and every later consent check
//! is vacuously approved. This lets the same firmware run on boards with
//! and without a button.

use std::time::{Duration, Instant};

use tracing::info;

/// A momentary push button.
///
/// Implementations read the debounced line level; `true` means pressed.
pub trait Button: Send {
    /// Sample the button line once.
    fn is_pressed(&self) -> bool;
}

/// A status LED driven high while a consent-gated operation runs.
pub trait Indicator: Send {
    /// Drive the indicator on or off.
    fn set_lit(&mut self, lit: bool);
}

/// An indicator for boards without an LED. Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn set_lit(&mut self, _lit: bool) {}
}

/// A button line with nothing wired to it: never reads pressed.
///
/// Hosts without GPIO hand this to [`ConsentGate::probe`]; the probe runs
/// its full window, observes silence, and disables the gate — the same
/// path a board without a button takes.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnwiredButton;

impl Button for UnwiredButton {
    fn is_pressed(&self) -> bool {
        false
    }
}

/// Guard that holds an indicator lit for the duration of a scope.
///
/// Dropping the guard extinguishes the indicator, so every exit path of a
/// gated operation turns the LED off, including error returns.
pub struct IndicatorGuard<'a> {
    indicator: &'a mut dyn Indicator,
}

impl<'a> IndicatorGuard<'a> {
    /// Light the indicator and return the guard keeping it lit.
    pub fn light(indicator: &'a mut dyn Indicator) -> Self {
        indicator.set_lit(true);
        Self { indicator }
    }
}

impl Drop for IndicatorGuard<'_> {
    fn drop(&mut self) {
        self.indicator.set_lit(false);
    }
}

/// Timing parameters for the probe and for consent waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentTiming {
    /// Maximum time to wait for a press.
    pub timeout: Duration,
    /// Sampling interval.
    pub poll: Duration,
}

impl ConsentTiming {
    /// Build timing from millisecond values, as configuration supplies
    /// them.
    #[must_use]
    pub const fn from_millis(timeout_ms: u64, poll_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            poll: Duration::from_millis(poll_ms),
        }
    }
}

impl Default for ConsentTiming {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll: Duration::from_millis(50),
        }
    }
}

/// The consent gate.
///
/// Either **enabled** (a button answered the startup probe, and every
/// gated operation must see a press within the timeout) or **disabled**
/// (no button; consent checks approve immediately).
pub struct ConsentGate {
    button: Option<Box<dyn Button>>,
    timing: ConsentTiming,
}

impl ConsentGate {
    /// Probe for a button and build the gate accordingly.
    ///
    /// Blocks for up to `timing.timeout` waiting for a press on `button`;
    /// silence means no button is wired and the gate comes up disabled.
    #[must_use]
    pub fn probe(button: Box<dyn Button>, timing: ConsentTiming) -> Self {
        if wait_for_press(button.as_ref(), timing) {
            info!("consent button detected; consent gate enabled");
            Self {
                button: Some(button),
                timing,
            }
        } else {
            info!("no consent button detected; consent gate disabled");
            Self {
                button: None,
                timing,
            }
        }
    }

    /// Build a gate around a button known to be wired, skipping the probe.
    #[must_use]
    pub fn with_button(button: Box<dyn Button>, timing: ConsentTiming) -> Self {
        Self {
            button: Some(button),
            timing,
        }
    }

    /// Build a permanently disabled gate (no button, vacuous approval).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            button: None,
            timing: ConsentTiming::default(),
        }
    }

    /// Whether a button is enforcing consent.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.button.is_some()
    }

    /// Block until the user approves or the window expires.
    ///
    /// Returns `true` on approval. A disabled gate approves immediately.
    #[must_use]
    pub fn approved(&self) -> bool {
        match &self.button {
            None => true,
            Some(button) => wait_for_press(button.as_ref(), self.timing),
        }
    }
}

impl std::fmt::Debug for ConsentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentGate")
            .field("enabled", &self.is_enabled())
            .field("timing", &self.timing)
            .finish()
    }
}

/// Poll the button until it reads pressed or the window expires.
///
/// Sleeps one poll interval before each sample, so a press is never
/// observed faster than the debounce interval.
fn wait_for_press(button: &dyn Button, timing: ConsentTiming) -> bool {
    let deadline = Instant::now() + timing.timeout;
    loop {
        std::thread::sleep(timing.poll);
        if button.is_pressed() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
    }
}
