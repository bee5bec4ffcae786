//! Console display adapter.
//!
//! Implements [`DisplayPort`] over the serial log. The panel itself is a
//! collaborator behind the port; this adapter stands in wherever no panel
//! is attached (host runs, bench bring-up) and doubles as the reference
//! for what a real panel adapter must honour: idempotent power toggles
//! and an accurate `is_powered` answer.

use log::{debug, info};

use crate::app::events::ReadingData;
use crate::app::ports::DisplayPort;
use crate::error::DisplayError;
use crate::moisture::IconClass;

/// Renders readings as log lines. Tracks the power state it is told to be in.
pub struct LogDisplay {
    powered: bool,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self { powered: false }
    }

    fn icon_glyph(icon: IconClass) -> &'static str {
        match icon {
            IconClass::Empty => "[  ]",
            IconClass::Half => "[= ]",
            IconClass::Full => "[==]",
        }
    }
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for LogDisplay {
    fn power_on(&mut self) -> Result<(), DisplayError> {
        if !self.powered {
            debug!("display: power on");
            self.powered = true;
        }
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), DisplayError> {
        if self.powered {
            debug!("display: power off");
            self.powered = false;
        }
        Ok(())
    }

    fn is_powered(&self) -> bool {
        self.powered
    }

    fn render(&mut self, reading: &ReadingData) -> Result<(), DisplayError> {
        match reading.timestamp {
            Some(ts) => info!(
                "DISPLAY | {} {:5.1}% ({:.2} Hz) @ {ts}",
                Self::icon_glyph(reading.icon),
                reading.percent,
                reading.raw_hz,
            ),
            None => info!(
                "DISPLAY | {} {:5.1}% ({:.2} Hz)",
                Self::icon_glyph(reading.icon),
                reading.percent,
                reading.raw_hz,
            ),
        }
        Ok(())
    }

    fn show_message(&mut self, lines: &[&str]) -> Result<(), DisplayError> {
        for line in lines.iter().filter(|l| !l.is_empty()) {
            info!("DISPLAY | {line}");
        }
        Ok(())
    }
}
