//! Local display screens.
//!
//! The panel is a 21 column by 8 line text display. Three screens can be
//! cycled with the touch input or selected remotely:
//!
//! | Index | Screen    | Content                                  |
//! |-------|-----------|------------------------------------------|
//! | 0     | Main      | link state, backend state, local time    |
//! | 1     | Climate   | temperature and humidity                 |
//! | 2     | Rain/Gas  | rain detection and gas alarm             |
//!
//! A badge scan temporarily replaces whatever screen is selected with the
//! credential and the verdict. The scan screen expires on its own; the
//! selected screen is unchanged by it. A UID of 8 bytes or more does not fit
//! one line and wraps after the last whole byte that does.
//!
//! # Character Encoding
//!
//! The panel only renders printable ASCII. Text is sanitized (control
//! characters removed) and truncated to the column width before it reaches
//! the frame buffer.
//!
//! # Examples
//!
//! ```
//! use hearthgate_controller::display::{Alignment, VirtualDisplay};
//!
//! let mut display = VirtualDisplay::new(8, 21);
//! display.set_line_aligned(0, "HEARTHGATE", Alignment::Center).unwrap();
//!
//! assert_eq!(display.get_line(0).unwrap(), "     HEARTHGATE      ");
//! ```

use std::time::Instant;

use chrono::{DateTime, Local};
use hearthgate_core::constants::{DISPLAY_COLUMNS, DISPLAY_LINES};
use hearthgate_core::{CredentialId, Error, Result};
use tracing::warn;

use crate::command::CommandRejection;
use crate::environment::Environment;

/// Text alignment options for display lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Text starts at column 0, padded with spaces on the right.
    Left,
    /// Text centered with equal padding on both sides (extra space on right if odd).
    Center,
}

/// Fixed size text frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDisplay {
    lines: usize,
    columns: usize,
    buffer: Vec<String>,
}

impl VirtualDisplay {
    pub fn new(lines: usize, columns: usize) -> Self {
        Self {
            lines,
            columns,
            buffer: vec![" ".repeat(columns); lines],
        }
    }

    /// Set text on a line with left alignment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLine`] if the line index is out of bounds.
    pub fn set_line(&mut self, line: usize, text: &str) -> Result<()> {
        self.set_line_aligned(line, text, Alignment::Left)
    }

    /// Set text on a line with custom alignment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLine`] if the line index is out of bounds.
    pub fn set_line_aligned(&mut self, line: usize, text: &str, align: Alignment) -> Result<()> {
        if line >= self.lines {
            return Err(Error::InvalidLine {
                line,
                max: self.lines.saturating_sub(1),
            });
        }

        let sanitized = sanitize_text(text);
        self.buffer[line] = align_text(&sanitized, self.columns, align);
        Ok(())
    }

    /// Fill every line with spaces.
    pub fn clear(&mut self) {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidLine`] if the line index is out of bounds.
    pub fn get_line(&self, line: usize) -> Result<&str> {
        self.buffer
            .get(line)
            .map(String::as_str)
            .ok_or(Error::InvalidLine {
                line,
                max: self.lines.saturating_sub(1),
            })
    }

    pub fn lines(&self) -> &[String] {
        &self.buffer
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.buffer.iter().any(|line| line.contains(needle))
    }
}

impl Default for VirtualDisplay {
    fn default() -> Self {
        Self::new(DISPLAY_LINES, DISPLAY_COLUMNS)
    }
}

/// One of the cyclable screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Climate,
    RainGas,
}

impl Screen {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Screen::Main),
            1 => Some(Screen::Climate),
            2 => Some(Screen::RainGas),
            _ => None,
        }
    }
}

/// Everything a screen needs to draw itself.
#[derive(Debug, Clone, Copy)]
pub struct ScreenContext<'a> {
    pub online: bool,
    pub link_connected: bool,
    pub environment: &'a Environment,
    pub clock: DateTime<Local>,
}

#[derive(Debug, Clone)]
struct ScanNotice {
    credential: CredentialId,
    granted: bool,
    until: Instant,
}

/// Screen selection plus the transient scan notice.
#[derive(Debug, Clone)]
pub struct Screens {
    current: u8,
    count: u8,
    scan: Option<ScanNotice>,
    display: VirtualDisplay,
}

impl Screens {
    pub fn new(count: u8) -> Self {
        Self {
            current: 0,
            count: count.max(1),
            scan: None,
            display: VirtualDisplay::default(),
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    /// Move to the next screen, wrapping around.
    pub fn cycle(&mut self) -> u8 {
        self.current = (self.current + 1) % self.count;
        self.current
    }

    /// Select a screen by index. Returns whether the selection changed.
    ///
    /// # Errors
    /// `InvalidValue` if `index` is not a screen.
    pub fn select(&mut self, index: u8) -> std::result::Result<bool, CommandRejection> {
        if index >= self.count || Screen::from_index(index).is_none() {
            return Err(CommandRejection::InvalidValue(format!(
                "screen {index} (valid: 0-{})",
                self.count - 1
            )));
        }
        let changed = self.current != index;
        self.current = index;
        Ok(changed)
    }

    /// Show a scan verdict until `until`.
    pub fn show_scan(&mut self, credential: CredentialId, granted: bool, until: Instant) {
        self.scan = Some(ScanNotice {
            credential,
            granted,
            until,
        });
    }

    pub fn scan_active(&self, now: Instant) -> bool {
        self.scan.as_ref().is_some_and(|scan| now < scan.until)
    }

    /// Draw the active screen into the frame buffer and return it.
    pub fn compose(&mut self, ctx: &ScreenContext<'_>, now: Instant) -> &VirtualDisplay {
        if !self.scan_active(now) {
            self.scan = None;
        }

        self.display.clear();
        let result = match (&self.scan, Screen::from_index(self.current)) {
            (Some(scan), _) => draw_scan(&mut self.display, scan),
            (None, Some(Screen::Climate)) => draw_climate(&mut self.display, ctx.environment),
            (None, Some(Screen::RainGas)) => draw_rain_gas(&mut self.display, ctx.environment),
            (None, _) => draw_main(&mut self.display, ctx),
        };
        if let Err(e) = result {
            warn!(screen = self.current, error = %e, "Screen does not fit the panel");
        }

        &self.display
    }
}

fn draw_main(display: &mut VirtualDisplay, ctx: &ScreenContext<'_>) -> Result<()> {
    display.set_line_aligned(0, "HEARTHGATE", Alignment::Center)?;
    display.set_line(2, if ctx.link_connected { "Link: Connected" } else { "Link: Down" })?;
    if ctx.online {
        display.set_line(3, "Server Online")?;
    } else {
        display.set_line(3, "Server Offline")?;
    }
    display.set_line_aligned(5, &ctx.clock.format("%H:%M:%S").to_string(), Alignment::Center)?;
    display.set_line_aligned(6, &ctx.clock.format("%Y-%m-%d").to_string(), Alignment::Center)
}

fn draw_climate(display: &mut VirtualDisplay, env: &Environment) -> Result<()> {
    display.set_line_aligned(0, "TEMP / HUMIDITY", Alignment::Center)?;
    match (env.temperature, env.humidity) {
        (Some(t), Some(h)) => {
            display.set_line(2, &format!("Temp: {t:.1} C"))?;
            display.set_line(4, &format!("Humi: {h:.1} %"))
        }
        _ => display.set_line(3, "Sensor Error!"),
    }
}

fn draw_rain_gas(display: &mut VirtualDisplay, env: &Environment) -> Result<()> {
    display.set_line_aligned(0, "RAIN / GAS", Alignment::Center)?;
    display.set_line(2, if env.raining { "Rain: Detected" } else { "Rain: None" })?;
    display.set_line(4, if env.gas_alert { "Gas: ALERT!" } else { "Gas: Normal" })?;
    display.set_line(5, &format!("Level: {}", env.gas))
}

fn draw_scan(display: &mut VirtualDisplay, scan: &ScanNotice) -> Result<()> {
    display.set_line_aligned(0, "CARD SCANNED", Alignment::Center)?;
    display.set_line(2, "UID:")?;
    let uid = wrap_credential(scan.credential.as_str(), display.columns);
    for (offset, part) in uid.iter().take(2).enumerate() {
        display.set_line(3 + offset, part)?;
    }
    display.set_line(
        5,
        if scan.granted {
            "Access: ALLOWED"
        } else {
            "Access: DENIED"
        },
    )
}

/// Split a colon separated credential into lines of at most `width`
/// characters, breaking only after a colon.
fn wrap_credential(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for octet in text.split_inclusive(':') {
        if !current.is_empty() && current.len() + octet.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        current.push_str(octet);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Truncate ASCII text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use hearthgate_controller::display::truncate_text;
///
/// assert_eq!(truncate_text("Server Offline", 6), "Server");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Align ASCII text within a fixed width, padding with spaces.
///
/// # Examples
///
/// ```
/// use hearthgate_controller::display::{align_text, Alignment};
///
/// assert_eq!(align_text("HELLO", 10, Alignment::Left), "HELLO     ");
/// assert_eq!(align_text("HELLO", 10, Alignment::Center), "  HELLO   ");
/// ```
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;

    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Keep printable ASCII only and trim surrounding whitespace.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii() && (!c.is_control() || *c == ' '))
        .collect::<String>()
        .trim()
        .to_string()
}
