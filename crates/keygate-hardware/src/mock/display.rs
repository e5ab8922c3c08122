//! Virtual character LCD.
//!
//! Simulates a `lines x columns` character display such as a 16x2 HD44780
//! module behind an I2C backpack. Each line is stored padded to the display
//! width; longer text is truncated. Control characters are stripped.
//!
//! # Character Encoding - ASCII Only
//!
//! Character LCD controllers only render their built-in ROM glyphs, which
//! cover printable ASCII. Non-ASCII input is rejected so that messages that
//! would render as garbage on real hardware are caught during development.
//!
//! # Examples
//!
//! ```
//! use keygate_hardware::mock::MockDisplay;
//! use keygate_hardware::Display;
//!
//! let (mut display, handle) = MockDisplay::new(2, 16);
//! display.show_text("Enter code", 0).unwrap();
//!
//! assert_eq!(handle.line(0), "Enter code");
//! assert_eq!(handle.raw_line(0).len(), 16);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::{HardwareError, Result, traits::Display, types::DeviceInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Snapshot of what the display shows plus every text written to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DisplayState {
    buffer: Vec<String>,
    writes: Vec<String>,
}

#[derive(Debug)]
pub struct MockDisplay {
    lines: usize,
    columns: usize,
    state_tx: watch::Sender<DisplayState>,
    faulted: Arc<AtomicBool>,
}

impl MockDisplay {
    /// Create a blank display.
    pub fn new(lines: usize, columns: usize) -> (Self, MockDisplayHandle) {
        let state = DisplayState {
            buffer: vec![" ".repeat(columns); lines],
            writes: Vec::new(),
        };
        let (state_tx, state_rx) = watch::channel(state);
        let faulted = Arc::new(AtomicBool::new(false));

        let display = Self {
            lines,
            columns,
            state_tx,
            faulted: Arc::clone(&faulted),
        };
        let handle = MockDisplayHandle { state_rx, faulted };

        (display, handle)
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Write aligned text on a line.
    pub fn show_aligned(&mut self, text: &str, line: usize, align: Alignment) -> Result<()> {
        self.check_fault()?;

        if !text.is_ascii() {
            return Err(HardwareError::invalid_data(format!(
                "Display text must be ASCII: '{}'",
                text
            )));
        }

        if line >= self.lines {
            return Err(HardwareError::out_of_range(
                "Display line",
                line,
                self.lines.saturating_sub(1),
            ));
        }

        let sanitized = sanitize_text(text);
        let aligned = align_text(&sanitized, self.columns, align);

        self.state_tx.send_modify(|state| {
            state.buffer[line] = aligned;
            state.writes.push(sanitized);
        });
        Ok(())
    }

    fn check_fault(&self) -> Result<()> {
        if self.faulted.load(Ordering::Acquire) {
            return Err(HardwareError::bus("Display not responding"));
        }
        Ok(())
    }
}

impl Display for MockDisplay {
    fn clear(&mut self) -> Result<()> {
        self.check_fault()?;

        let blank = " ".repeat(self.columns);
        self.state_tx.send_modify(|state| {
            for line in &mut state.buffer {
                line.clone_from(&blank);
            }
        });
        Ok(())
    }

    fn show_text(&mut self, text: &str, line: usize) -> Result<()> {
        self.show_aligned(text, line, Alignment::Left)
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(
            format!("LCD {}x{}", self.columns, self.lines),
            "Mock I2C Character LCD",
        )
        .with_pins([0, 1])
    }
}

/// Read-only view of a mock display, with fault injection.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    state_rx: watch::Receiver<DisplayState>,
    faulted: Arc<AtomicBool>,
}

impl MockDisplayHandle {
    /// Line content with trailing padding removed. Empty if out of range.
    pub fn line(&self, line: usize) -> String {
        self.raw_line(line).trim_end().to_string()
    }

    /// Line content including padding. Empty if out of range.
    pub fn raw_line(&self, line: usize) -> String {
        self.state_rx
            .borrow()
            .buffer
            .get(line)
            .cloned()
            .unwrap_or_default()
    }

    /// All lines, trimmed.
    pub fn all_lines(&self) -> Vec<String> {
        self.state_rx
            .borrow()
            .buffer
            .iter()
            .map(|l| l.trim_end().to_string())
            .collect()
    }

    /// Every text written since creation, in order.
    pub fn writes(&self) -> Vec<String> {
        self.state_rx.borrow().writes.clone()
    }

    /// Whether any line currently shows `text`.
    pub fn shows(&self, text: &str) -> bool {
        self.state_rx.borrow().buffer.iter().any(|l| l.contains(text))
    }

    pub fn is_blank(&self) -> bool {
        self.state_rx
            .borrow()
            .buffer
            .iter()
            .all(|l| l.trim().is_empty())
    }

    /// Make subsequent display calls fail until cleared.
    pub fn set_faulted(&self, faulted: bool) {
        self.faulted.store(faulted, Ordering::Release);
    }
}

/// Truncate text to a maximum number of characters.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Pad or truncate text to exactly `width` characters.
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;

    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_display_is_blank() {
        let (display, handle) = MockDisplay::new(2, 16);

        assert_eq!(display.lines(), 2);
        assert_eq!(display.columns(), 16);
        assert!(handle.is_blank());
        assert_eq!(handle.raw_line(1), " ".repeat(16));
    }

    #[test]
    fn test_show_text_basic() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        display.show_text("Access Granted!", 0).unwrap();
        display.show_text("Welcome,Matt!", 1).unwrap();

        assert_eq!(handle.all_lines(), vec!["Access Granted!", "Welcome,Matt!"]);
    }

    #[test]
    fn test_show_text_invalid_line() {
        let (mut display, _handle) = MockDisplay::new(2, 16);
        let result = display.show_text("TEXT", 5);

        match result {
            Err(HardwareError::OutOfRange { value, max, .. }) => {
                assert_eq!(value, 5);
                assert_eq!(max, 1);
            }
            other => panic!("Expected OutOfRange error, got {:?}", other),
        }
    }

    #[test]
    fn test_text_truncation() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        display
            .show_text("This text is longer than sixteen", 0)
            .unwrap();

        assert_eq!(handle.raw_line(0), "This text is lon");
    }

    #[test]
    fn test_non_ascii_rejected() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        assert!(display.show_text("Liberação", 0).is_err());
        assert!(handle.is_blank());
    }

    #[test]
    fn test_control_characters_removed() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        display.show_text("AB\tC\nD", 0).unwrap();
        assert_eq!(handle.line(0), "ABCD");
    }

    #[test]
    fn test_clear_keeps_write_log() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        display.show_text("1234", 0).unwrap();
        display.clear().unwrap();

        assert!(handle.is_blank());
        assert_eq!(handle.writes(), vec!["1234"]);
    }

    #[test]
    fn test_shows() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        display.show_text("Closing in 3", 0).unwrap();
        assert!(handle.shows("Closing"));
        assert!(!handle.shows("Welcome"));
    }

    #[test]
    fn test_fault_injection() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        handle.set_faulted(true);

        assert!(display.clear().is_err());
        assert!(display.show_text("x", 0).is_err());

        handle.set_faulted(false);
        assert!(display.show_text("x", 0).is_ok());
    }

    #[test]
    fn test_out_of_range_handle_line_is_empty() {
        let (_display, handle) = MockDisplay::new(2, 16);
        assert_eq!(handle.line(9), "");
    }

    #[test]
    fn test_text_alignment_left() {
        assert_eq!(align_text("HELLO", 10, Alignment::Left), "HELLO     ");
    }

    #[test]
    fn test_text_alignment_center_odd_padding() {
        assert_eq!(align_text("HELLO", 11, Alignment::Center), "   HELLO   ");
    }

    #[test]
    fn test_text_alignment_right() {
        assert_eq!(align_text("HELLO", 10, Alignment::Right), "     HELLO");
    }

    #[test]
    fn test_show_aligned_center() {
        let (mut display, handle) = MockDisplay::new(2, 16);
        display.show_aligned("OK", 0, Alignment::Center).unwrap();
        assert_eq!(handle.raw_line(0), "       OK       ");
    }

    #[test]
    fn test_truncate_text_exact() {
        assert_eq!(truncate_text("12345", 5), "12345");
        assert_eq!(truncate_text("12345", 3), "123");
    }
}
