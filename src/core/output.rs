//! Rendering helpers for drawn numbers.
//!
//! Stored and generated lines carry raw integers; text only exists at render time.

/// Formatting hook for a single drawn number.
pub trait NumberFormat {
    fn number(&self, n: u32) -> String;
}

/// Fixed width, zero padded, two digits: `7 -> "07"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoDigit;

impl NumberFormat for TwoDigit {
    fn number(&self, n: u32) -> String {
        format!("{:02}", n)
    }
}

/// Unpadded decimal, handy for machine-facing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl NumberFormat for Plain {
    fn number(&self, n: u32) -> String {
        n.to_string()
    }
}

/// Join a number set as `"01, 02, 03"`.
pub fn render_set(values: &[u32], fmt: &dyn NumberFormat) -> String {
    values
        .iter()
        .map(|v| fmt.number(*v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"Line 03: ..."`, one-based.
pub fn numbered(index: usize, body: &str) -> String {
    format!("Line {:02}: {}", index + 1, body)
}
