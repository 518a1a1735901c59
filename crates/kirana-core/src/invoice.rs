//! # Invoice Number Grammar
//!
//! Parsing and formatting for human-readable invoice numbers of the shape
//! `INV-<YYYY>-<NNNN>`: a year scope and a 4-digit zero-padded counter that
//! keeps growing past 9999 without truncation.
//!
//! This module is the pure half of the invoice sequencer. Allocation (who
//! gets which number, atomically, per tenant) lives in the database layer;
//! the grammar, increment, and year-rollover rules live here so they can be
//! tested without a database.
//!
//! ## Failure Mode
//! Parsing a malformed number is a loud `MalformedInvoiceNumber` error.
//! Silently restarting the sequence at 0001 would risk colliding with a
//! live invoice.

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Prefix shared by every invoice number.
pub const INVOICE_PREFIX: &str = "INV";

/// A parsed invoice number: a calendar year and a 1-based sequence.
///
/// Ordering follows (year, sequence), so the maximum of a year's invoice
/// numbers is the most recently issued one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvoiceNumber {
    year: i32,
    sequence: u32,
}

impl InvoiceNumber {
    /// Creates an invoice number from parts.
    pub const fn new(year: i32, sequence: u32) -> Self {
        InvoiceNumber { year, sequence }
    }

    /// The first invoice of a year: `INV-<year>-0001`.
    pub const fn first(year: i32) -> Self {
        InvoiceNumber { year, sequence: 1 }
    }

    /// The invoice number following this one within the same year.
    pub const fn next(&self) -> Self {
        InvoiceNumber {
            year: self.year,
            sequence: self.sequence + 1,
        }
    }

    /// The year this invoice belongs to.
    #[inline]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// The 1-based sequence within the year.
    #[inline]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// The `LIKE` prefix matching every invoice of a year: `INV-<year>-`.
    pub fn year_prefix(year: i32) -> String {
        format!("{INVOICE_PREFIX}-{year}-")
    }

    /// Parses an invoice number.
    ///
    /// Accepts the canonical `INV-YYYY-NNNN` shape, plus a legacy trailing
    /// `-<digits>` segment some earlier data carries (`INV-2024-0042-91573`);
    /// the legacy segment is ignored. Anything else is rejected.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let malformed = || CoreError::MalformedInvoiceNumber(raw.to_string());

        let mut parts = raw.split('-');

        if parts.next() != Some(INVOICE_PREFIX) {
            return Err(malformed());
        }

        let year_part = parts.next().ok_or_else(malformed)?;
        if year_part.len() != 4 {
            return Err(malformed());
        }
        let year: i32 = year_part.parse().map_err(|_| malformed())?;

        let seq_part = parts.next().ok_or_else(malformed)?;
        if seq_part.is_empty() || !seq_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }
        let sequence: u32 = seq_part.parse().map_err(|_| malformed())?;
        if sequence == 0 {
            return Err(malformed());
        }

        // Legacy random suffix: must be all digits if present
        if let Some(legacy) = parts.next() {
            if legacy.is_empty() || !legacy.chars().all(|c| c.is_ascii_digit()) {
                return Err(malformed());
            }
        }
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(InvoiceNumber { year, sequence })
    }
}

/// Canonical rendering: `INV-2026-0001`. The counter is zero-padded to four
/// digits and widens naturally beyond 9999 (`INV-2026-10000`).
impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:04}", INVOICE_PREFIX, self.year, self.sequence)
    }
}

impl FromStr for InvoiceNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceNumber::parse(s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
