//! Types for standardized reports to the user about set operations.
//!
//! Every operation returns its result alongside a [`Report`] of
//! human-readable entries, e.g. how many records were dropped by a diff or
//! how many clusters a merge produced. The command line tool logs these.
//!

use log::info;

/// The [`CommandOutput<U>`] type output is generic over some data output
/// from a command, and a [`Report`] that reports information to the user.
#[derive(Debug)]
pub struct CommandOutput<U> {
    value: U,
    report: Report,
}

impl<U> CommandOutput<U> {
    pub fn new(value: U, report: Report) -> Self {
        Self { value, report }
    }

    pub fn value(&self) -> &U {
        &self.value
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_value(self) -> U {
        self.value
    }

    pub fn into_parts(self) -> (U, Report) {
        (self.value, self.report)
    }
}

/// A type to (semi) standardize reporting to the user.
#[derive(Debug, Default)]
pub struct Report {
    entries: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, message: String) {
        self.entries.push(message)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Append the entries of another report.
    pub fn extend(&mut self, other: Report) {
        self.entries.extend(other.entries)
    }

    /// Emit every entry at info level.
    pub fn log(&self) {
        for entry in &self.entries {
            info!("{}", entry);
        }
    }
}
