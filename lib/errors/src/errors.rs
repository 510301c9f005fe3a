use std::{
    fmt::{self, Display, Formatter},
    ops::{Deref, DerefMut},
};

use cursor::Line;
use itertools::Itertools;

/// Where on its line a diagnostic points.
#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    AtEnd,
    Lexeme(String),
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Location::AtEnd => write!(f, " at end"),
            Location::Lexeme(lexeme) => write!(f, " at '{lexeme}'"),
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{}: {message}", .location.as_ref().map(|l| l.to_string()).unwrap_or_default())]
pub struct Diagnostic {
    pub line: Line,
    pub location: Option<Location>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: Line, message: impl Into<String>) -> Self {
        Self { line, location: None, message: message.into() }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

#[derive(thiserror::Error, Clone, Debug, Default, PartialEq)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl From<Diagnostic> for Diagnostics {
    fn from(d: Diagnostic) -> Self {
        Self(vec![d])
    }
}

impl Deref for Diagnostics {
    type Target = Vec<Diagnostic>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Diagnostics {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}
