//! Tunable engine options.

use std::fmt;

use crate::error::OptionError;

const MIB: usize = 1024 * 1024;

/// An integer option with declared bounds, in the shape a UCI `spin` option takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinOption {
    name: &'static str,
    default: i64,
    min: i64,
    max: i64,
    value: i64,
}

impl SpinOption {
    pub const fn new(name: &'static str, default: i64, min: i64, max: i64) -> SpinOption {
        debug_assert!(min <= default && default <= max);
        SpinOption { name, default, min, max, value: default }
    }

    /// Transposition table size in MiB.
    pub const fn hash() -> SpinOption {
        SpinOption::new("Hash", 16, 1, 65536)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn default_value(&self) -> i64 {
        self.default
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    /// Set a new value; out-of-range values are rejected and the old value kept.
    pub fn set(&mut self, value: i64) -> Result<(), OptionError> {
        if !(self.min..=self.max).contains(&value) {
            return Err(OptionError::OutOfBounds { name: self.name, value, min: self.min, max: self.max });
        }
        self.value = value;
        Ok(())
    }

    /// Parse and set a textual value, as received from a `setoption` command.
    pub fn set_str(&mut self, text: &str) -> Result<(), OptionError> {
        let value = text
            .trim()
            .parse()
            .map_err(|_| OptionError::NotANumber { name: self.name, found: text.to_string() })?;
        self.set(value)
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }

    /// The value read as a size in MiB, converted to bytes.
    pub fn hash_bytes(&self) -> usize {
        usize::try_from(self.value).unwrap_or(0).saturating_mul(MIB)
    }
}

/// UCI declaration: `option name Hash type spin default 16 min 1 max 65536`.
impl fmt::Display for SpinOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "option name {} type spin default {} min {} max {}",
            self.name, self.default, self.min, self.max
        )
    }
}
