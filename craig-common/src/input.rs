//! File reader

use std::{
    io::{Error, ErrorKind, Result},
    iter::Peekable,
};

/// A peekable iterator for bytes that records line and column information.
pub struct Input<'a> {
    /// The source of the input data
    source: Peekable<Box<dyn Iterator<Item = u8> + 'a>>,
    /// The current line number
    line: usize,
    /// The current column
    column: usize,
}

impl<'a> Input<'a> {
    /// Create a new `Input` from some source
    pub fn new(source: Box<dyn Iterator<Item = u8> + 'a>) -> Self {
        Input {
            source: source.peekable(),
            line: 1,
            column: 1,
        }
    }
    /// Create an `Input` that reads from a string, mostly for tests.
    pub fn from_text(text: &'a str) -> Self {
        Input::new(Box::new(text.bytes()))
    }
    /// Look at the next byte without consuming it
    pub fn peek(&mut self) -> Option<u8> {
        self.source.peek().cloned()
    }
    /// The line we are currently reading.
    pub fn line(&self) -> usize {
        self.line
    }
    /// Create an io::Error with the given message and position information.
    pub fn error(&self, why: &'static str) -> Error {
        Error::new(
            ErrorKind::InvalidData,
            format!("{} at line {} column {}", why, self.line, self.column),
        )
    }

    /// Parse an unsigned decimal number.
    ///
    /// Consumes one or more decimal digits, returning the value of the
    /// resulting number on success. Fails if there is no digit, or if the
    /// number does not fit in 32 bits.
    pub fn parse_u32(&mut self) -> Result<u32> {
        match self.peek() {
            Some(c) if Self::is_digit(c) => (),
            Some(_) => return Err(self.error(Self::NUMBER)),
            None => return Err(self.error(Self::EOF)),
        }
        let mut value: u32 = 0;
        while let Some(c) = self.peek() {
            if !Self::is_digit(c) {
                break;
            }
            value = value
                .checked_mul(10)
                .and_then(|val| val.checked_add(u32::from(c - b'0')))
                .ok_or_else(|| self.error(Self::OVERFLOW))?;
            self.next();
        }
        Ok(value)
    }

    /// Parse zero or more blanks, never crossing a line break.
    pub fn skip_blanks(&mut self) {
        while let Some(c) = self.peek() {
            if !Self::is_blank(c) {
                break;
            }
            self.next();
        }
    }

    /// Parse one or more blanks.
    pub fn skip_some_blanks(&mut self) -> Result<()> {
        match self.peek() {
            Some(c) if Self::is_blank(c) => {
                self.skip_blanks();
                Ok(())
            }
            _ => Err(self.error(Self::SPACE)),
        }
    }

    /// Parse trailing blanks and the end of the line.
    ///
    /// The end of the input counts as end of line.
    pub fn expect_newline(&mut self) -> Result<()> {
        self.skip_blanks();
        match self.peek() {
            None => Ok(()),
            Some(b'\n') => {
                self.next();
                Ok(())
            }
            Some(b'\r') => {
                self.next();
                if self.peek() == Some(b'\n') {
                    self.next();
                }
                Ok(())
            }
            Some(_) => Err(self.error(Self::NEWLINE)),
        }
    }

    /// Consume the given keyword.
    pub fn expect_keyword(&mut self, keyword: &[u8], why: &'static str) -> Result<()> {
        for &expected in keyword {
            if self.peek() != Some(expected) {
                return Err(self.error(why));
            }
            self.next();
        }
        Ok(())
    }

    // Error messages.
    /// A numeric overflow. This should only happen for user input.
    pub const OVERFLOW: &'static str = "overflow while parsing number";
    /// Parser error ("unexpected EOF")
    pub const EOF: &'static str = "premature end of file";
    /// Parser error (`expected ...`)
    pub const NUMBER: &'static str = "expected number";
    /// Parser error (`expected ...`)
    pub const SPACE: &'static str = "expected space";
    /// Parser error (`expected ...`)
    pub const AAG: &'static str = "expected \"aag\"";
    /// Parser error (`expected ...`)
    pub const NEWLINE: &'static str = "expected newline";
    /// A literal that refers to a variable beyond the maximum index
    pub const LITERAL_RANGE: &'static str = "literal exceeds maximum variable index";
    /// Anything but a single output
    pub const OUTPUTS: &'static str = "expected exactly one output";
    /// A latch with an unsupported initial value
    pub const RESET: &'static str = "only latches reset to 0 are supported";

    /// Check if a character is a decimal digit.
    pub fn is_digit(value: u8) -> bool {
        value >= b'0' && value <= b'9'
    }

    /// Returns true if the character is a space or tab.
    pub fn is_blank(c: u8) -> bool {
        c == b' ' || c == b'\t'
    }
}

impl Iterator for Input<'_> {
    type Item = u8;
    fn next(&mut self) -> Option<u8> {
        self.source.next().map(|c| {
            if c == b'\n' {
                self.line += 1;
                self.column = 0;
            }
            self.column += 1;
            c
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_blanks() {
        let mut input = Input::from_text("12 \t 7\n");
        assert_eq!(input.parse_u32().unwrap(), 12);
        assert!(input.skip_some_blanks().is_ok());
        assert_eq!(input.parse_u32().unwrap(), 7);
        assert!(input.expect_newline().is_ok());
        assert_eq!(input.line(), 2);
        assert!(input.parse_u32().is_err());
    }

    #[test]
    fn overflow_is_reported_with_position() {
        let mut input = Input::from_text("99999999999");
        let error = input.parse_u32().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidData);
        assert!(error.to_string().starts_with(Input::OVERFLOW));
        assert!(error.to_string().contains("line 1"));
    }
}
