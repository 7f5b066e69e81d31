// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text utilities for the header and vector-name scanners.

/// Check if a byte can continue a C identifier.
///
/// Note: digits are allowed in *any* position by the macro grammar the
/// vendor headers use, so name scanning accepts leading digits too.
#[inline]
pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Check if a byte is an uppercase letter or digit (vector-name token
/// alphabet).
#[inline]
pub fn is_token_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit()
}

/// Split a line into code and comment parts at the first `/*`.
pub fn split_block_comment(line: &str) -> (&str, &str) {
    match line.split_once("/*") {
        Some((code, _)) => (code, &line[code.len()..]),
        None => (line, ""),
    }
}

/// A simple cursor for scanning text byte-by-byte.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of the input.
    pub fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// Get the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True if the cursor has consumed all input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Peek at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Advance over a run of space characters.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Consume a single expected byte, returning whether it was present.
    pub fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume an exact literal, returning whether it was present.
    pub fn eat_str(&mut self, lit: &str) -> bool {
        if self.bytes[self.pos..].starts_with(lit.as_bytes()) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Try to consume an identifier, returning it if found.
    pub fn take_ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        Some(std::str::from_utf8(&self.bytes[start..self.pos]).expect("ascii identifier"))
    }

    /// Try to consume a run of decimal digits, returning it if found.
    pub fn take_digits(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        Some(std::str::from_utf8(&self.bytes[start..self.pos]).expect("ascii digits"))
    }

    /// Everything from the current position to the end of input.
    pub fn rest(&self) -> &'a str {
        std::str::from_utf8(&self.bytes[self.pos..]).expect("cursor input is valid utf-8")
    }
}
