// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Evaluator for the restricted C constant-expression grammar found in
//! vendor header `#define`s.
//!
//! This is deliberately not a real C expression parser. Grammar rules are
//! tried in a fixed order against the whole trimmed string, and binary
//! operators split at the first textual occurrence of the operator token
//! regardless of parentheses or standard C precedence. Existing macro
//! values across the vendor header corpus depend on this exact tie-break
//! order, so it must not be "improved".
//!
//! Undefined identifiers evaluate to 0 rather than erroring: tables are
//! built incrementally and forward references to not-yet-seen macros are
//! common and harmless.

use std::fmt;

use crate::symbol_table::Defines;

/// Error for input matching none of the supported grammar rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    expr: String,
}

impl EvalError {
    fn new(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }

    /// The offending substring.
    pub fn expr(&self) -> &str {
        &self.expr
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "can't parse constant expression: {:?}", self.expr)
    }
}

impl std::error::Error for EvalError {}

/// Evaluate a constant expression against a symbol table.
///
/// Rules, first match wins:
/// 1. empty string is 0
/// 2. integer literal (decimal or `0x` hex, optional `u`/`ul`/`U`/`UL`)
/// 3. bare name: symbol lookup, 0 if absent
/// 4. fully parenthesized expression with balanced interior
/// 5. leading C cast, stripped and discarded
/// 6. binary split at the first `/`, `<<`, `>>`, `|`, `&`, `+`, `-`
/// 7. unary `~`
///
/// Left-shift and bitwise-not results are masked to 32 bits.
pub fn eval(input: &str, symbols: &Defines) -> Result<i64, EvalError> {
    let val = input.trim();
    if val.is_empty() {
        return Ok(0);
    }
    if let Some(v) = leading_zero_decimal(val) {
        return Ok(v);
    }
    if let Some(v) = int_literal(val) {
        return Ok(v);
    }
    if is_name(val) {
        return Ok(symbols.get(val).unwrap_or(0));
    }
    if let Some(inner) = val.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        if parens_balanced(inner) {
            return eval(inner, symbols);
        }
    }
    if let Some(rest) = strip_cast(val) {
        return eval(rest, symbols);
    }
    if let Some((l, r)) = val.split_once('/') {
        let (l, r) = (eval(l, symbols)?, eval(r, symbols)?);
        if r == 0 {
            return Err(EvalError::new(val));
        }
        return Ok(l / r);
    }
    if let Some((l, r)) = val.split_once("<<") {
        let (l, r) = (eval(l, symbols)?, eval(r, symbols)?);
        return Ok((l << (r & 0x3f)) & 0xFFFF_FFFF);
    }
    if let Some((l, r)) = val.split_once(">>") {
        let (l, r) = (eval(l, symbols)?, eval(r, symbols)?);
        return Ok(l >> (r & 0x3f));
    }
    if let Some((l, r)) = val.split_once('|') {
        return Ok(eval(l, symbols)? | eval(r, symbols)?);
    }
    if let Some((l, r)) = val.split_once('&') {
        return Ok(eval(l, symbols)? & eval(r, symbols)?);
    }
    if let Some((l, r)) = val.split_once('+') {
        return Ok(eval(l, symbols)?.wrapping_add(eval(r, symbols)?));
    }
    if let Some((l, r)) = val.split_once('-') {
        return Ok(eval(l, symbols)?.wrapping_sub(eval(r, symbols)?));
    }
    if let Some(inner) = val.strip_prefix('~') {
        return Ok(!eval(inner, symbols)? & 0xFFFF_FFFF);
    }
    Err(EvalError::new(val))
}

/// Integer literal with an optional C suffix.
fn int_literal(s: &str) -> Option<i64> {
    let body = s
        .strip_suffix("ul")
        .or_else(|| s.strip_suffix("UL"))
        .or_else(|| s.strip_suffix('u'))
        .or_else(|| s.strip_suffix('U'))
        .unwrap_or(s);
    if let Some(hex) = body.strip_prefix("0x") {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        body.parse().ok()
    }
}

/// Quirk rule inherited from the vendor corpus: a `U`-suffixed decimal
/// with a leading zero (`042U`) parses as decimal without the zero.
/// Matches as a prefix; anything after the `U` is ignored.
fn leading_zero_decimal(s: &str) -> Option<i64> {
    let rest = s.strip_prefix('0')?;
    let b = rest.as_bytes();
    if !matches!(b.first(), Some(b'1'..=b'9')) {
        return None;
    }
    let end = b
        .iter()
        .position(|c| !c.is_ascii_digit())
        .unwrap_or(b.len());
    if b.get(end) != Some(&b'U') {
        return None;
    }
    rest[..end].parse().ok()
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Open/close parenthesis counter: must never go negative and must end at
/// zero.
fn parens_balanced(val: &str) -> bool {
    let mut n: i32 = 0;
    for c in val.bytes() {
        match c {
            b'(' => n += 1,
            b')' => {
                n -= 1;
                if n < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    n == 0
}

/// Strip a leading C-style cast: optional `*`, `(ident [*])`, remainder.
/// The cast target type is discarded.
fn strip_cast(s: &str) -> Option<&str> {
    let r = s.strip_prefix('*').unwrap_or(s);
    let r = r.strip_prefix('(')?;
    let b = r.as_bytes();
    let mut i = 0;
    while i < b.len() && (b[i].is_ascii_alphanumeric() || b[i] == b'_') {
        i += 1;
    }
    if i == 0 {
        return None;
    }
    while i < b.len() && b[i] == b' ' {
        i += 1;
    }
    if b.get(i) == Some(&b'*') {
        i += 1;
    }
    if b.get(i) != Some(&b')') {
        return None;
    }
    Some(&r[i + 1..])
}
