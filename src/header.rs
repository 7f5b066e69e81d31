// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Conditional macro scanner for vendor C headers.
//!
//! Consumes the raw lines of one header file and partitions `#define`
//! values and `<NAME>_IRQn` interrupt numbers into per-execution-core
//! symbol tables. Conditional compilation is tracked by loose substring
//! matching of the `#if defined(CORE_CMx)` / `#else` / `#endif` idiom the
//! vendor headers use for multi-core parts; this is nowhere near a real
//! preprocessor, but it is exactly as much preprocessor as those headers
//! need.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::expr::EvalError;
use crate::symbol_table::{Defines, FUNCTION_MACRO};
use crate::text_utils::{split_block_comment, Cursor};

/// Scope name for definitions outside any core conditional.
pub const ALL_CORES: &str = "all";

/// Error for a macro whose value expression matches no grammar rule.
///
/// This aborts the whole header: a silently missing define would corrupt
/// every downstream descriptor built from the table.
#[derive(Debug)]
pub struct HeaderError {
    line: usize,
    name: String,
    source: EvalError,
}

impl HeaderError {
    /// One-based physical line number of the offending definition.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Name of the macro whose value failed to evaluate.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: bad value for macro {}: {}",
            self.line, self.name, self.source
        )
    }
}

impl std::error::Error for HeaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Per-core symbol tables scraped from one header file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedHeader {
    /// Encountered core scopes, in order of first appearance.
    pub cores: Vec<String>,
    /// core -> interrupt name -> interrupt number.
    pub interrupts: HashMap<String, HashMap<String, u8>>,
    /// core -> macro name -> resolved value.
    pub defines: HashMap<String, Defines>,
}

impl ParsedHeader {
    /// Scan a whole header given as one string.
    pub fn parse_str(text: &str) -> Result<Self, HeaderError> {
        Self::parse_lines(text.lines())
    }

    /// Scan a header from an ordered sequence of raw lines.
    pub fn parse_lines<I, S>(lines: I) -> Result<Self, HeaderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut irqs = HashMap::<String, HashMap<String, u8>>::new();
        let mut defines = HashMap::<String, Defines>::new();
        irqs.insert(ALL_CORES.to_string(), HashMap::new());
        defines.insert(ALL_CORES.to_string(), Defines::new());

        let mut cores = Vec::<String>::new();
        let mut cur_core = ALL_CORES.to_string();
        let mut accum = String::new();

        for (idx, raw) in lines.into_iter().enumerate() {
            let l = accum.clone() + raw.as_ref().trim();
            if let Some(rest) = l.strip_suffix('\\') {
                accum = rest.to_string();
                continue;
            }
            accum.clear();

            if let Some(core) = core_after(&l, "if defined") {
                trace!("switching to core scope {core}");
                cur_core = core;
                register_core(&mut cores, &cur_core);
            } else if l.contains("else") {
                cur_core = match core_after(&l, "else") {
                    Some(core) => core,
                    // Two-core #if/#else idiom: the else branch belongs
                    // to the second core seen, if any.
                    None if cores.len() > 1 => cores[1].clone(),
                    None => ALL_CORES.to_string(),
                };
                trace!("else branch, core scope now {cur_core}");
                register_core(&mut cores, &cur_core);
            } else if l.contains("endif") {
                cur_core = ALL_CORES.to_string();
            }

            let irq_entry = irqs.entry(cur_core.clone()).or_default();
            let defines_entry = defines.entry(cur_core.clone()).or_default();

            if let Some((name, num)) = irq_decl(&l) {
                irq_entry.insert(name.to_string(), num);
            }

            match define_decl(&l) {
                Some(DefineDecl::Function(name)) => {
                    defines_entry.insert(name, FUNCTION_MACRO);
                }
                Some(DefineDecl::Object(name, value)) => {
                    // FLASH_SIZE is defined inconsistently across the
                    // vendor headers and is never needed downstream.
                    if name != "FLASH_SIZE" {
                        let (value, _) = split_block_comment(value);
                        let resolved =
                            defines_entry.eval(value.trim()).map_err(|source| HeaderError {
                                line: idx + 1,
                                name: name.to_string(),
                                source,
                            })?;
                        defines_entry.insert(name, resolved);
                    }
                }
                None => {}
            }
        }

        if cores.is_empty() {
            cores.push(ALL_CORES.to_string());
        }

        // Back-fill: every core-specific table also sees the shared
        // scope, but its own entries win.
        let all_irqs = irqs.get(ALL_CORES).cloned().unwrap_or_default();
        let all_defines = defines.get(ALL_CORES).cloned().unwrap_or_default();
        for core in &cores {
            if core == ALL_CORES {
                continue;
            }
            let irq_entry = irqs.entry(core.clone()).or_default();
            for (name, num) in &all_irqs {
                irq_entry.entry(name.clone()).or_insert(*num);
            }
            defines.entry(core.clone()).or_default().merge_missing(&all_defines);
        }

        Ok(Self {
            cores,
            interrupts: irqs,
            defines,
        })
    }

    /// Macro table for a core, falling back to the shared scope when the
    /// core is unknown to this header.
    pub fn defines(&self, core_name: &str) -> &Defines {
        let key = if self.defines.contains_key(core_name) && self.interrupts.contains_key(core_name)
        {
            core_name
        } else {
            ALL_CORES
        };
        self.defines.get(key).expect("shared scope always present")
    }

    /// Interrupt table for a core, falling back to the shared scope.
    pub fn interrupts(&self, core_name: &str) -> &HashMap<String, u8> {
        let key = if self.defines.contains_key(core_name) && self.interrupts.contains_key(core_name)
        {
            core_name
        } else {
            ALL_CORES
        };
        self.interrupts.get(key).expect("shared scope always present")
    }
}

fn register_core(cores: &mut Vec<String>, core: &str) {
    if !cores.iter().any(|c| c == core) {
        cores.push(core.to_string());
    }
}

/// Find a `CORE_CM<digits>[PLUS]` pattern after the first occurrence of
/// `marker`, yielding the scope name (`cm7`, `cm0p`, ...).
fn core_after(l: &str, marker: &str) -> Option<String> {
    let after = &l[l.find(marker)? + marker.len()..];
    let mut search = after;
    while let Some(i) = search.find("CORE_CM") {
        let mut c = Cursor::new(&search[i + "CORE_CM".len()..]);
        if let Some(digits) = c.take_digits() {
            let mut core = format!("cm{digits}");
            if c.eat_str("PLUS") {
                core.push('p');
            }
            return Some(core);
        }
        search = &search[i + 1..];
    }
    None
}

/// `<NAME>_IRQn = <digits>` with an optional trailing comma and block
/// comment. Negative numbers are deliberately not matched: the CPU
/// exception entries that use them are not NVIC interrupts.
fn irq_decl(l: &str) -> Option<(&str, u8)> {
    let mut c = Cursor::new(l);
    let name = c.take_ident()?.strip_suffix("_IRQn")?;
    if name.is_empty() {
        return None;
    }
    c.skip_spaces();
    if !c.eat(b'=') {
        return None;
    }
    c.skip_spaces();
    let num: u8 = c.take_digits()?.parse().ok()?;
    c.eat(b',');
    let rest = c.rest().trim_start();
    if rest.is_empty() || rest.starts_with("/*") {
        Some((name, num))
    } else {
        None
    }
}

enum DefineDecl<'a> {
    /// `#define NAME(` -- recorded as defined, value unusable.
    Function(&'a str),
    /// `#define NAME value`.
    Object(&'a str, &'a str),
}

fn define_decl(l: &str) -> Option<DefineDecl<'_>> {
    let mut c = Cursor::new(l.strip_prefix("#define")?);
    c.skip_spaces();
    if c.pos() == 0 {
        return None;
    }
    let name = c.take_ident()?;
    if c.peek() == Some(b'(') {
        return Some(DefineDecl::Function(name));
    }
    if c.peek() != Some(b' ') {
        return None;
    }
    c.skip_spaces();
    Some(DefineDecl::Object(name, c.rest()))
}

fn content_key(text: &str) -> u64 {
    let mut h = DefaultHasher::new();
    text.hash(&mut h);
    h.finish()
}

/// Cache of parsed headers keyed by a hash of the header text.
///
/// Invalidation is by content: edited text hashes to a new key and the
/// stale entry is simply never hit again. The cache is an explicit object
/// owned by the caller; there is no process-wide state.
#[derive(Debug, Default)]
pub struct HeaderCache {
    entries: HashMap<u64, ParsedHeader>,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a header, reusing a previous parse of identical text.
    pub fn parse(&mut self, text: &str) -> Result<&ParsedHeader, HeaderError> {
        let key = content_key(text);
        if !self.entries.contains_key(&key) {
            let parsed = ParsedHeader::parse_str(text)?;
            self.entries.insert(key, parsed);
        }
        Ok(self.entries.get(&key).expect("entry just inserted"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_core_header() {
        let h = ParsedHeader::parse_str(
            "#define PERIPH_BASE 0x40000000UL\n\
             #define TIM2_BASE (PERIPH_BASE + 0x0000UL)\n\
             TIM2_IRQn = 28,   /*!< TIM2 global interrupt */\n",
        )
        .unwrap();
        assert_eq!(h.cores, vec!["all"]);
        assert_eq!(h.defines("all").get("TIM2_BASE"), Some(0x4000_0000));
        assert_eq!(h.interrupts("all").get("TIM2"), Some(&28));
    }

    #[test]
    fn irq_decl_comment_is_optional() {
        assert_eq!(irq_decl("WWDG_IRQn = 0,"), Some(("WWDG", 0)));
        assert_eq!(
            irq_decl("USART1_IRQn                   = 37,     /*!< USART1 */"),
            Some(("USART1", 37))
        );
        assert_eq!(irq_decl("WWDG_IRQn = 0, trailing junk"), None);
        assert_eq!(irq_decl("NonMaskableInt_IRQn = -14,"), None);
    }

    #[test]
    fn function_macro_is_sentinel_not_value() {
        let h = ParsedHeader::parse_str(
            "#define READ_BIT(REG, BIT) ((REG) & (BIT))\n\
             #define VALUE 3\n",
        )
        .unwrap();
        assert_eq!(h.defines("all").get("READ_BIT"), Some(FUNCTION_MACRO));
        assert_eq!(h.defines("all").get("VALUE"), Some(3));
    }

    #[test]
    fn flash_size_is_skipped() {
        let h = ParsedHeader::parse_str("#define FLASH_SIZE (whatever, unparsable)\n").unwrap();
        assert!(!h.defines("all").contains("FLASH_SIZE"));
    }

    #[test]
    fn line_continuation() {
        let split = ParsedHeader::parse_str("#define VAL (0x10 + \\\n 0x20)\n").unwrap();
        let joined = ParsedHeader::parse_str("#define VAL (0x10 + 0x20)\n").unwrap();
        assert_eq!(split.defines("all").get("VAL"), Some(0x30));
        assert_eq!(split.defines("all"), joined.defines("all"));
    }

    #[test]
    fn core_scopes_and_backfill() {
        let h = ParsedHeader::parse_str(
            "#define SHARED 7\n\
             #if defined(CORE_CM7)\n\
             #define WHO 7\n\
             #elif defined(CORE_CM4)\n\
             #define WHO 4\n\
             #endif\n",
        )
        .unwrap();
        assert_eq!(h.cores, vec!["cm7", "cm4"]);
        assert_eq!(h.defines("cm7").get("WHO"), Some(7));
        assert_eq!(h.defines("cm4").get("WHO"), Some(4));
        // Shared macro visible in every scope with the same value.
        for core in ["all", "cm7", "cm4"] {
            assert_eq!(h.defines(core).get("SHARED"), Some(7), "core {core}");
        }
    }

    #[test]
    fn else_falls_back_to_second_core() {
        let h = ParsedHeader::parse_str(
            "#if defined(CORE_CM4)\n\
             #define A 1\n\
             #endif\n\
             #if defined(CORE_CM0PLUS)\n\
             #define B 2\n\
             #endif\n\
             #if defined(CORE_CM4)\n\
             #define C 3\n\
             #else\n\
             #define C 4\n\
             #endif\n",
        )
        .unwrap();
        assert_eq!(h.cores, vec!["cm4", "cm0p"]);
        assert_eq!(h.defines("cm4").get("C"), Some(3));
        assert_eq!(h.defines("cm0p").get("C"), Some(4));
    }

    #[test]
    fn core_backfill_does_not_overwrite() {
        let h = ParsedHeader::parse_str(
            "#if defined(CORE_CM7)\n\
             #define NVIC_PRIO 4\n\
             #else\n\
             #define NVIC_PRIO 3\n\
             #endif\n\
             #define NVIC_PRIO 2\n",
        )
        .unwrap();
        // The unconditional redefinition lands in "all"; the cm7-specific
        // value must survive the back-fill.
        assert_eq!(h.defines("cm7").get("NVIC_PRIO"), Some(4));
        assert_eq!(h.defines("all").get("NVIC_PRIO"), Some(2));
    }

    #[test]
    fn unknown_core_falls_back_to_all() {
        let h = ParsedHeader::parse_str("#define X 1\n").unwrap();
        assert_eq!(h.defines("cm33").get("X"), Some(1));
        assert!(h.interrupts("cm33").is_empty());
    }

    #[test]
    fn unparsable_value_is_fatal_with_context() {
        let err = ParsedHeader::parse_str("#define GOOD 1\n#define BAD foo bar baz\n").unwrap_err();
        assert_eq!(err.line(), 2);
        assert_eq!(err.name(), "BAD");
    }

    #[test]
    fn cache_hits_on_identical_text() {
        let mut cache = HeaderCache::new();
        let text = "#define A 1\n";
        cache.parse(text).unwrap();
        cache.parse(text).unwrap();
        assert_eq!(cache.len(), 1);
        cache.parse("#define A 2\n").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn serializes_for_downstream_emission() {
        let h = ParsedHeader::parse_str("#define A 1\nSPI1_IRQn = 35,\n").unwrap();
        let json = serde_json::to_string(&h).unwrap();
        let back: ParsedHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
