// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Macro symbol table.
//!
//! One [`Defines`] table exists per execution-core scope while a header is
//! being scanned. Values are `i64`: resolved constants are non-negative
//! 32-bit quantities, and function-like macros are recorded with the
//! sentinel [`FUNCTION_MACRO`] so they count as "defined" without carrying
//! a usable value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::expr::{self, EvalError};

/// Sentinel value for function-like macros.
pub const FUNCTION_MACRO: i64 = -1;

/// Alternate define names some peripherals publish their base address
/// under. Keyed by peripheral instance name; candidates are tried in
/// order.
const ALT_BASE_DEFINES: &[(&str, &[&str])] = &[
    ("DBGMCU", &["DBGMCU_BASE", "DBG_BASE"]),
    ("QUADSPI", &["QUADSPI_BASE", "QSPI_R", "QSPI_R_BASE", "QSPI_REG_BASE"]),
    ("QUADSPI1", &["QUADSPI1_BASE", "QSPI_R", "QSPI_R_BASE", "QSPI_REG_BASE"]),
    ("FLASH", &["FLASH_R_BASE", "FLASH_REG_BASE"]),
    (
        "ADC_COMMON",
        &["ADC_COMMON", "ADC1_COMMON", "ADC12_COMMON", "ADC123_COMMON"],
    ),
    ("ADC3_COMMON", &["ADC3_COMMON", "ADC4_COMMON", "ADC34_COMMON"]),
    ("CAN", &["CAN_BASE", "CAN1_BASE"]),
    ("FMC", &["FMC_BASE", "FMC_R_BASE"]),
    ("FSMC", &["FSMC_R_BASE"]),
    ("USB", &["USB_BASE", "USB_DRD_BASE", "USB_BASE_NS", "USB_DRD_BASE_NS"]),
    (
        "USBRAM",
        &["USB_PMAADDR", "USB_DRD_PMAADDR", "USB_PMAADDR_NS", "USB_DRD_PMAADDR_NS"],
    ),
    ("FDCANRAM", &["SRAMCAN_BASE", "SRAMCAN_BASE_NS"]),
    ("VREFINTCAL", &["VREFINT_CAL_ADDR_CMSIS"]),
];

/// Mapping from macro name to resolved integer value.
///
/// Redefinition overwrites. Lookup of a missing name is not an error at
/// this level; the expression evaluator resolves unknown identifiers to 0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defines(HashMap<String, i64>);

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a macro's resolved value.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    /// True if the macro is present, including function-like sentinels.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert or overwrite a macro.
    pub fn insert(&mut self, name: impl Into<String>, val: i64) {
        self.0.insert(name.into(), val);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Evaluate a constant expression against this table.
    pub fn eval(&self, val: &str) -> Result<i64, EvalError> {
        expr::eval(val, self)
    }

    /// Copy every entry of `other` that is not already present.
    ///
    /// Used to back-fill core-specific tables from the "all" scope;
    /// core-specific values take precedence and are never overwritten.
    pub fn merge_missing(&mut self, other: &Defines) {
        for (name, val) in &other.0 {
            self.0.entry(name.clone()).or_insert(*val);
        }
    }

    /// Resolve a peripheral instance's base address from the table.
    ///
    /// Tries the instance's alternate define names if it has any, then
    /// `<NAME>_BASE`, then the bare name. Zero-valued defines are
    /// skipped: some headers define a base to 0 for absent peripherals.
    pub fn peri_base_addr(&self, pname: &str) -> Option<u32> {
        let candidates: Vec<String> = match ALT_BASE_DEFINES.iter().find(|(p, _)| *p == pname) {
            Some((_, alts)) => alts.iter().map(|s| s.to_string()).collect(),
            None => vec![format!("{pname}_BASE"), pname.to_string()],
        };
        candidates
            .into_iter()
            .find_map(|d| self.get(&d).filter(|&addr| addr != 0))
            .map(|addr| addr as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites() {
        let mut d = Defines::new();
        d.insert("A", 1);
        d.insert("A", 2);
        assert_eq!(d.get("A"), Some(2));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn merge_missing_keeps_existing() {
        let mut core = Defines::new();
        core.insert("SHARED", 10);
        let mut all = Defines::new();
        all.insert("SHARED", 99);
        all.insert("ONLY_ALL", 7);
        core.merge_missing(&all);
        assert_eq!(core.get("SHARED"), Some(10));
        assert_eq!(core.get("ONLY_ALL"), Some(7));
    }

    #[test]
    fn base_addr_prefers_alternates() {
        let mut d = Defines::new();
        d.insert("FLASH_R_BASE", 0x4002_2000);
        d.insert("FLASH", 0x0800_0000);
        assert_eq!(d.peri_base_addr("FLASH"), Some(0x4002_2000));
    }

    #[test]
    fn base_addr_skips_zero_values() {
        let mut d = Defines::new();
        d.insert("TIM1_BASE", 0);
        d.insert("TIM1", 0x4001_0000);
        assert_eq!(d.peri_base_addr("TIM1"), Some(0x4001_0000));
        assert_eq!(d.peri_base_addr("TIM9"), None);
    }

    #[test]
    fn function_macro_sentinel() {
        let mut d = Defines::new();
        d.insert("READ_BIT", FUNCTION_MACRO);
        assert!(d.contains("READ_BIT"));
        assert_eq!(d.get("READ_BIT"), Some(-1));
    }
}
