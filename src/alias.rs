// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Peripheral alias resolution.
//!
//! Maps a name fragment from a vector name to the peripheral instance
//! names it denotes on the current chip. Vendor vector tables and
//! instance tables disagree on naming in many small ways; the override
//! table absorbs the known one-offs, and the numeric rules handle the
//! regular `UART4`/`I2C1_2` shapes.

/// One-off vendor renames. An entry applies only when the fragment
/// matches and the substitute instance actually exists on the chip.
const PERI_OVERRIDE: &[(&str, &[&str])] = &[
    ("USB_FS", &["USB"]),
    ("USB_DRD_FS", &["USB"]),
    ("OTG_HS", &["USB_OTG_HS"]),
    ("OTG_FS", &["USB_OTG_FS"]),
    ("USB", &["USB_DRD_FS"]),
    ("UCPD1_2", &["UCPD1", "UCPD2"]),
    ("ADC1", &["ADC"]),
    ("CEC", &["HDMI_CEC"]),
    ("SPDIF_RX", &["SPDIFRX1", "SPDIFRX"]),
    ("CAN1", &["CAN"]),
    ("TEMP", &["TEMPSENS"]),
    ("DSI", &["DSIHOST"]),
    ("HRTIM1", &["HRTIM"]),
    ("GTZC", &["GTZC_S"]),
    ("TZIC", &["GTZC_S"]),
];

/// Resolve a name fragment against the chip's instance list.
///
/// Checked in order, first match wins: the override table; numeric-suffix
/// expansion (`I2C1_2` means `I2C1` and `I2C2`, all-or-nothing); a
/// prefix-plus-number fallback. An empty result means the fragment does
/// not name a peripheral and should be read as a signal token.
pub fn match_peripherals(name: &str, peris: &[String]) -> Vec<String> {
    if let Some((_, subst)) = PERI_OVERRIDE.iter().find(|(frag, _)| *frag == name) {
        let res: Vec<String> = subst
            .iter()
            .filter(|p| peris.iter().any(|x| x == **p))
            .map(|p| p.to_string())
            .collect();
        if !res.is_empty() {
            return res;
        }
    }

    if let Some((base, groups)) = split_numbered(name) {
        // Every expanded instance must exist, otherwise the whole
        // fragment is not a peripheral reference.
        let mut res = Vec::new();
        for group in groups.split('_') {
            let p = format!("{base}{group}");
            if !peris.contains(&p) {
                return Vec::new();
            }
            res.push(p);
        }
        return res;
    }

    peris
        .iter()
        .filter(|p| {
            p.as_str() == name
                || p.strip_prefix(name)
                    .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        })
        .cloned()
        .collect()
}

/// Split `<letters><digits>[_<digits>]*` into base and digit groups.
/// `I2C` is special-cased because of its embedded digit.
fn split_numbered(name: &str) -> Option<(&str, &str)> {
    if let Some(rest) = name.strip_prefix("I2C") {
        if digit_groups_ok(rest) {
            return Some(("I2C", rest));
        }
    }
    let idx = name
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(name.len());
    if idx == 0 || idx == name.len() {
        return None;
    }
    let (base, rest) = name.split_at(idx);
    digit_groups_ok(rest).then_some((base, rest))
}

fn digit_groups_ok(s: &str) -> bool {
    !s.is_empty()
        && s.split('_')
            .all(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()))
}
