// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Fixed signal vocabularies.
//!
//! A peripheral family (name prefix) determines which interrupt signals
//! its instances can raise. New families are supported by appending table
//! rows, not by touching the decomposer's control flow.

/// Signal vocabulary for a family with no table entry.
pub const DEFAULT_SIGNALS: &[&str] = &["GLOBAL"];

/// Family name prefix -> known signal names. First matching prefix wins.
const FAMILY_SIGNALS: &[(&str, &[&str])] = &[
    ("CAN", &["TX", "RX0", "RX1", "SCE"]),
    ("FDCAN", &["IT0", "IT1", "CAL"]),
    ("I2C", &["ER", "EV"]),
    ("I3C", &["ER", "EV", "WKUP"]),
    ("FMPI2C", &["ER", "EV"]),
    ("TIM", &["BRK", "UP", "TRG", "COM", "CC"]),
    ("RTC", &["ALARM", "WKUP", "TAMP", "STAMP", "SSRU"]),
    ("SUBGHZ", &["RADIO"]),
    ("IPCC", &["C1_RX", "C1_TX", "C2_RX", "C2_TX"]),
    (
        "HRTIM",
        &["MASTER", "TIMA", "TIMB", "TIMC", "TIMD", "TIME", "TIMF", "FLT"],
    ),
    ("COMP", &["WKUP", "ACQ"]),
    ("RCC", &["RCC", "CRS"]),
    ("MDIOS", &["GLOBAL", "WKUP"]),
    ("ETH", &["GLOBAL", "WKUP"]),
    ("LTDC", &["GLOBAL", "ER"]),
    (
        "DFSDM",
        &["FLT0", "FLT1", "FLT2", "FLT3", "FLT4", "FLT5", "FLT6", "FLT7"],
    ),
    ("MDF", &["FLT0", "FLT1", "FLT2", "FLT3", "FLT4", "FLT5", "FLT6", "FLT7"]),
    ("PWR", &["S3WU", "WKUP", "PVD"]),
    ("GTZC", &["GLOBAL", "ILA"]),
    ("WWDG", &["GLOBAL", "RST"]),
    ("USB_OTG_FS", &["GLOBAL", "EP1_OUT", "EP1_IN", "WKUP"]),
    ("USB_OTG_HS", &["GLOBAL", "EP1_OUT", "EP1_IN", "WKUP", "USB"]),
    ("USB", &["LP", "HP", "WKUP"]),
    ("GPU2D", &["ER"]),
    ("SAI", &["A", "B"]),
    ("ADF", &["FLT0"]),
    ("RAMECC", &["ECC"]),
];

/// Known signals for a peripheral instance, by family name prefix.
pub fn valid_signals(peri: &str) -> &'static [&'static str] {
    for (prefix, signals) in FAMILY_SIGNALS {
        if peri.starts_with(prefix) {
            return signals;
        }
    }
    DEFAULT_SIGNALS
}

/// Fixed-name CPU exception vectors; never decomposed into signals.
pub const CPU_EXCEPTIONS: &[&str] = &[
    "NonMaskableInt",
    "HardFault",
    "MemoryManagement",
    "BusFault",
    "UsageFault",
    "SVCall",
    "DebugMonitor",
    "PendSV",
    "SysTick",
];

/// Clock-related vector name tokens that always denote an RCC signal,
/// regardless of the current peripheral context.
pub fn clock_signal(token: &str) -> Option<&'static str> {
    match token {
        "LSECSS" => Some("LSECSS"),
        "CSS" => Some("CSS"),
        "LSE" => Some("LSE"),
        "CRS" => Some("CRS"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_prefix_lookup() {
        assert_eq!(valid_signals("TIM15"), ["BRK", "UP", "TRG", "COM", "CC"]);
        assert_eq!(valid_signals("I2C3"), ["ER", "EV"]);
        assert_eq!(valid_signals("SPI1"), ["GLOBAL"]);
    }

    #[test]
    fn usb_otg_wins_over_usb() {
        // USB_OTG_FS must not fall into the plain USB family; the table
        // is ordered so the longer prefix is checked first.
        assert_eq!(
            valid_signals("USB_OTG_FS"),
            ["GLOBAL", "EP1_OUT", "EP1_IN", "WKUP"]
        );
        assert_eq!(valid_signals("USB"), ["LP", "HP", "WKUP"]);
    }

    #[test]
    fn clock_tokens() {
        assert_eq!(clock_signal("LSECSS"), Some("LSECSS"));
        assert_eq!(clock_signal("CRS"), Some("CRS"));
        assert_eq!(clock_signal("BRK"), None);
    }
}
