// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Interrupt vector name tokenizer.
//!
//! Vector names are `_`-separated tokens, except that some tokens contain
//! an underscore themselves (`OTG_FS`, `C1_RX`, ...). Those exceptions
//! are tried first, in order, before the catch-all rule; a numeric group
//! like the `_2` in `ADC1_2` sticks to the preceding token.

use crate::text_utils::{is_token_char, Cursor};

/// Multi-word tokens tried, in order, before the catch-all rule.
/// `EP<n>_IN` / `EP<n>_OUT` is handled separately because of the
/// embedded endpoint number.
const MULTI_TOKENS: &[&str] = &[
    "SPDIF_RX",
    "OTG_FS",
    "OTG_HS",
    "USB_DRD_FS",
    "USB_FS",
    "C1_RX",
    "C1_TX",
    "C2_RX",
    "C2_TX",
];

/// Split an interrupt vector name into ordered uppercase tokens.
///
/// `I2C1_EV` becomes `["I2C1", "EV"]`; `OTG_FS_WKUP` keeps `OTG_FS`
/// together; `ADC1_2` stays a single token.
pub fn tokenize_vector_name(name: &str) -> Vec<String> {
    let name = name.to_ascii_uppercase();
    let bytes = name.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if let Some(len) = match_multi_token(&name[pos..]) {
            tokens.push(name[pos..pos + len].to_string());
            pos += len;
        } else if is_token_char(bytes[pos]) {
            let start = pos;
            while pos < bytes.len() && is_token_char(bytes[pos]) {
                pos += 1;
            }
            // Pull in trailing `_<digits>` groups.
            while bytes.get(pos) == Some(&b'_')
                && bytes.get(pos + 1).is_some_and(|b| b.is_ascii_digit())
            {
                pos += 2;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            tokens.push(name[start..pos].to_string());
        } else {
            // Separator or stray byte.
            pos += 1;
        }
    }
    tokens
}

fn match_multi_token(s: &str) -> Option<usize> {
    if let Some(lit) = MULTI_TOKENS.iter().find(|lit| s.starts_with(**lit)) {
        return Some(lit.len());
    }
    // EP<n>_IN / EP<n>_OUT
    let mut c = Cursor::new(s);
    if c.eat_str("EP") && c.take_digits().is_some() && c.eat(b'_') && (c.eat_str("IN") || c.eat_str("OUT"))
    {
        return Some(c.pos());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(name: &str) -> Vec<String> {
        tokenize_vector_name(name)
    }

    #[test]
    fn simple_split() {
        assert_eq!(toks("I2C1_EV"), ["I2C1", "EV"]);
        assert_eq!(toks("TIM1_BRK_TIM15"), ["TIM1", "BRK", "TIM15"]);
        assert_eq!(toks("USART1"), ["USART1"]);
    }

    #[test]
    fn multi_word_exceptions() {
        assert_eq!(toks("OTG_FS_WKUP"), ["OTG_FS", "WKUP"]);
        assert_eq!(toks("OTG_HS_EP1_OUT"), ["OTG_HS", "EP1_OUT"]);
        assert_eq!(toks("SPDIF_RX"), ["SPDIF_RX"]);
        assert_eq!(toks("IPCC_C1_RX"), ["IPCC", "C1_RX"]);
        assert_eq!(toks("USB_FS_WKUP"), ["USB_FS", "WKUP"]);
        assert_eq!(toks("USB_DRD_FS"), ["USB_DRD_FS"]);
    }

    #[test]
    fn digit_groups_stick_to_token() {
        assert_eq!(toks("ADC1_2"), ["ADC1_2"]);
        assert_eq!(toks("UCPD1_2"), ["UCPD1_2"]);
        assert_eq!(toks("DMA1_Channel4_5"), ["DMA1", "CHANNEL4_5"]);
        assert_eq!(toks("EXTI15_10"), ["EXTI15_10"]);
    }

    #[test]
    fn input_is_uppercased() {
        assert_eq!(toks("UsbWakeUp"), ["USBWAKEUP"]);
    }
}
