// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Interrupt vector decomposition.
//!
//! A vendor vector table row names a vector and, loosely, the peripherals
//! it serves. This module decides which (peripheral instance, signal)
//! pairs each vector actually triggers: DMA rows expand channel ranges,
//! EXTI rows expand line lists, and everything else is decomposed by
//! walking the tokens of the vector name against the row's declared
//! instances. The result is deterministic for a given table and instance
//! list.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::alias::match_peripherals;
use crate::signals::{clock_signal, valid_signals, CPU_EXCEPTIONS};
use crate::tokenizer::tokenize_vector_name;

/// Flags marking a row as DMA-shaped (controller/channel-range fields).
const DMA_FLAGS: &[&str] = &["DMA", "DMAL0", "DMAF0", "DMAL0_DMAMUX", "DMAF0_DMAMUX"];

/// One (signal, vector) association on a peripheral instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeripheralInterrupt {
    pub signal: String,
    pub interrupt: String,
}

/// One row of the vendor vector table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorRow {
    /// Vector name, without the `_IRQn` suffix.
    pub name: String,
    /// Ordinal position in the vendor table.
    pub pos: usize,
    /// Flag annotations (`DMA`, `EXTI`, `2V`, ...).
    pub flags: Vec<String>,
    /// Peripheral instance field, split on commas. For EXTI rows this
    /// holds the line list instead.
    pub peripherals: Vec<String>,
    /// DMA rows: controller names, parallel to `dma_channels`.
    pub dma_controllers: Vec<String>,
    /// DMA rows: per-controller channel spec, `from` or `from,to`.
    pub dma_channels: Vec<String>,
}

impl VectorRow {
    /// Parse one colon-joined vendor row:
    /// `NAME_IRQn:flags:peripherals:dma-controllers:dma-channels`.
    ///
    /// Controllers are comma-separated; channel specs are separated by
    /// `;` because a spec may itself contain a comma (`4,7` is the
    /// inclusive range).
    pub fn parse(raw: &str, pos: usize) -> Result<Self, DecomposeError> {
        let parts: Vec<&str> = raw.split(':').collect();
        let [name, flags, peris, dmas, chans] = parts[..] else {
            return Err(DecomposeError::MalformedRow { row: raw.to_string() });
        };
        let name = name.strip_suffix("_IRQn").unwrap_or(name).to_string();
        Ok(Self {
            name,
            pos,
            flags: split_list(flags),
            peripherals: split_list(peris),
            dma_controllers: split_list(dmas),
            dma_channels: chans.split(';').filter(|s| !s.is_empty()).map(str::to_string).collect(),
        })
    }

    /// Parse a whole vendor table, assigning ordinal positions.
    pub fn parse_table<S: AsRef<str>>(rows: &[S]) -> Result<Vec<Self>, DecomposeError> {
        rows.iter()
            .enumerate()
            .map(|(pos, raw)| Self::parse(raw.as_ref(), pos))
            .collect()
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').filter(|x| !x.is_empty()).map(str::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecomposeError {
    /// Row doesn't have the expected field shape.
    MalformedRow { row: String },
    /// A decomposed signal is not in the peripheral family's vocabulary.
    /// Surfaces vendor-table assumptions that no longer hold for a new
    /// family; must not be swallowed.
    UnknownSignal {
        peripheral: String,
        signal: String,
        vector: String,
    },
    /// A signal token appeared before any peripheral context was
    /// established.
    MissingContext { vector: String, token: String },
    /// More than one vector claims the same (peripheral, signal) pair
    /// even after duplicate resolution.
    AmbiguousVector {
        peripheral: String,
        signal: String,
        vectors: Vec<String>,
    },
}

impl fmt::Display for DecomposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRow { row } => write!(f, "malformed vector table row: {row:?}"),
            Self::UnknownSignal {
                peripheral,
                signal,
                vector,
            } => write!(
                f,
                "unknown signal {signal} for peripheral {peripheral} in vector {vector}"
            ),
            Self::MissingContext { vector, token } => write!(
                f,
                "signal token {token} in vector {vector} has no peripheral context"
            ),
            Self::AmbiguousVector {
                peripheral,
                signal,
                vectors,
            } => write!(
                f,
                "multiple vectors for {peripheral} signal {signal}: {vectors:?}"
            ),
        }
    }
}

impl std::error::Error for DecomposeError {}

/// Decompose a chip variant's vector table into per-peripheral signal
/// associations.
///
/// `peripherals` is the chip's instance list; rows mentioning instances
/// outside it contribute associations that are simply never emitted.
/// Output lists are sorted by (signal, vector) and deduplicated, so the
/// result is identical across runs.
pub fn decompose(
    chip_name: &str,
    rows: &[VectorRow],
    peripherals: &[String],
) -> Result<BTreeMap<String, Vec<PeripheralInterrupt>>, DecomposeError> {
    // peripheral -> signal -> owning vectors
    let mut chip_signals = BTreeMap::<String, BTreeMap<String, BTreeSet<String>>>::new();

    for row in rows {
        for (peri, signal, vector) in decompose_row(chip_name, row)? {
            chip_signals
                .entry(peri)
                .or_default()
                .entry(signal)
                .or_default()
                .insert(vector);
        }
    }

    let mut out = BTreeMap::new();
    for peri in peripherals {
        let Some(signals) = chip_signals.get(peri) else {
            continue;
        };
        let globals = signals.get("GLOBAL").cloned().unwrap_or_default();
        let mut irqs = Vec::new();
        for (signal, vectors) in signals {
            let mut vectors = vectors.clone();
            // A shared vector often shows up both as somebody's GLOBAL
            // and as a named signal elsewhere; the named use wins.
            if vectors.len() != 1 && signal != "GLOBAL" {
                vectors.retain(|v| !globals.contains(v));
            }
            // Still tied: prefer the vector not named after the
            // peripheral itself.
            if vectors.len() != 1 && signal != "GLOBAL" {
                vectors.retain(|v| v != peri);
            }
            if vectors.len() != 1 {
                return Err(DecomposeError::AmbiguousVector {
                    peripheral: peri.clone(),
                    signal: signal.clone(),
                    vectors: vectors.into_iter().collect(),
                });
            }
            for vector in vectors {
                irqs.push(PeripheralInterrupt {
                    signal: signal.clone(),
                    interrupt: vector,
                });
            }
        }
        irqs.sort();
        irqs.dedup();
        out.insert(peri.clone(), irqs);
    }
    Ok(out)
}

fn push(triples: &mut Vec<(String, String, String)>, peri: &str, signal: &str, vector: &str) {
    triples.push((peri.to_string(), signal.to_string(), vector.to_string()));
}

/// Decompose one row into (peripheral, signal, vector) triples.
fn decompose_row(
    chip_name: &str,
    row: &VectorRow,
) -> Result<Vec<(String, String, String)>, DecomposeError> {
    let mut name = row.name.clone();

    // Typo in some L0/L4 tables: the vector name claims RNG but the row
    // doesn't carry it.
    if name == "AES_RNG_LPUART1" && !row_mentions(row, "RNG") {
        name = "AES_LPUART1".to_string();
    }
    let name = name.replace("USAR11", "USART11");

    trace!("vector {name} (slot {})", row.pos);

    // F100xE MISC_REMAP gives two names to the same IRQ number; drop the
    // remapped duplicate.
    if chip_name.starts_with("STM32F100") && name == "DMA2_Channel4_5" {
        return Ok(Vec::new());
    }
    if name == "LSECSSD" {
        return Ok(Vec::new());
    }

    let mut triples = Vec::new();

    if CPU_EXCEPTIONS.contains(&name.as_str()) {
        // Fixed CPU exception, no signal decomposition.
    } else if row.flags.iter().any(|f| DMA_FLAGS.contains(&f.as_str())) {
        if row.dma_controllers.len() != row.dma_channels.len() {
            return Err(DecomposeError::MalformedRow {
                row: format!("{name}: {:?} vs {:?}", row.dma_controllers, row.dma_channels),
            });
        }
        for (dma, chan) in row.dma_controllers.iter().zip(&row.dma_channels) {
            let range = parse_channel_range(chan).ok_or_else(|| DecomposeError::MalformedRow {
                row: format!("{name}: bad channel spec {chan:?}"),
            })?;
            for ch in range {
                push(&mut triples, dma, &format!("CH{ch}"), &name);
            }
        }
    } else if matches!(name.as_str(), "DMAMUX1" | "DMAMUX1_S" | "DMAMUX_OVR" | "DMAMUX1_OVR") {
        push(&mut triples, "DMAMUX1", "OVR", &name);
    } else if name == "DMAMUX2_OVR" {
        push(&mut triples, "DMAMUX2", "OVR", &name);
    } else if row.flags.iter().any(|f| f == "EXTI") {
        for line in &row.peripherals {
            push(&mut triples, "EXTI", line, &name);
        }
    } else if name == "FLASH" {
        push(&mut triples, "FLASH", "GLOBAL", &name);
    } else if name == "CRS" {
        push(&mut triples, "RCC", "CRS", &name);
    } else if name == "RCC" {
        push(&mut triples, "RCC", "GLOBAL", &name);
    } else if name == "RNG_CRYP" {
        push(&mut triples, "RNG", "GLOBAL", &name);
        push(&mut triples, "CRYP", "GLOBAL", &name);
    } else if name == "WWDG_IWDG" {
        push(&mut triples, "WWDG", "GLOBAL", &name);
        push(&mut triples, "IWDG", "GLOBAL", &name);
    } else if name == "RCC_AUDIOSYNC" {
        // Not a peripheral interrupt we model.
    } else {
        if row.peripherals.is_empty() {
            trace!("  no declared peripherals, skipping");
            return Ok(Vec::new());
        }

        let peri_names: Vec<String> = row
            .peripherals
            .iter()
            .map(|p| match p.as_str() {
                "USB_DRD_FS" => "USB",
                "XPI1" => "XSPI1",
                "XPI2" => "XSPI2",
                other => other,
            })
            .map(str::to_string)
            .collect();

        trace!("  instances: {peri_names:?}");

        let walk_name = if name == "USBWakeUp" || name == "USBWakeUp_RMP" {
            "USB_WKUP"
        } else {
            name.strip_suffix("_S").unwrap_or(&name)
        };

        let mut peri_signals: BTreeMap<String, Vec<String>> =
            peri_names.iter().map(|p| (p.clone(), Vec::new())).collect();

        let mut curr_peris = Vec::new();
        if peri_names.len() == 1 {
            curr_peris = peri_names.clone();
        }

        for token in tokenize_vector_name(walk_name) {
            let token = if token == "TAMPER" { "TAMP".to_string() } else { token };
            if let Some(signal) = clock_signal(&token) {
                push(&mut triples, "RCC", signal, &name);
                continue;
            }
            let matched = match_peripherals(&token, &peri_names);
            trace!("  token {token} -> {matched:?}");
            if !matched.is_empty() {
                curr_peris = matched;
            } else {
                if curr_peris.is_empty() {
                    return Err(DecomposeError::MissingContext {
                        vector: name.clone(),
                        token,
                    });
                }
                for p in &curr_peris {
                    peri_signals.entry(p.clone()).or_default().push(token.clone());
                }
            }
        }

        for (peri, mut sigs) in peri_signals {
            let known = valid_signals(&peri);
            if sigs.is_empty() {
                // Undecorated shared vector: assume every signal the
                // family can raise, except comparators which only wake.
                if peri.starts_with("COMP") {
                    sigs = vec!["WKUP".to_string()];
                } else {
                    sigs = known.iter().map(|s| s.to_string()).collect();
                }
            }
            for signal in sigs {
                if !known.contains(&signal.as_str()) {
                    return Err(DecomposeError::UnknownSignal {
                        peripheral: peri,
                        signal,
                        vector: name,
                    });
                }
                push(&mut triples, &peri, &signal, &name);
            }
        }
    }

    Ok(triples)
}

fn row_mentions(row: &VectorRow, what: &str) -> bool {
    row.peripherals
        .iter()
        .chain(&row.dma_controllers)
        .chain(&row.dma_channels)
        .flat_map(|f| f.split(','))
        .any(|f| f == what)
}

/// `from` or `from,to`, inclusive.
fn parse_channel_range(spec: &str) -> Option<std::ops::RangeInclusive<usize>> {
    let (from, to) = match spec.split_once(',') {
        Some((a, b)) => (a.parse().ok()?, b.parse().ok()?),
        None => {
            let n = spec.parse().ok()?;
            (n, n)
        }
    };
    Some(from..=to)
}
