// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! End-to-end flow over a small synthetic vendor header and vector table.

use chipforge::{decompose, HeaderCache, VectorRow};

const HEADER: &str = "\
/* Peripheral memory map */
#define PERIPH_BASE           0x40000000UL
#define APB1PERIPH_BASE       PERIPH_BASE
#define APB2PERIPH_BASE       (PERIPH_BASE + 0x00010000UL)
#define TIM2_BASE             (APB1PERIPH_BASE + 0x0000UL)
#define USART1_BASE           (APB2PERIPH_BASE + 0x3800UL)
#define FLASH_R_BASE          (PERIPH_BASE + 0x00022000UL)
#define READ_BIT(REG, BIT)    ((REG) & (BIT))
#if defined(CORE_CM7)
#define NVIC_PRIO_BITS 4U
  WWDG_IRQn = 0,      /*!< Window WatchDog interrupt */
  TIM2_IRQn = 28,     /*!< TIM2 global interrupt */
#else
#define NVIC_PRIO_BITS 3U
  WWDG_IRQn = 0,      /*!< Window WatchDog interrupt */
#endif
  USART1_IRQn = 37,   /*!< USART1 global interrupt */
";

#[test]
fn header_to_tables_to_associations() {
    let mut cache = HeaderCache::new();
    let h = cache.parse(HEADER).unwrap();

    assert_eq!(h.cores, vec!["cm7", "all"]);

    // Chained base-address macros resolve through the running table.
    let d = h.defines("cm7");
    assert_eq!(d.get("TIM2_BASE"), Some(0x4000_0000));
    assert_eq!(d.get("USART1_BASE"), Some(0x4001_3800));
    assert_eq!(d.peri_base_addr("TIM2"), Some(0x4000_0000));
    assert_eq!(d.peri_base_addr("FLASH"), Some(0x4002_2000));
    assert_eq!(d.get("NVIC_PRIO_BITS"), Some(4));
    assert_eq!(h.defines("all").get("NVIC_PRIO_BITS"), Some(3));

    // IRQ numbers land per core, shared entries back-filled.
    assert_eq!(h.interrupts("cm7").get("TIM2"), Some(&28));
    assert_eq!(h.interrupts("cm7").get("USART1"), Some(&37));
    assert!(!h.interrupts("all").contains_key("TIM2"));

    // Vector table rows for the same part.
    let rows = VectorRow::parse_table(&[
        "WWDG_IRQn::WWDG::",
        "TIM2_IRQn::TIM2::",
        "USART1_IRQn::USART1::",
        "DMA1_Channel2_3_IRQn:DMA::DMA1:2,3",
    ])
    .unwrap();
    let peris: Vec<String> = ["WWDG", "TIM2", "USART1", "DMA1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let out = decompose("STM32F767ZI", &rows, &peris).unwrap();

    assert_eq!(out["USART1"].len(), 1);
    assert_eq!(out["USART1"][0].signal, "GLOBAL");
    assert_eq!(out["USART1"][0].interrupt, "USART1");

    // TIM2 is alone on its vector, so it claims the timer vocabulary.
    let tim2: Vec<&str> = out["TIM2"].iter().map(|i| i.signal.as_str()).collect();
    assert_eq!(tim2, ["BRK", "CC", "COM", "TRG", "UP"]);

    let dma1: Vec<&str> = out["DMA1"].iter().map(|i| i.signal.as_str()).collect();
    assert_eq!(dma1, ["CH2", "CH3"]);

    // Every decomposed vector exists in the header's interrupt table.
    let irqs = h.interrupts("cm7");
    for assoc in out.values().flatten() {
        let base = assoc
            .interrupt
            .split("_Channel")
            .next()
            .unwrap_or(&assoc.interrupt);
        assert!(
            irqs.contains_key(&assoc.interrupt) || base == "DMA1",
            "vector {} not in header",
            assoc.interrupt
        );
    }
}
