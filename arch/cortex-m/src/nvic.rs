// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Cortex-M NVIC
//!
//! Most NVIC configuration is in the NVIC registers:
//! <https://developer.arm.com/docs/100165/0201/nested-vectored-interrupt-controller/nvic-programmers-model/table-of-nvic-registers>
//!
//! The ICTR sits outside the SCB but describes the NVIC, so it is included
//! here as well.
//!
//! Priorities are handled in two spaces. Drivers think in logical levels,
//! 0 being the most urgent level a device interrupt may use. The hardware
//! byte is that level shifted past the levels reserved for faults and
//! zero latency interrupts and then into the implemented upper bits of the
//! priority field. [`PriorityConfig`] does the translation.

use hal_utils::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hal_utils::registers::{register_bitfields, register_structs, Field, ReadOnly, ReadWrite};
use hal_utils::{ErrorCode, StaticRef};

register_structs! {
    /// NVIC Registers.
    ///
    /// Note this generic interface exposes all possible NVICs. Most cores will
    /// not implement all NVIC_XXXX registers. If you need to find the number
    /// of NVICs dynamically, consult `ICTR.INTLINESNUM`.
    pub NvicRegisters {
        (0x000 => _reserved0),

        /// Interrupt Controller Type Register
        (0x004 => ictr: ReadOnly<u32, InterruptControllerType::Register>),

        (0x008 => _reserved1),

        /// Interrupt Set-Enable Registers
        (0x100 => iser: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        /// Interrupt Clear-Enable Registers
        (0x180 => icer: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        /// Interrupt Set-Pending Registers
        (0x200 => ispr: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        /// Interrupt Clear-Pending Registers
        (0x280 => icpr: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        /// Interrupt Active Bit Registers
        (0x300 => iabr: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        (0x380 => _reserved2),

        /// Interrupt Priority Registers
        (0x400 => ipr: [ReadWrite<u32, NvicInterruptPriority::Register>; 252]),

        (0x7f0 => @END),
    }
}

register_bitfields![u32,
    InterruptControllerType [
        /// Total number of interrupt lines in groups of 32
        INTLINESNUM     OFFSET(0)   NUMBITS(4)
    ],

    NvicSetClear [
        /// For register NVIC_XXXXn, access interrupt (m+(32*n)).
        BITS            OFFSET(0)   NUMBITS(32)
    ],

    NvicInterruptPriority [
        /// For register NVIC_IPRn, priority of interrupt number 4n+3.
        PRI_N3          OFFSET(24)  NUMBITS(8),
        PRI_N2          OFFSET(16)  NUMBITS(8),
        PRI_N1          OFFSET(8)   NUMBITS(8),
        /// For register NVIC_IPRn, priority of interrupt number 4n.
        PRI_N0          OFFSET(0)   NUMBITS(8)
    ]
];

/// The NVIC peripheral in MMIO space.
pub const NVIC_BASE: StaticRef<NvicRegisters> =
    unsafe { StaticRef::new(0xe000e000 as *const NvicRegisters) };

/// Highest interrupt number an NVIC can implement, plus one.
pub const MAX_INTERRUPTS: u32 = 496;

/// How the 8-bit priority field is split between exceptions and device
/// interrupts.
///
/// The `exc_*` functions return hardware priority bytes. The `*_reserved_prio`
/// and `irq_prio_*` functions count logical levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PriorityConfig {
    /// Implemented priority bits, counted from bit 7 of the field. 1 to 8.
    prio_bits: u8,
    /// Reserve the most urgent level for interrupts the kernel never masks.
    zero_latency_irqs: bool,
    /// The core can lower fault priorities (ARMv7-M and up). One level is
    /// kept above every device interrupt for them.
    programmable_fault_prio: bool,
}

impl Default for PriorityConfig {
    /// nRF52: three priority bits on a Cortex-M4.
    fn default() -> Self {
        PriorityConfig {
            prio_bits: 3,
            zero_latency_irqs: false,
            programmable_fault_prio: true,
        }
    }
}

impl PriorityConfig {
    /// nRF51: two priority bits on a Cortex-M0, faults are fixed.
    pub const ARMV6M: PriorityConfig = PriorityConfig {
        prio_bits: 2,
        zero_latency_irqs: false,
        programmable_fault_prio: false,
    };

    /// Refuses configurations that leave no level for device interrupts.
    pub const fn new(
        prio_bits: u8,
        zero_latency_irqs: bool,
        programmable_fault_prio: bool,
    ) -> Result<PriorityConfig, ErrorCode> {
        let config = PriorityConfig {
            prio_bits,
            zero_latency_irqs,
            programmable_fault_prio,
        };
        if prio_bits == 0 || prio_bits > 8 || config.irq_prio_levels() == 0 {
            return Err(ErrorCode::INVAL);
        }
        Ok(config)
    }

    pub const fn prio_bits(&self) -> u8 {
        self.prio_bits
    }

    pub const fn zero_latency_irqs(&self) -> bool {
        self.zero_latency_irqs
    }

    pub const fn programmable_fault_prio(&self) -> bool {
        self.programmable_fault_prio
    }

    /// Hardware priority byte for logical level `p`.
    pub const fn exc_prio(&self, p: u8) -> u8 {
        ((p as u32) << (8 - self.prio_bits as u32) & 0xff) as u8
    }

    pub const fn exception_reserved_prio(&self) -> u8 {
        self.programmable_fault_prio as u8
    }

    pub const fn zero_latency_reserved_prio(&self) -> u8 {
        self.zero_latency_irqs as u8
    }

    /// Logical level of the most urgent device interrupt.
    pub const fn irq_prio_offset(&self) -> u8 {
        self.exception_reserved_prio() + self.zero_latency_reserved_prio()
    }

    pub const fn exc_fault_prio(&self) -> u8 {
        self.exc_prio(0)
    }

    pub const fn exc_zero_latency_irqs_prio(&self) -> u8 {
        self.exc_prio(0)
    }

    /// SVCall runs below zero latency interrupts, which share level 0 with
    /// faults.
    pub const fn exc_svc_prio(&self) -> u8 {
        self.exc_prio(self.zero_latency_reserved_prio())
    }

    pub const fn exc_irq_default_prio(&self) -> u8 {
        self.exc_prio(self.irq_prio_offset())
    }

    /// PendSV sits at the least urgent implemented level.
    pub const fn exc_pendsv_prio(&self) -> u8 {
        self.exc_prio(0xff)
    }

    /// Number of levels left for device interrupts.
    pub const fn irq_prio_levels(&self) -> u16 {
        let total = 1u16 << (self.prio_bits as u32);
        let offset = self.irq_prio_offset() as u16;
        if offset >= total {
            0
        } else {
            total - offset
        }
    }

    pub const fn irq_prio_lowest(&self) -> u8 {
        self.irq_prio_levels().saturating_sub(1) as u8
    }
}

/// The NVIC as a whole, for chip setup and the interrupt loop.
pub struct NvicController {
    registers: StaticRef<NvicRegisters>,
}

impl NvicController {
    pub const fn new(registers: StaticRef<NvicRegisters>) -> NvicController {
        NvicController { registers }
    }

    /// Number of valid NVIC_XXXX registers. Note this is a ceiling on the
    /// number of available interrupts (as this is the number of banks of 32),
    /// but the actual number may be less.
    pub fn number_of_nvic_registers(&self) -> usize {
        (self.registers.ictr.read(InterruptControllerType::INTLINESNUM) + 1) as usize
    }

    pub fn clear_all_pending(&self) {
        for icpr in self
            .registers
            .icpr
            .iter()
            .take(self.number_of_nvic_registers())
        {
            icpr.set(!0)
        }
    }

    pub fn enable_all(&self) {
        for iser in self
            .registers
            .iser
            .iter()
            .take(self.number_of_nvic_registers())
        {
            iser.set(!0)
        }
    }

    pub fn disable_all(&self) {
        for icer in self
            .registers
            .icer
            .iter()
            .take(self.number_of_nvic_registers())
        {
            icer.set(!0)
        }
    }

    /// The lowest numbered pending interrupt, or `None` if none are pending.
    pub fn next_pending(&self) -> Option<u32> {
        self.next_pending_except(&[])
    }

    /// Like `next_pending`, ignoring the interrupts set in `mask`. Word `n`
    /// of the mask covers interrupts `32n` to `32n + 31`.
    pub fn next_pending_except(&self, mask: &[u32]) -> Option<u32> {
        for (block, ispr) in self
            .registers
            .ispr
            .iter()
            .take(self.number_of_nvic_registers())
            .enumerate()
        {
            let ignored = mask.get(block).copied().unwrap_or(0);
            let pending = ispr.get() & !ignored;

            if pending != 0 {
                // trailing_zeros == index of first high bit
                let bit = pending.trailing_zeros();
                return Some(block as u32 * 32 + bit);
            }
        }
        None
    }

    pub fn has_pending(&self) -> bool {
        self.next_pending().is_some()
    }

    /// A handle to one interrupt line. `None` past the lines the ICTR
    /// reports.
    pub fn interrupt(&self, irq: u32) -> Option<Nvic> {
        if irq >= MAX_INTERRUPTS || irq as usize / 32 >= self.number_of_nvic_registers() {
            return None;
        }
        Some(Nvic {
            registers: self.registers,
            irq,
        })
    }
}

/// An opaque wrapper for a single NVIC interrupt.
///
/// Hand these out to low-level driver to let them control their own interrupts
/// but not others.
pub struct Nvic {
    registers: StaticRef<NvicRegisters>,
    irq: u32,
}

impl Nvic {
    /// Creates a new `Nvic`
    ///
    /// Marked unsafe because only chip/platform configuration code should be
    /// able to create these.
    pub const unsafe fn new(irq: u32) -> Nvic {
        Nvic {
            registers: NVIC_BASE,
            irq,
        }
    }

    pub fn irq(&self) -> u32 {
        self.irq
    }

    fn bank(&self) -> usize {
        self.irq as usize / 32
    }

    fn bit(&self) -> u32 {
        1 << (self.irq & 31)
    }

    pub fn enable(&self) {
        self.registers.iser[self.bank()].set(self.bit());
    }

    pub fn disable(&self) {
        self.registers.icer[self.bank()].set(self.bit());
    }

    pub fn is_enabled(&self) -> bool {
        self.registers.iser[self.bank()].get() & self.bit() != 0
    }

    pub fn clear_pending(&self) {
        self.registers.icpr[self.bank()].set(self.bit());
    }

    pub fn set_pending(&self) {
        self.registers.ispr[self.bank()].set(self.bit());
    }

    pub fn is_pending(&self) -> bool {
        self.registers.ispr[self.bank()].get() & self.bit() != 0
    }

    /// The handler is running or preempted.
    pub fn is_active(&self) -> bool {
        self.registers.iabr[self.bank()].get() & self.bit() != 0
    }

    fn priority_field(&self) -> Field<u32, NvicInterruptPriority::Register> {
        match self.irq & 3 {
            0 => NvicInterruptPriority::PRI_N0,
            1 => NvicInterruptPriority::PRI_N1,
            2 => NvicInterruptPriority::PRI_N2,
            _ => NvicInterruptPriority::PRI_N3,
        }
    }

    /// Set the logical priority, 0 being the most urgent level available
    /// to device interrupts.
    pub fn set_priority(&self, config: &PriorityConfig, priority: u8) -> Result<(), ErrorCode> {
        if priority as u16 >= config.irq_prio_levels() {
            log::warn!(
                "nvic: irq {} priority {} above lowest level {}",
                self.irq,
                priority,
                config.irq_prio_lowest()
            );
            return Err(ErrorCode::INVAL);
        }
        self.set_raw_priority(config.exc_prio(priority + config.irq_prio_offset()));
        Ok(())
    }

    /// Move the interrupt to the level the kernel never masks.
    pub fn set_zero_latency(&self, config: &PriorityConfig) -> Result<(), ErrorCode> {
        if !config.zero_latency_irqs {
            return Err(ErrorCode::NOSUPPORT);
        }
        self.set_raw_priority(config.exc_zero_latency_irqs_prio());
        Ok(())
    }

    /// Logical priority, `None` for interrupts on a reserved level.
    pub fn priority(&self, config: &PriorityConfig) -> Option<u8> {
        let level = self.raw_priority() >> (8 - config.prio_bits as u32);
        level.checked_sub(config.irq_prio_offset())
    }

    pub fn raw_priority(&self) -> u8 {
        self.registers.ipr[self.irq as usize / 4].read(self.priority_field()) as u8
    }

    fn set_raw_priority(&self, value: u8) {
        self.registers.ipr[self.irq as usize / 4].modify(self.priority_field().val(value as u32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;
    use hal_utils::fake::{self, read, write};

    fn fake_nvic(lines_num: u32) -> NvicController {
        let registers = fake::registers::<NvicRegisters>();
        write(&registers, 0x004, lines_num);
        NvicController::new(registers)
    }

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(NvicRegisters, ictr), 0x004);
        assert_eq!(offset_of!(NvicRegisters, iser), 0x100);
        assert_eq!(offset_of!(NvicRegisters, iabr), 0x300);
        assert_eq!(offset_of!(NvicRegisters, ipr), 0x400);
        assert_eq!(core::mem::size_of::<NvicRegisters>(), 0x7f0);
    }

    #[test]
    fn zephyr_style_levels() {
        let m4 = PriorityConfig::default();
        assert_eq!(m4.exc_prio(1), 0x20);
        assert_eq!(m4.irq_prio_offset(), 1);
        assert_eq!(m4.exc_irq_default_prio(), 0x20);
        assert_eq!(m4.exc_pendsv_prio(), 0xE0);
        assert_eq!(m4.irq_prio_levels(), 7);
        assert_eq!(m4.irq_prio_lowest(), 6);

        let zli = PriorityConfig::new(3, true, true).unwrap();
        assert_eq!(zli.irq_prio_offset(), 2);
        assert_eq!(zli.exc_svc_prio(), 0x20);
        assert_eq!(zli.exc_irq_default_prio(), 0x40);
        assert_eq!(zli.exc_zero_latency_irqs_prio(), 0);

        let m0 = PriorityConfig::ARMV6M;
        assert_eq!(m0.irq_prio_offset(), 0);
        assert_eq!(m0.exc_prio(3), 0xC0);
        assert_eq!(m0.exc_pendsv_prio(), 0xC0);
        assert_eq!(m0.irq_prio_levels(), 4);

        assert_eq!(PriorityConfig::new(0, false, false), Err(ErrorCode::INVAL));
        assert_eq!(PriorityConfig::new(9, false, false), Err(ErrorCode::INVAL));
        assert_eq!(PriorityConfig::new(1, true, true), Err(ErrorCode::INVAL));
    }

    #[test]
    fn enable_disable_pending() {
        let nvic = fake_nvic(1);
        let irq = nvic.interrupt(33).unwrap();

        irq.enable();
        assert_eq!(read(&nvic.registers, 0x104), 1 << 1);
        assert!(irq.is_enabled());
        irq.disable();
        assert_eq!(read(&nvic.registers, 0x184), 1 << 1);
        irq.clear_pending();
        assert_eq!(read(&nvic.registers, 0x284), 1 << 1);

        assert!(!irq.is_pending());
        irq.set_pending();
        assert!(irq.is_pending());
        assert!(!irq.is_active());
        write(&nvic.registers, 0x304, 1 << 1);
        assert!(irq.is_active());

        assert!(nvic.interrupt(64).is_none());
    }

    #[test]
    fn next_pending_scans_implemented_banks() {
        let nvic = fake_nvic(1);
        assert_eq!(nvic.next_pending(), None);
        assert!(!nvic.has_pending());

        write(&nvic.registers, 0x204, 1 << 4);
        assert_eq!(nvic.next_pending(), Some(36));
        write(&nvic.registers, 0x200, 1 << 9);
        assert_eq!(nvic.next_pending(), Some(9));
        assert_eq!(nvic.next_pending_except(&[1 << 9]), Some(36));

        // Bank 2 is not implemented.
        write(&nvic.registers, 0x200, 0);
        write(&nvic.registers, 0x204, 0);
        write(&nvic.registers, 0x208, 1);
        assert_eq!(nvic.next_pending(), None);
    }

    #[test]
    fn bulk_operations_cover_implemented_banks() {
        let nvic = fake_nvic(1);
        nvic.disable_all();
        nvic.clear_all_pending();
        assert_eq!(read(&nvic.registers, 0x180), !0);
        assert_eq!(read(&nvic.registers, 0x184), !0);
        assert_eq!(read(&nvic.registers, 0x188), 0);
        assert_eq!(read(&nvic.registers, 0x284), !0);
    }

    #[test]
    fn priorities() {
        let nvic = fake_nvic(0);
        let config = PriorityConfig::default();
        let irq = nvic.interrupt(6).unwrap();

        assert_eq!(irq.set_priority(&config, 2), Ok(()));
        assert_eq!(read(&nvic.registers, 0x404), 0x60 << 16);
        assert_eq!(irq.raw_priority(), 0x60);
        assert_eq!(irq.priority(&config), Some(2));

        assert_eq!(irq.set_priority(&config, 7), Err(ErrorCode::INVAL));
        assert_eq!(irq.raw_priority(), 0x60);

        assert_eq!(irq.set_zero_latency(&config), Err(ErrorCode::NOSUPPORT));
        let zli = PriorityConfig::new(3, true, true).unwrap();
        assert_eq!(irq.set_zero_latency(&zli), Ok(()));
        assert_eq!(irq.raw_priority(), 0);
        assert_eq!(irq.priority(&zli), None);

        // Neighbouring interrupts in the same register are untouched.
        let other = nvic.interrupt(7).unwrap();
        assert_eq!(other.set_priority(&config, 6), Ok(()));
        assert_eq!(read(&nvic.registers, 0x404), 0xE0 << 24);
    }

    #[test]
    fn full_eight_bit_priorities() {
        let config = PriorityConfig::new(8, false, true).unwrap();
        assert_eq!(config.prio_bits(), 8);
        assert_eq!(config.irq_prio_levels(), 255);
        assert_eq!(config.irq_prio_lowest(), 254);
        assert_eq!(config.exc_prio(1), 1);
        assert_eq!(config.exc_pendsv_prio(), 0xFF);

        let nvic = fake_nvic(0);
        let irq = nvic.interrupt(0).unwrap();
        assert_eq!(irq.set_priority(&config, 254), Ok(()));
        assert_eq!(irq.raw_priority(), 0xFF);
        assert_eq!(irq.priority(&config), Some(254));
        assert_eq!(irq.set_priority(&config, 255), Err(ErrorCode::INVAL));
        assert_eq!(irq.raw_priority(), 0xFF);
    }
}
