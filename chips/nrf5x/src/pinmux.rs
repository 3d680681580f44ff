// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! An abstraction over the pin multiplexer, nRF5X-family
//!
//! Peripheral drivers take a `Pinmux` (instead of a `u32`) for every PSEL
//! register. The board configuration creates the `Pinmux`s and passes them
//! into the drivers during initialization.

use hal_utils::ErrorCode;

// Only the nRF52840 has a second port.
const NUM_PORTS: u32 = 2;

const PIN_PER_PORT: u32 = 32;

/// PSEL value that leaves a peripheral signal unconnected.
const DISCONNECTED: u32 = 0xFFFF_FFFF;

/// An opaque wrapper around a PSEL register value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pinmux(u32);

impl Pinmux {
    /// Wrap the pin numbered `port * 32 + pin`.
    pub const fn new(pin: u32) -> Pinmux {
        Pinmux(pin)
    }

    /// Wrap `pin` on `port`, rejecting pins the chip family cannot have.
    pub fn from_port_pin(port: u32, pin: u32) -> Result<Pinmux, ErrorCode> {
        if port >= NUM_PORTS || pin >= PIN_PER_PORT {
            return Err(ErrorCode::INVAL);
        }
        Ok(Pinmux(port * PIN_PER_PORT + pin))
    }

    /// The value that disconnects a peripheral signal from all pins.
    pub const fn disconnected() -> Pinmux {
        Pinmux(DISCONNECTED)
    }

    pub const fn is_connected(self) -> bool {
        self.0 != DISCONNECTED
    }
}

impl From<Pinmux> for u32 {
    fn from(val: Pinmux) -> Self {
        val.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_and_pin_are_flattened() {
        assert_eq!(u32::from(Pinmux::from_port_pin(1, 3).unwrap()), 35);
        assert_eq!(Pinmux::from_port_pin(2, 0), Err(ErrorCode::INVAL));
        assert_eq!(Pinmux::from_port_pin(0, 32), Err(ErrorCode::INVAL));
    }

    #[test]
    fn disconnected_is_all_ones() {
        assert_eq!(u32::from(Pinmux::disconnected()), 0xFFFF_FFFF);
        assert!(!Pinmux::disconnected().is_connected());
        assert!(Pinmux::new(0).is_connected());
    }
}
