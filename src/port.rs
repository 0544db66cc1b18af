//! Port status words and the port change bitmap
//!
//! GET_STATUS on a port returns two little-endian words: `wPortStatus`,
//! then `wPortChange` (USB 2.0 §11.24.2.7).

use crate::{descriptor::MAX_PORTS, host::Speed};

bitflags::bitflags! {
    /// `wPortStatus`
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct PortStatusFlags : u16 {
        const CONNECTION = 1 << 0;
        const ENABLE = 1 << 1;
        const SUSPEND = 1 << 2;
        const OVER_CURRENT = 1 << 3;
        const RESET = 1 << 4;
        const POWER = 1 << 8;
        const LOW_SPEED = 1 << 9;
        const HIGH_SPEED = 1 << 10;
        const TEST = 1 << 11;
        const INDICATOR = 1 << 12;
    }
}

bitflags::bitflags! {
    /// `wPortChange`
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct PortChangeFlags : u16 {
        const CONNECTION = 1 << 0;
        const ENABLE = 1 << 1;
        const SUSPEND = 1 << 2;
        const OVER_CURRENT = 1 << 3;
        const RESET = 1 << 4;
    }
}

bitflags::bitflags! {
    /// `wHubStatus`, and the matching `wHubChange` bits
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct HubStatusFlags : u16 {
        /// Local power supply lost
        const LOCAL_POWER = 1 << 0;
        const OVER_CURRENT = 1 << 1;
    }
}

/// The hub's own status, from GET_STATUS on the hub
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HubStatus {
    pub status: HubStatusFlags,
    pub change: HubStatusFlags,
}

impl HubStatus {
    /// Decode the four byte GET_STATUS response
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        HubStatus {
            status: HubStatusFlags::from_bits_truncate(u16::from_le_bytes([bytes[0], bytes[1]])),
            change: HubStatusFlags::from_bits_truncate(u16::from_le_bytes([bytes[2], bytes[3]])),
        }
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        let [s0, s1] = self.status.bits().to_le_bytes();
        let [c0, c1] = self.change.bits().to_le_bytes();
        [s0, s1, c0, c1]
    }
}

/// A snapshot of one port's status
///
/// Fetched fresh every time the port is examined.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PortStatus {
    pub status: PortStatusFlags,
    pub change: PortChangeFlags,
}

impl PortStatus {
    /// Decode the four byte GET_STATUS response
    ///
    /// Reserved bits are dropped.
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        PortStatus {
            status: PortStatusFlags::from_bits_truncate(u16::from_le_bytes([bytes[0], bytes[1]])),
            change: PortChangeFlags::from_bits_truncate(u16::from_le_bytes([bytes[2], bytes[3]])),
        }
    }

    /// Encode into the four byte GET_STATUS response
    pub fn to_le_bytes(self) -> [u8; 4] {
        let [s0, s1] = self.status.bits().to_le_bytes();
        let [c0, c1] = self.change.bits().to_le_bytes();
        [s0, s1, c0, c1]
    }

    pub fn is_powered(&self) -> bool {
        self.status.contains(PortStatusFlags::POWER)
    }

    pub fn is_connected(&self) -> bool {
        self.status.contains(PortStatusFlags::CONNECTION)
    }

    /// Returns the speed of the attached device
    ///
    /// Only meaningful while the port is enabled.
    pub fn speed(&self) -> Speed {
        if self.status.contains(PortStatusFlags::LOW_SPEED) {
            Speed::Low
        } else if self.status.contains(PortStatusFlags::HIGH_SPEED) {
            Speed::High
        } else {
            Speed::Full
        }
    }
}

/// The status change bitmap delivered on the hub's interrupt endpoint
///
/// Bit 0 signals a hub status change; bit *N* signals a change on port *N*.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ChangeBitmap(pub u8);

impl ChangeBitmap {
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Indicates if the hub itself reported a change
    pub fn hub_changed(self) -> bool {
        self.0 & 1 != 0
    }

    /// Returns the lowest-numbered port, in `1..=port_count`, with a pending change
    pub fn next_port(self, port_count: u8) -> Option<u8> {
        (1..=port_count.min(MAX_PORTS)).find(|&port| self.0 & (1 << port) != 0)
    }

    /// Clear the change bit for `port`
    pub fn clear(&mut self, port: u8) {
        if port <= MAX_PORTS {
            self.0 &= !(1 << port);
        }
    }
}
