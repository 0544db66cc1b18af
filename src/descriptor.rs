//! Hub and endpoint descriptors
//!
//! Descriptors arrive as little-endian byte strings. Multi-bit fields are
//! described by an `offset` and a `mask`, and decoded with shifts and masks,
//! never with a compiler's bit-field layout.

#![allow(non_snake_case, non_upper_case_globals)]

use crate::request::DESCRIPTOR_TYPE_HUB;
use usb_device::endpoint::EndpointAddress;

/// The largest number of downstream ports this driver manages
///
/// Matches the width of a one-byte port change bitmap; bit 0 is
/// the hub itself.
pub const MAX_PORTS: u8 = 7;

/// Number of bytes requested for a hub descriptor
///
/// Enough for hubs with up to seven ports: seven fixed bytes, plus
/// one byte each for `DeviceRemovable` and `PortPwrCtrlMask`.
pub const HUB_DESCRIPTOR_LEN: usize = 9;

/// Fields of `wHubCharacteristics`
pub mod WHUBCHARACTERISTICS {
    /// Logical power switching mode
    pub mod LPSM {
        pub const offset: u16 = 0;
        pub const mask: u16 = 0b11 << offset;
    }
    /// Compound device
    pub mod COMPOUND {
        pub const offset: u16 = 2;
        pub const mask: u16 = 1 << offset;
    }
    /// Over-current protection mode
    pub mod OCPM {
        pub const offset: u16 = 3;
        pub const mask: u16 = 0b11 << offset;
    }
    /// Transaction translator think time
    pub mod TTTT {
        pub const offset: u16 = 5;
        pub const mask: u16 = 0b11 << offset;
    }
    /// Port indicators supported
    pub mod PIS {
        pub const offset: u16 = 7;
        pub const mask: u16 = 1 << offset;
    }
}

macro_rules! field {
    ($value:expr, $reg:ident :: $field:ident) => {
        ($value & $reg::$field::mask) >> $reg::$field::offset
    };
}

/// How the hub switches port power
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PowerSwitching {
    /// All ports are powered at once
    Ganged,
    /// Each port is powered individually
    Individual,
    /// Power is always on (USB 1.0 hubs)
    None,
}

/// How the hub reports over-current conditions
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum OverCurrentProtection {
    Global,
    Individual,
    None,
}

/// Decoded `wHubCharacteristics`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Characteristics(pub u16);

impl Characteristics {
    pub fn power_switching(self) -> PowerSwitching {
        match field!(self.0, WHUBCHARACTERISTICS::LPSM) {
            0b00 => PowerSwitching::Ganged,
            0b01 => PowerSwitching::Individual,
            _ => PowerSwitching::None,
        }
    }

    /// Indicates if the hub is part of a compound device
    pub fn is_compound(self) -> bool {
        field!(self.0, WHUBCHARACTERISTICS::COMPOUND) == 1
    }

    pub fn over_current_protection(self) -> OverCurrentProtection {
        match field!(self.0, WHUBCHARACTERISTICS::OCPM) {
            0b00 => OverCurrentProtection::Global,
            0b01 => OverCurrentProtection::Individual,
            _ => OverCurrentProtection::None,
        }
    }

    /// Returns the TT think time, in full-speed bit times (8, 16, 24 or 32)
    pub fn tt_think_time(self) -> u8 {
        (field!(self.0, WHUBCHARACTERISTICS::TTTT) as u8 + 1) * 8
    }

    pub fn port_indicators(self) -> bool {
        field!(self.0, WHUBCHARACTERISTICS::PIS) == 1
    }
}

/// A hub descriptor
///
/// Read once during enumeration, and never modified.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct HubDescriptor {
    pub length: u8,
    pub descriptor_type: u8,
    /// Downstream port count, as reported by the hub
    pub port_count: u8,
    pub characteristics: Characteristics,
    /// Time from power-on to power-good, in 2ms units
    pub power_good_delay_units: u8,
    /// Hub controller current, in mA
    pub controller_current_ma: u8,
    pub removable_mask: u8,
    pub power_ctrl_mask: u8,
}

impl HubDescriptor {
    /// Parse a hub descriptor
    ///
    /// Returns `None` if `bytes` is shorter than the fixed portion of the
    /// descriptor, or if the descriptor type isn't a hub descriptor. The
    /// variable-length bitmaps default to zero when they're truncated.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let fixed = bytes.get(..7)?;
        if fixed[1] != DESCRIPTOR_TYPE_HUB {
            return None;
        }
        Some(HubDescriptor {
            length: fixed[0],
            descriptor_type: fixed[1],
            port_count: fixed[2],
            characteristics: Characteristics(u16::from_le_bytes([fixed[3], fixed[4]])),
            power_good_delay_units: fixed[5],
            controller_current_ma: fixed[6],
            removable_mask: bytes.get(7).copied().unwrap_or(0),
            power_ctrl_mask: bytes.get(8).copied().unwrap_or(0),
        })
    }

    /// Returns the number of ports that the driver will manage, limited to `cap`
    pub fn clamped_port_count(&self, cap: u8) -> u8 {
        self.port_count.min(cap).min(MAX_PORTS)
    }

    /// Returns the power-on to power-good time, in milliseconds
    pub fn power_good_delay_ms(&self) -> u32 {
        u32::from(self.power_good_delay_units) * 2
    }

    /// Indicates if the device on `port` is non-removable
    ///
    /// Bit 0 of the mask is reserved; port *N* is bit *N*.
    pub fn is_non_removable(&self, port: u8) -> bool {
        port <= MAX_PORTS && self.removable_mask & (1 << port) != 0
    }
}

/// An endpoint descriptor
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct EndpointDescriptor {
    pub address: EndpointAddress,
    pub attributes: u8,
    pub max_packet_size: u16,
    /// Polling interval, in frames
    pub interval: u8,
}

impl EndpointDescriptor {
    /// Endpoint descriptor type
    pub const TYPE: u8 = 0x05;

    /// Parse a seven byte endpoint descriptor
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..7)?;
        if bytes[1] != Self::TYPE {
            return None;
        }
        Some(EndpointDescriptor {
            address: EndpointAddress::from(bytes[2]),
            attributes: bytes[3],
            max_packet_size: u16::from_le_bytes([bytes[4], bytes[5]]) & 0x7FF,
            interval: bytes[6],
        })
    }

    /// Indicates if this is an interrupt endpoint
    pub fn is_interrupt(&self) -> bool {
        self.attributes & 0b11 == 0b11
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usb_device::UsbDirection;

    const FOUR_PORT: [u8; 9] = [0x09, 0x29, 0x04, 0xE9, 0x00, 0x32, 0x64, 0b0000_0100, 0xFF];

    #[test]
    fn parse_hub_descriptor() {
        let desc = HubDescriptor::parse(&FOUR_PORT).unwrap();
        assert_eq!(desc.port_count, 4);
        assert_eq!(desc.power_good_delay_units, 0x32);
        assert_eq!(desc.power_good_delay_ms(), 100);
        assert_eq!(desc.controller_current_ma, 100);
        assert!(desc.is_non_removable(2));
        assert!(!desc.is_non_removable(1));
        assert_eq!(desc.power_ctrl_mask, 0xFF);
    }

    #[test]
    fn characteristics() {
        // 0xE9 = 0b1110_1001
        let chars = HubDescriptor::parse(&FOUR_PORT).unwrap().characteristics;
        assert_eq!(chars.power_switching(), PowerSwitching::Individual);
        assert!(!chars.is_compound());
        assert_eq!(chars.over_current_protection(), OverCurrentProtection::Individual);
        assert_eq!(chars.tt_think_time(), 32);
        assert!(chars.port_indicators());

        let chars = Characteristics(0b0001_0110);
        assert_eq!(chars.power_switching(), PowerSwitching::None);
        assert!(chars.is_compound());
        assert_eq!(chars.over_current_protection(), OverCurrentProtection::None);
        assert_eq!(chars.tt_think_time(), 8);
        assert!(!chars.port_indicators());
    }

    #[test]
    fn truncated_bitmaps() {
        let desc = HubDescriptor::parse(&FOUR_PORT[..7]).unwrap();
        assert_eq!(desc.removable_mask, 0);
        assert_eq!(desc.power_ctrl_mask, 0);
    }

    #[test]
    fn reject_bad_descriptor() {
        assert!(HubDescriptor::parse(&FOUR_PORT[..6]).is_none());
        let mut bytes = FOUR_PORT;
        bytes[1] = 0x02;
        assert!(HubDescriptor::parse(&bytes).is_none());
    }

    #[test]
    fn clamp_port_count() {
        let mut bytes = FOUR_PORT;
        bytes[2] = 12;
        let desc = HubDescriptor::parse(&bytes).unwrap();
        assert_eq!(desc.clamped_port_count(MAX_PORTS), MAX_PORTS);
        assert_eq!(desc.clamped_port_count(4), 4);
        assert_eq!(desc.clamped_port_count(u8::MAX), MAX_PORTS);
    }

    #[test]
    fn parse_endpoint_descriptor() {
        let desc = EndpointDescriptor::parse(&[0x07, 0x05, 0x81, 0x03, 0x01, 0x00, 0x0C]).unwrap();
        assert_eq!(desc.address.index(), 1);
        assert_eq!(desc.address.direction(), UsbDirection::In);
        assert!(desc.is_interrupt());
        assert_eq!(desc.max_packet_size, 1);
        assert_eq!(desc.interval, 12);

        assert!(EndpointDescriptor::parse(&[0x07, 0x04, 0x81, 0x03, 0x01, 0x00]).is_none());
    }
}
