//! Hub class requests (USB 2.0 §11.24)

use usb_device::{
    control::{Recipient, Request, RequestType},
    UsbDirection,
};

/// Hub descriptor type
pub const DESCRIPTOR_TYPE_HUB: u8 = 0x29;

/// Port feature selectors
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum PortFeature {
    Connection = 0,
    Enable = 1,
    Suspend = 2,
    OverCurrent = 3,
    Reset = 4,
    Power = 8,
    LowSpeed = 9,
    CConnection = 16,
    CEnable = 17,
    CSuspend = 18,
    COverCurrent = 19,
    CReset = 20,
    Indicator = 22,
}

/// Hub feature selectors
///
/// Only the change bits can be cleared.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum HubFeature {
    CLocalPower = 0,
    COverCurrent = 1,
}

/// An eight byte SETUP packet
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct SetupPacket {
    pub direction: UsbDirection,
    pub request_type: RequestType,
    pub recipient: Recipient,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    /// Returns the `bmRequestType` byte
    pub fn request_type_byte(&self) -> u8 {
        (self.direction as u8) | ((self.request_type as u8) << 5) | (self.recipient as u8)
    }

    /// Returns the packet as it appears on the wire
    pub fn to_bytes(&self) -> [u8; 8] {
        let [value_lo, value_hi] = self.value.to_le_bytes();
        let [index_lo, index_hi] = self.index.to_le_bytes();
        let [length_lo, length_hi] = self.length.to_le_bytes();
        [
            self.request_type_byte(),
            self.request,
            value_lo,
            value_hi,
            index_lo,
            index_hi,
            length_lo,
            length_hi,
        ]
    }

    /// Returns the port addressed by a port request
    pub fn port(&self) -> Option<u8> {
        (self.recipient == Recipient::Other).then_some(self.index as u8)
    }

    /// Returns the feature selector of a SET_FEATURE / CLEAR_FEATURE request
    pub fn feature(&self) -> Option<u16> {
        matches!(self.request, Request::SET_FEATURE | Request::CLEAR_FEATURE).then_some(self.value)
    }
}

/// GET_DESCRIPTOR for the hub descriptor, reading up to `len` bytes
pub fn get_hub_descriptor(len: u16) -> SetupPacket {
    SetupPacket {
        direction: UsbDirection::In,
        request_type: RequestType::Class,
        recipient: Recipient::Device,
        request: Request::GET_DESCRIPTOR,
        value: u16::from(DESCRIPTOR_TYPE_HUB) << 8,
        index: 0,
        length: len,
    }
}

/// GET_STATUS for the hub itself; the response is four bytes
pub fn get_hub_status() -> SetupPacket {
    SetupPacket {
        direction: UsbDirection::In,
        request_type: RequestType::Class,
        recipient: Recipient::Device,
        request: Request::GET_STATUS,
        value: 0,
        index: 0,
        length: 4,
    }
}

/// CLEAR_FEATURE for the hub itself
pub fn clear_hub_feature(feature: HubFeature) -> SetupPacket {
    SetupPacket {
        direction: UsbDirection::Out,
        request_type: RequestType::Class,
        recipient: Recipient::Device,
        request: Request::CLEAR_FEATURE,
        value: feature as u16,
        index: 0,
        length: 0,
    }
}

/// GET_STATUS for `port`; the response is four bytes
pub fn get_port_status(port: u8) -> SetupPacket {
    SetupPacket {
        direction: UsbDirection::In,
        request_type: RequestType::Class,
        recipient: Recipient::Other,
        request: Request::GET_STATUS,
        value: 0,
        index: port.into(),
        length: 4,
    }
}

/// SET_FEATURE for `port`
pub fn set_port_feature(port: u8, feature: PortFeature) -> SetupPacket {
    port_feature(Request::SET_FEATURE, port, feature)
}

/// CLEAR_FEATURE for `port`
pub fn clear_port_feature(port: u8, feature: PortFeature) -> SetupPacket {
    port_feature(Request::CLEAR_FEATURE, port, feature)
}

fn port_feature(request: u8, port: u8, feature: PortFeature) -> SetupPacket {
    SetupPacket {
        direction: UsbDirection::Out,
        request_type: RequestType::Class,
        recipient: Recipient::Other,
        request,
        value: feature as u16,
        index: port.into(),
        length: 0,
    }
}
