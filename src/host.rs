//! The boundary between the hub driver and the host stack
//!
//! The hub driver doesn't talk to a host controller. It issues requests
//! through a [`Host`] implementation, which owns pipes, control transfers,
//! the frame counter, and child-device enumeration.

use crate::{class::Status, descriptor::EndpointDescriptor, request::SetupPacket};
use usb_device::endpoint::{EndpointAddress, EndpointType};

/// A host-side channel that's bound to one device endpoint
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Pipe(pub u8);

/// State of the last transfer submitted on a pipe
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum UrbState {
    /// Nothing submitted
    Idle,
    /// The transfer completed, and data is available
    Done,
    /// The device NAKed; the transfer is still pending
    NotReady,
    /// The endpoint responded with a STALL
    Stall,
    /// Transaction error
    Error,
}

/// USB low / full / high speed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Speed {
    /// 1.5 Mbit/s
    Low,
    /// 12 Mbit/s
    #[default]
    Full,
    /// 480 Mbit/s
    High,
}

/// Notifications from the hub driver to the host stack
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum HubEvent {
    /// Enumeration finished, and `ports` downstream ports are powered.
    HubDetected { ports: u8 },
    /// A device on `port` was reset and enabled. The host stack
    /// should enumerate it.
    DeviceAttached { port: u8, speed: Speed },
    /// The device on `port` is gone.
    DeviceDetached { port: u8 },
    /// The hub reported, and we acknowledged, an over-current
    /// condition on `port`.
    PortOverCurrent { port: u8 },
}

/// Host stack primitives consumed by the hub driver
///
/// Every method is expected to return promptly, except for
/// [`delay_ms()`](Host::delay_ms). Control requests are non-blocking:
/// they return [`Status::Busy`] until the transfer finishes, and the
/// driver re-issues the same request on its next step.
pub trait Host {
    /// Returns the index of the first interface matching the class triple
    fn find_interface(&self, class: u8, subclass: u8, protocol: u8) -> Option<u8>;
    /// Make `interface` the active interface
    fn select_interface(&mut self, interface: u8) -> Status;
    /// Returns the `index`th endpoint descriptor of `interface`
    fn endpoint_descriptor(&self, interface: u8, index: u8) -> Option<EndpointDescriptor>;

    /// Allocate a pipe for the endpoint; `None` if the host is out of pipes
    fn alloc_pipe(&mut self, endpoint: EndpointAddress) -> Option<Pipe>;
    /// Bind the pipe to the device's endpoint
    fn open_pipe(
        &mut self,
        pipe: Pipe,
        endpoint: EndpointAddress,
        kind: EndpointType,
        max_packet_size: u16,
    );
    /// Stop all traffic on `pipe`
    fn close_pipe(&mut self, pipe: Pipe);
    /// Return `pipe` to the host's pool; it's closed first
    fn free_pipe(&mut self, pipe: Pipe);
    /// Set the data toggle for the next transfer on `pipe`
    fn set_toggle(&mut self, pipe: Pipe, toggle: u8);

    /// Issue a device-to-host control request, receiving into `buffer`
    fn control_in(&mut self, setup: &SetupPacket, buffer: &mut [u8]) -> Status;
    /// Issue a control request without a data stage
    fn control_out(&mut self, setup: &SetupPacket) -> Status;

    /// Submit an interrupt IN transfer of `len` bytes on `pipe`
    ///
    /// Fire and forget. Submitting on a pipe replaces whatever transfer was
    /// pending on that pipe.
    fn submit_interrupt_in(&mut self, pipe: Pipe, len: u16);
    /// Returns the state of the last transfer on `pipe`
    fn urb_state(&self, pipe: Pipe) -> UrbState;
    /// Copy the completed interrupt IN data into `buffer`, returning the
    /// number of bytes copied
    fn read_interrupt_in(&mut self, pipe: Pipe, buffer: &mut [u8]) -> usize;
    /// Issue CLEAR_FEATURE(ENDPOINT_HALT) to the endpoint
    fn clear_endpoint_stall(&mut self, endpoint: EndpointAddress) -> Status;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
    /// Returns the running frame counter (one frame per millisecond)
    fn frame_number(&self) -> u32;

    /// Deliver a hub notification to the host stack
    fn hub_event(&mut self, event: HubEvent);
}
