//! Per-attachment hub state

use super::{enumeration::EnumState, polling::PollState, Config, Error};
use crate::{
    class::Status,
    descriptor::{HubDescriptor, HUB_DESCRIPTOR_LEN},
    host::{Host, Pipe, Speed},
    port::ChangeBitmap,
};
use usb_device::{
    endpoint::{EndpointAddress, EndpointType},
    UsbDirection,
};

/// Hub interface class code
pub const HUB_CLASS: u8 = 0x09;

/// Interface indices at or above this value are invalid
pub const MAX_INTERFACES: u8 = 10;

/// Largest interrupt transfer we accept from the status endpoint
const STATUS_BUFFER_LEN: usize = 8;

/// State owned by one attached hub
///
/// Created by `init`, dropped by `deinit`. Only the enumeration and
/// polling step functions touch it.
pub(crate) struct Instance {
    pub enum_state: EnumState,
    pub poll_state: PollState,
    /// The port being powered, or examined. Zero when idle.
    pub current_port: u8,
    /// Ports managed by the driver, after clamping
    pub port_count: u8,
    pub pipe: Pipe,
    pub endpoint: EndpointAddress,
    pub max_packet_size: u16,
    pub poll_interval_ms: u16,
    /// Frame number of the last interrupt IN submission
    pub last_submit: u32,
    pub transfer_pending: bool,
    /// Set once the completed transfer has been decoded
    pub data_ready: bool,
    pub descriptor: Option<HubDescriptor>,
    pub change_bitmap: ChangeBitmap,
    /// Speed of the device found by the latest port status
    pub attached_speed: Speed,
    pub config: Config,
    pub descriptor_buffer: [u8; HUB_DESCRIPTOR_LEN],
    pub status_buffer: [u8; 4],
    pub interrupt_buffer: [u8; STATUS_BUFFER_LEN],
}

impl Instance {
    /// Locate the hub interface, and open its status change pipe
    pub fn open<H: Host>(host: &mut H, config: Config) -> Result<Self, Error> {
        let interface = host
            .find_interface(HUB_CLASS, 0x00, 0x00)
            .ok_or(Error::InterfaceNotFound)?;
        if interface >= MAX_INTERFACES {
            return Err(Error::InvalidInterface(interface));
        }

        match host.select_interface(interface) {
            Status::Ok => {}
            status => return Err(Error::Request(status)),
        }

        let endpoint = host
            .endpoint_descriptor(interface, 0)
            .ok_or(Error::InterfaceNotFound)?;
        if endpoint.address.direction() != UsbDirection::In || !endpoint.is_interrupt() {
            return Err(Error::NotInterruptIn);
        }

        let poll_interval_ms = u16::from(endpoint.interval).max(config.min_poll_interval_ms);
        let max_packet_size = endpoint.max_packet_size;
        info!(
            "HUB: polling time {}, max packet size {}",
            poll_interval_ms, max_packet_size
        );

        let pipe = host
            .alloc_pipe(endpoint.address)
            .ok_or(Error::PipeAllocation)?;
        host.open_pipe(
            pipe,
            endpoint.address,
            EndpointType::Interrupt,
            max_packet_size,
        );
        host.set_toggle(pipe, 0);
        debug!("HUB: interrupt IN on pipe {}", pipe.0);

        Ok(Instance {
            enum_state: EnumState::GetDescriptor,
            poll_state: PollState::Idle,
            current_port: 0,
            port_count: 0,
            pipe,
            endpoint: endpoint.address,
            max_packet_size,
            poll_interval_ms,
            last_submit: 0,
            transfer_pending: false,
            data_ready: false,
            descriptor: None,
            change_bitmap: ChangeBitmap::default(),
            attached_speed: Speed::default(),
            config,
            descriptor_buffer: [0; HUB_DESCRIPTOR_LEN],
            status_buffer: [0; 4],
            interrupt_buffer: [0; STATUS_BUFFER_LEN],
        })
    }

    /// Close and release the status change pipe
    pub fn close<H: Host>(self, host: &mut H) {
        host.close_pipe(self.pipe);
        host.free_pipe(self.pipe);
        debug!("HUB: released pipe {}", self.pipe.0);
    }

    /// Returns the number of bytes to request from the status endpoint
    pub fn transfer_len(&self) -> usize {
        usize::from(self.max_packet_size).clamp(1, STATUS_BUFFER_LEN)
    }
}
