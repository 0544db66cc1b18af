//! A scripted host stack with one hub attached, for unit tests

use crate::{
    class::Status,
    descriptor::EndpointDescriptor,
    host::{Host, HubEvent, Pipe, UrbState},
    port::{HubStatus, HubStatusFlags, PortChangeFlags, PortStatus, PortStatusFlags},
    request::{PortFeature, SetupPacket},
};
use std::vec::Vec;
use usb_device::{
    control::{Recipient, Request},
    endpoint::{EndpointAddress, EndpointType},
};

/// Status endpoint EP1 IN
pub const STATUS_EP: u8 = 0x81;

pub fn hub_descriptor(ports: u8, power_good_units: u8) -> [u8; 9] {
    [0x09, 0x29, ports, 0x09, 0x00, power_good_units, 0x64, 0x00, 0xFF]
}

pub struct MockHost {
    pub interface: Option<u8>,
    pub endpoint: Option<EndpointDescriptor>,
    pub pipe_available: bool,
    pub descriptor: [u8; 9],
    pub descriptor_status: Status,
    pub hub_status: HubStatus,
    /// Port *N* is at index *N*; index 0 is unused
    pub ports: [PortStatus; 8],
    /// The next `busy` control requests report `Busy`, without effect
    pub busy: u32,
    /// Control requests with this feature selector fail
    pub fail_feature: Option<PortFeature>,
    /// Status reported by the failing request
    pub fail_status: Status,

    pub requests: Vec<SetupPacket>,
    pub delays: Vec<u32>,
    pub events: Vec<HubEvent>,
    pub frame: u32,

    pub opened: Option<(Pipe, EndpointAddress, u16)>,
    pub toggles: Vec<(Pipe, u8)>,
    pub closed: Vec<Pipe>,
    pub freed: Vec<Pipe>,

    pub urb: UrbState,
    pub interrupt_data: Vec<u8>,
    pub submissions: Vec<(Pipe, u16)>,
    /// Submissions the hub hasn't answered; a submission while one is
    /// pending stacks on top of it
    pub outstanding: u32,
    pub max_outstanding: u32,
    pub stall_clears: u32,
}

impl MockHost {
    /// A hub with `ports` ports, whose status endpoint advertises `interval`
    pub fn new(ports: u8, interval: u8) -> Self {
        MockHost {
            interface: Some(0),
            endpoint: Some(EndpointDescriptor {
                address: EndpointAddress::from(STATUS_EP),
                attributes: 0x03,
                max_packet_size: 1,
                interval,
            }),
            pipe_available: true,
            descriptor: hub_descriptor(ports, 50),
            descriptor_status: Status::Ok,
            hub_status: HubStatus {
                status: HubStatusFlags::empty(),
                change: HubStatusFlags::empty(),
            },
            ports: [PortStatus {
                status: PortStatusFlags::empty(),
                change: PortChangeFlags::empty(),
            }; 8],
            busy: 0,
            fail_feature: None,
            fail_status: Status::Fail,
            requests: Vec::new(),
            delays: Vec::new(),
            events: Vec::new(),
            frame: 0,
            opened: None,
            toggles: Vec::new(),
            closed: Vec::new(),
            freed: Vec::new(),
            urb: UrbState::Idle,
            interrupt_data: Vec::new(),
            submissions: Vec::new(),
            outstanding: 0,
            max_outstanding: 0,
            stall_clears: 0,
        }
    }

    /// Plug a device into `port`, as a hub reports it
    pub fn connect(&mut self, port: u8, speed: PortStatusFlags) {
        let port = &mut self.ports[usize::from(port)];
        port.status |= PortStatusFlags::CONNECTION | speed;
        port.change |= PortChangeFlags::CONNECTION;
    }

    /// Unplug the device from `port`
    pub fn disconnect(&mut self, port: u8) {
        let port = &mut self.ports[usize::from(port)];
        port.status -= PortStatusFlags::CONNECTION
            | PortStatusFlags::ENABLE
            | PortStatusFlags::LOW_SPEED
            | PortStatusFlags::HIGH_SPEED;
        port.change |= PortChangeFlags::CONNECTION;
    }

    /// Complete the outstanding interrupt transfer with a change bitmap
    pub fn complete(&mut self, bitmap: u8) {
        self.interrupt_data = std::vec![bitmap];
        self.urb = UrbState::Done;
        self.outstanding = 0;
    }

    /// Stall the status endpoint
    pub fn stall(&mut self) {
        self.urb = UrbState::Stall;
        self.outstanding = 0;
    }

    /// Port numbers addressed by requests with this `bRequest` and feature
    pub fn feature_requests(&self, request: u8, feature: PortFeature) -> Vec<u8> {
        self.requests
            .iter()
            .filter(|setup| setup.request == request && setup.feature() == Some(feature as u16))
            .filter_map(SetupPacket::port)
            .collect()
    }

    /// Number of CLEAR_FEATURE requests addressed to the hub itself
    pub fn hub_clears(&self) -> usize {
        self.requests
            .iter()
            .filter(|setup| {
                setup.request == Request::CLEAR_FEATURE && setup.recipient == Recipient::Device
            })
            .count()
    }

    /// Number of GET_STATUS requests for `port`
    pub fn status_requests(&self, port: u8) -> usize {
        self.requests
            .iter()
            .filter(|setup| setup.request == Request::GET_STATUS && setup.port() == Some(port))
            .count()
    }

    fn take_busy(&mut self) -> bool {
        if self.busy > 0 {
            self.busy -= 1;
            true
        } else {
            false
        }
    }
}

fn change_flag(feature: u16) -> PortChangeFlags {
    match feature {
        f if f == PortFeature::CConnection as u16 => PortChangeFlags::CONNECTION,
        f if f == PortFeature::CEnable as u16 => PortChangeFlags::ENABLE,
        f if f == PortFeature::CSuspend as u16 => PortChangeFlags::SUSPEND,
        f if f == PortFeature::COverCurrent as u16 => PortChangeFlags::OVER_CURRENT,
        f if f == PortFeature::CReset as u16 => PortChangeFlags::RESET,
        _ => PortChangeFlags::empty(),
    }
}

impl Host for MockHost {
    fn find_interface(&self, class: u8, _: u8, _: u8) -> Option<u8> {
        assert_eq!(class, 0x09);
        self.interface
    }

    fn select_interface(&mut self, _: u8) -> Status {
        Status::Ok
    }

    fn endpoint_descriptor(&self, _: u8, index: u8) -> Option<EndpointDescriptor> {
        assert_eq!(index, 0);
        self.endpoint
    }

    fn alloc_pipe(&mut self, _: EndpointAddress) -> Option<Pipe> {
        self.pipe_available.then_some(Pipe(3))
    }

    fn open_pipe(
        &mut self,
        pipe: Pipe,
        endpoint: EndpointAddress,
        kind: EndpointType,
        max_packet_size: u16,
    ) {
        assert_eq!(kind, EndpointType::Interrupt);
        self.opened = Some((pipe, endpoint, max_packet_size));
    }

    fn close_pipe(&mut self, pipe: Pipe) {
        self.closed.push(pipe);
    }

    fn free_pipe(&mut self, pipe: Pipe) {
        self.freed.push(pipe);
    }

    fn set_toggle(&mut self, pipe: Pipe, toggle: u8) {
        self.toggles.push((pipe, toggle));
    }

    fn control_in(&mut self, setup: &SetupPacket, buffer: &mut [u8]) -> Status {
        if self.take_busy() {
            return Status::Busy;
        }
        self.requests.push(*setup);
        match setup.request {
            Request::GET_DESCRIPTOR => {
                let len = buffer.len().min(self.descriptor.len());
                buffer[..len].copy_from_slice(&self.descriptor[..len]);
                self.descriptor_status
            }
            Request::GET_STATUS => {
                let status = match setup.port() {
                    Some(port) => self.ports[usize::from(port)].to_le_bytes(),
                    None => self.hub_status.to_le_bytes(),
                };
                buffer[..4].copy_from_slice(&status);
                Status::Ok
            }
            _ => Status::NotSupported,
        }
    }

    fn control_out(&mut self, setup: &SetupPacket) -> Status {
        if self.take_busy() {
            return Status::Busy;
        }
        self.requests.push(*setup);
        if let Some(feature) = self.fail_feature {
            if setup.feature() == Some(feature as u16) {
                return self.fail_status;
            }
        }
        if setup.recipient == Recipient::Device {
            return match setup.request {
                Request::CLEAR_FEATURE => {
                    self.hub_status.change -= HubStatusFlags::from_bits_truncate(1 << setup.value);
                    Status::Ok
                }
                _ => Status::NotSupported,
            };
        }
        let port = &mut self.ports[usize::from(setup.index)];
        match (setup.request, setup.value) {
            (Request::SET_FEATURE, v) if v == PortFeature::Power as u16 => {
                port.status |= PortStatusFlags::POWER;
            }
            (Request::SET_FEATURE, v) if v == PortFeature::Reset as u16 => {
                // Reset completes right away.
                if port.status.contains(PortStatusFlags::CONNECTION) {
                    port.status |= PortStatusFlags::ENABLE;
                }
                port.change |= PortChangeFlags::RESET;
            }
            (Request::CLEAR_FEATURE, feature) => port.change -= change_flag(feature),
            _ => return Status::NotSupported,
        }
        Status::Ok
    }

    fn submit_interrupt_in(&mut self, pipe: Pipe, len: u16) {
        self.submissions.push((pipe, len));
        if self.urb == UrbState::NotReady {
            self.outstanding += 1;
        } else {
            self.outstanding = 1;
        }
        self.urb = UrbState::NotReady;
        self.max_outstanding = self.max_outstanding.max(self.outstanding);
    }

    fn urb_state(&self, _: Pipe) -> UrbState {
        self.urb
    }

    fn read_interrupt_in(&mut self, _: Pipe, buffer: &mut [u8]) -> usize {
        let len = buffer.len().min(self.interrupt_data.len());
        buffer[..len].copy_from_slice(&self.interrupt_data[..len]);
        len
    }

    fn clear_endpoint_stall(&mut self, endpoint: EndpointAddress) -> Status {
        assert_eq!(endpoint, EndpointAddress::from(STATUS_EP));
        if self.take_busy() {
            return Status::Busy;
        }
        self.stall_clears += 1;
        self.urb = UrbState::Idle;
        Status::Ok
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.frame = self.frame.wrapping_add(ms);
    }

    fn frame_number(&self) -> u32 {
        self.frame
    }

    fn hub_event(&mut self, event: HubEvent) {
        self.events.push(event);
    }
}
