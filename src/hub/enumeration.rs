//! Hub enumeration: read the hub descriptor, then power every port
//!
//! Each call runs a single step. The host stack calls again while we
//! return [`Status::Busy`]. A step that fails reports why, and parks the
//! machine in [`EnumState::Error`].

use super::{instance::Instance, Error};
use crate::{
    class::Status,
    descriptor::{HubDescriptor, HUB_DESCRIPTOR_LEN},
    host::{Host, HubEvent},
    request::{self, PortFeature},
};

/// Enumeration states
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum EnumState {
    GetDescriptor,
    /// Powering `current_port`; one port per step
    SetPower,
    WaitPowerGood,
    /// Terminal. Enumeration succeeded.
    Done,
    /// Terminal. Enumeration failed; deinit and init the driver to recover.
    Error,
}

pub(super) fn step<H: Host>(hub: &mut Instance, host: &mut H) -> Result<Status, Error> {
    match hub.enum_state {
        EnumState::GetDescriptor => {
            let setup = request::get_hub_descriptor(HUB_DESCRIPTOR_LEN as u16);
            match host.control_in(&setup, &mut hub.descriptor_buffer) {
                Status::Ok => match HubDescriptor::parse(&hub.descriptor_buffer) {
                    Some(descriptor) => {
                        hub.port_count = descriptor.clamped_port_count(hub.config.max_ports);
                        if hub.port_count < descriptor.port_count {
                            debug!(
                                "HUB: managing {} of {} ports",
                                hub.port_count, descriptor.port_count
                            );
                        }
                        hub.descriptor = Some(descriptor);
                        hub.current_port = 1;
                        hub.enum_state = EnumState::SetPower;
                        Ok(Status::Busy)
                    }
                    None => {
                        warn!("HUB: malformed hub descriptor");
                        hub.enum_state = EnumState::Error;
                        Err(Error::InvalidDescriptor)
                    }
                },
                Status::Busy => Ok(Status::Busy),
                status => {
                    warn!("HUB: get hub descriptor failed: {:?}", status);
                    hub.enum_state = EnumState::Error;
                    Err(Error::Request(status))
                }
            }
        }
        EnumState::SetPower => {
            if hub.current_port > hub.port_count {
                hub.enum_state = EnumState::WaitPowerGood;
                return Ok(Status::Busy);
            }
            let setup = request::set_port_feature(hub.current_port, PortFeature::Power);
            match host.control_out(&setup) {
                Status::Ok => {
                    trace!("HUB: port {} powered", hub.current_port);
                    if hub.current_port >= hub.port_count {
                        hub.enum_state = EnumState::WaitPowerGood;
                    } else {
                        hub.current_port += 1;
                    }
                    Ok(Status::Busy)
                }
                Status::Busy => Ok(Status::Busy),
                status => {
                    warn!("HUB: powering port {} failed: {:?}", hub.current_port, status);
                    hub.enum_state = EnumState::Error;
                    Err(Error::Request(status))
                }
            }
        }
        EnumState::WaitPowerGood => {
            let delay = hub
                .descriptor
                .as_ref()
                .map_or(0, HubDescriptor::power_good_delay_ms);
            host.delay_ms(delay);
            hub.enum_state = EnumState::Done;
            info!("HUB: {} ports enabled", hub.port_count);
            host.hub_event(HubEvent::HubDetected {
                ports: hub.port_count,
            });
            Ok(Status::Busy)
        }
        EnumState::Done => Ok(Status::Ok),
        // Reported when the machine entered the state.
        EnumState::Error => Ok(Status::Fail),
    }
}
