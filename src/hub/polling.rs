//! Runtime polling of the status change endpoint, and the port change handler
//!
//! The hub reports changes as a bitmap on its interrupt IN endpoint. For
//! each changed port, we fetch the port status, clear change bits, reset
//! new devices, and tell the host stack about attaches and detaches.
//! A port is re-examined after every action, until it has nothing left
//! to report. Changes on the hub itself are acknowledged after the ports.

use super::instance::Instance;
use crate::{
    class::Status,
    host::{Host, HubEvent, UrbState},
    port::{
        ChangeBitmap, HubStatus, HubStatusFlags, PortChangeFlags, PortStatus, PortStatusFlags,
    },
    request::{self, HubFeature, PortFeature},
};

/// Polling states
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PollState {
    Idle,
    /// Waiting for an even frame
    Sync,
    GetData,
    Poll,
    LoopPortChanged,
    PortChanged,
    CPortSuspend,
    CPortOverCurrent,
    CPortConnection,
    CPortReset,
    ResetDevice,
    DevAttached,
    DevDetached,
    LoopPortWait,
    /// Fetching the hub's own status
    HubChanged,
    CHubLocalPower,
    CHubOverCurrent,
    /// Terminal; deinit and init the driver to recover.
    Error,
}

/// Select the action for a port, given its freshly-read status
pub fn dispatch(port: &PortStatus) -> PollState {
    if !port.is_powered() {
        // The hub flagged a port that it isn't powering. Give up on
        // this cycle rather than polling the port forever.
        PollState::Idle
    } else if port.change.contains(PortChangeFlags::OVER_CURRENT) {
        PollState::CPortOverCurrent
    } else if port.change.contains(PortChangeFlags::SUSPEND) {
        PollState::CPortSuspend
    } else if port.change.contains(PortChangeFlags::CONNECTION) {
        PollState::CPortConnection
    } else if port.is_connected() {
        if port.status.contains(PortStatusFlags::RESET) {
            PollState::PortChanged
        } else if port.change.contains(PortChangeFlags::RESET) {
            PollState::CPortReset
        } else if port.status.contains(PortStatusFlags::ENABLE) {
            PollState::DevAttached
        } else {
            PollState::ResetDevice
        }
    } else {
        PollState::DevDetached
    }
}

pub(super) fn step<H: Host>(hub: &mut Instance, host: &mut H) -> Status {
    match hub.poll_state {
        PollState::Idle => {
            hub.current_port = 0;
            hub.poll_state = PollState::Sync;
        }
        PollState::Sync => {
            if host.frame_number() & 1 == 0 {
                hub.poll_state = PollState::GetData;
            }
        }
        PollState::GetData => submit(hub, host),
        PollState::Poll => match host.urb_state(hub.pipe) {
            UrbState::Done => {
                hub.transfer_pending = false;
                if !hub.data_ready {
                    hub.data_ready = true;
                    let len = hub.transfer_len();
                    let read = host.read_interrupt_in(hub.pipe, &mut hub.interrupt_buffer[..len]);
                    hub.change_bitmap = ChangeBitmap(match read {
                        0 => 0,
                        _ => hub.interrupt_buffer[0],
                    });
                    trace!("HUB: change bitmap {=u8:b}", hub.change_bitmap.0);
                    hub.poll_state = if hub.change_bitmap.is_empty() {
                        PollState::GetData
                    } else {
                        PollState::LoopPortChanged
                    };
                }
            }
            UrbState::Stall => match host.clear_endpoint_stall(hub.endpoint) {
                Status::Busy => {}
                status => {
                    if status.is_failure() {
                        warn!("HUB: clearing endpoint stall: {:?}", status);
                    } else {
                        debug!("HUB: endpoint stall cleared");
                    }
                    hub.transfer_pending = false;
                    hub.poll_state = PollState::GetData;
                }
            },
            UrbState::Idle | UrbState::NotReady | UrbState::Error => {}
        },
        PollState::LoopPortChanged => match hub.change_bitmap.next_port(hub.port_count) {
            Some(port) => {
                hub.change_bitmap.clear(port);
                hub.current_port = port;
                hub.poll_state = PollState::PortChanged;
            }
            None if hub.change_bitmap.hub_changed() => {
                hub.change_bitmap.clear(0);
                hub.current_port = 0;
                hub.poll_state = PollState::HubChanged;
            }
            None => hub.poll_state = PollState::Idle,
        },
        PollState::HubChanged => {
            match host.control_in(&request::get_hub_status(), &mut hub.status_buffer) {
                Status::Ok => {
                    let status = HubStatus::from_le_bytes(hub.status_buffer);
                    trace!(
                        "HUB: hub status {=u16:#x} change {=u16:#x}",
                        status.status.bits(),
                        status.change.bits()
                    );
                    hub.poll_state = if status.change.contains(HubStatusFlags::LOCAL_POWER) {
                        PollState::CHubLocalPower
                    } else if status.change.contains(HubStatusFlags::OVER_CURRENT) {
                        PollState::CHubOverCurrent
                    } else {
                        PollState::LoopPortChanged
                    };
                }
                status => return request_result(hub, status),
            }
        }
        PollState::CHubLocalPower => return clear_hub_change(hub, host, HubFeature::CLocalPower),
        PollState::CHubOverCurrent => {
            warn!("HUB: hub over-current");
            return clear_hub_change(hub, host, HubFeature::COverCurrent);
        }
        PollState::PortChanged => {
            let setup = request::get_port_status(hub.current_port);
            match host.control_in(&setup, &mut hub.status_buffer) {
                Status::Ok => {
                    let port = PortStatus::from_le_bytes(hub.status_buffer);
                    hub.attached_speed = port.speed();
                    hub.poll_state = dispatch(&port);
                    trace!(
                        "HUB: port {} status {=u16:#x} change {=u16:#x} -> {:?}",
                        hub.current_port,
                        port.status.bits(),
                        port.change.bits(),
                        hub.poll_state
                    );
                    if !port.is_powered() {
                        warn!("HUB: port {} changed while unpowered", hub.current_port);
                    }
                }
                status => return request_result(hub, status),
            }
        }
        PollState::CPortSuspend => return clear_change(hub, host, PortFeature::CSuspend),
        PollState::CPortOverCurrent => {
            let status = clear_change(hub, host, PortFeature::COverCurrent);
            if hub.poll_state == PollState::PortChanged {
                warn!("HUB: over-current on port {}", hub.current_port);
                host.hub_event(HubEvent::PortOverCurrent {
                    port: hub.current_port,
                });
            }
            return status;
        }
        PollState::CPortConnection => return clear_change(hub, host, PortFeature::CConnection),
        PollState::CPortReset => return clear_change(hub, host, PortFeature::CReset),
        PollState::ResetDevice => {
            let setup = request::set_port_feature(hub.current_port, PortFeature::Reset);
            match host.control_out(&setup) {
                Status::Ok => {
                    debug!("HUB: port {} reset", hub.current_port);
                    host.delay_ms(hub.config.reset_settle_ms);
                    hub.poll_state = PollState::PortChanged;
                }
                status => return request_result(hub, status),
            }
        }
        PollState::DevAttached => {
            info!(
                "HUB: device attached to port {}, {:?} speed",
                hub.current_port, hub.attached_speed
            );
            host.hub_event(HubEvent::DeviceAttached {
                port: hub.current_port,
                speed: hub.attached_speed,
            });
            hub.poll_state = PollState::LoopPortWait;
        }
        PollState::DevDetached => {
            info!("HUB: device detached from port {}", hub.current_port);
            host.hub_event(HubEvent::DeviceDetached {
                port: hub.current_port,
            });
            hub.poll_state = PollState::LoopPortWait;
        }
        PollState::LoopPortWait => {
            host.delay_ms(hub.config.port_settle_ms);
            hub.poll_state = PollState::LoopPortChanged;
        }
        PollState::Error => return Status::Fail,
    }
    Status::Ok
}

/// Start-of-frame hook
///
/// Re-arms the interrupt transfer once the polling interval elapses
/// without a completion.
pub(super) fn sof<H: Host>(hub: &mut Instance, host: &mut H) {
    if hub.poll_state == PollState::Poll
        && host.frame_number().wrapping_sub(hub.last_submit) >= u32::from(hub.poll_interval_ms)
    {
        trace!("HUB: re-arming status transfer");
        hub.poll_state = PollState::GetData;
    }
}

/// Arm the status change transfer
fn submit<H: Host>(hub: &mut Instance, host: &mut H) {
    // Any transfer still pending on the pipe is superseded by this one.
    host.submit_interrupt_in(hub.pipe, hub.transfer_len() as u16);
    hub.last_submit = host.frame_number();
    hub.transfer_pending = true;
    hub.data_ready = false;
    hub.poll_state = PollState::Poll;
}

/// Issue CLEAR_FEATURE for a change bit, then re-examine the port
fn clear_change<H: Host>(hub: &mut Instance, host: &mut H, feature: PortFeature) -> Status {
    let setup = request::clear_port_feature(hub.current_port, feature);
    match host.control_out(&setup) {
        Status::Ok => {
            trace!("HUB: port {} cleared {:?}", hub.current_port, feature);
            hub.poll_state = PollState::PortChanged;
            Status::Ok
        }
        status => request_result(hub, status),
    }
}

/// Issue CLEAR_FEATURE for a hub change bit, then re-read the hub status
fn clear_hub_change<H: Host>(hub: &mut Instance, host: &mut H, feature: HubFeature) -> Status {
    match host.control_out(&request::clear_hub_feature(feature)) {
        Status::Ok => {
            hub.poll_state = PollState::HubChanged;
            Status::Ok
        }
        status => request_result(hub, status),
    }
}

/// Handle a control request that's still busy, or that failed
fn request_result(hub: &mut Instance, status: Status) -> Status {
    match status {
        Status::Ok | Status::Busy => Status::Ok,
        _ => {
            warn!(
                "HUB: request to port {} failed: {:?}",
                hub.current_port, status
            );
            hub.poll_state = PollState::Error;
            Status::Fail
        }
    }
}
