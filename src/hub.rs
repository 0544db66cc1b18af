//! The hub class driver
//!
//! # Usage
//!
//! 1. Implement [`Host`] for your host stack.
//! 2. Register a [`Hub`] as the class driver for interface class `0x09`.
//! 3. Drive it through the [`ClassDriver`] calls: `init`, then `class_request`
//!    until it's no longer busy, then `process` from the main loop and
//!    `sof_process` once per frame.
//! 4. Handle [`HubEvent`](crate::HubEvent)s in [`Host::hub_event`] to enumerate
//!    the devices behind the hub.
//!
//! # Design
//!
//! Two state machines run on each attached hub. Enumeration runs once,
//! reading the hub descriptor and powering each port. Then the polling
//! machine listens on the hub's status change endpoint, and walks every
//! changed port through connection, reset, attach and detach handling.
//!
//! Every call executes exactly one state. Only three states block, and
//! only for a fixed delay: waiting for port power, the settle time after a
//! port reset, and the settle time between ports. All other states return
//! right away so the host stack's loop stays responsive.
//!
//! At most one interrupt transfer is outstanding. The start-of-frame hook
//! may re-arm the transfer if the hub hasn't answered within the polling
//! interval; the new submission replaces the old one on the same pipe.

mod enumeration;
mod instance;
mod polling;


pub use enumeration::EnumState;
pub use instance::{HUB_CLASS, MAX_INTERFACES};
pub use polling::{dispatch, PollState};

use crate::{
    class::{ClassDriver, Status},
    descriptor::{HubDescriptor, MAX_PORTS},
    host::Host,
};
use instance::Instance;

/// Driver timing and limits
///
/// Use [`Config::default()`] unless your hubs need longer settle times.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    /// Floor for the status endpoint polling interval, in milliseconds
    ///
    /// The endpoint descriptor's interval is used when it's larger.
    pub min_poll_interval_ms: u16,
    /// Delay after signaling a port reset
    pub reset_settle_ms: u32,
    /// Delay after reporting an attach or detach, before the next port
    pub port_settle_ms: u32,
    /// Maximum number of ports to manage. Saturates at [`MAX_PORTS`].
    pub max_ports: u8,
}

impl Config {
    /// The default configuration, usable in `const` contexts
    pub const fn new() -> Self {
        Config {
            min_poll_interval_ms: 200,
            reset_settle_ms: 150,
            port_settle_ms: 10,
            max_ports: MAX_PORTS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Reasons that `init` or enumeration failed
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error {
    /// The device has no hub interface, or it has no endpoint
    InterfaceNotFound,
    /// The hub interface index is out of range
    InvalidInterface(u8),
    /// The hub's first endpoint isn't an interrupt IN endpoint
    NotInterruptIn,
    /// The host stack is out of pipes
    PipeAllocation,
    /// `init` called twice without a `deinit`
    AlreadyInitialized,
    /// The hub descriptor is truncated, or isn't a hub descriptor
    InvalidDescriptor,
    /// A host request failed with this status
    Request(Status),
}

/// A USB hub class driver
///
/// `Hub` owns the state for one attached hub. That state exists between
/// [`init()`](ClassDriver::init) and [`deinit()`](ClassDriver::deinit).
///
/// ```
/// use usbh_hub::{Config, Hub};
///
/// let hub = Hub::with_config(Config {
///     reset_settle_ms: 200,
///     ..Config::default()
/// });
/// assert!(!hub.is_ready());
/// assert_eq!(hub.port_count(), 0);
/// ```
pub struct Hub {
    config: Config,
    instance: Option<Instance>,
    last_error: Option<Error>,
}

impl Hub {
    /// Create a hub driver with the default configuration
    pub const fn new() -> Self {
        Self::with_config(Config::new())
    }

    /// Create a hub driver with custom timing and limits
    pub const fn with_config(config: Config) -> Self {
        Hub {
            config,
            instance: None,
            last_error: None,
        }
    }

    /// Returns the configuration this driver was created with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the reason for the most recent failure, if any
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Returns the number of managed downstream ports
    ///
    /// Zero until the hub descriptor has been read.
    pub fn port_count(&self) -> u8 {
        self.instance.as_ref().map_or(0, |hub| hub.port_count)
    }

    /// Returns the hub descriptor, once it has been read
    pub fn descriptor(&self) -> Option<&HubDescriptor> {
        self.instance.as_ref()?.descriptor.as_ref()
    }

    /// Returns the enumeration state, or `None` before `init`
    pub fn enumeration_state(&self) -> Option<EnumState> {
        self.instance.as_ref().map(|hub| hub.enum_state)
    }

    /// Returns the polling state, or `None` before `init`
    pub fn polling_state(&self) -> Option<PollState> {
        self.instance.as_ref().map(|hub| hub.poll_state)
    }

    /// Returns the port currently being examined, or zero
    pub fn current_port(&self) -> u8 {
        self.instance.as_ref().map_or(0, |hub| hub.current_port)
    }

    /// Returns the effective status endpoint polling interval
    pub fn poll_interval_ms(&self) -> Option<u16> {
        self.instance.as_ref().map(|hub| hub.poll_interval_ms)
    }

    /// Indicates if an interrupt transfer is outstanding
    pub fn is_transfer_pending(&self) -> bool {
        self.instance
            .as_ref()
            .is_some_and(|hub| hub.transfer_pending)
    }

    /// Indicates if enumeration finished, and the hub is being polled
    pub fn is_ready(&self) -> bool {
        self.enumeration_state() == Some(EnumState::Done)
    }

    fn fail(&mut self, error: Error) -> Status {
        warn!("HUB: {:?}", error);
        self.last_error = Some(error);
        Status::Fail
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> ClassDriver<H> for Hub {
    fn name(&self) -> &'static str {
        "HUB"
    }

    fn class_code(&self) -> u8 {
        HUB_CLASS
    }

    fn init(&mut self, host: &mut H) -> Status {
        if self.instance.is_some() {
            return self.fail(Error::AlreadyInitialized);
        }
        match Instance::open(host, self.config) {
            Ok(instance) => {
                self.instance = Some(instance);
                self.last_error = None;
                Status::Ok
            }
            Err(error) => self.fail(error),
        }
    }

    fn deinit(&mut self, host: &mut H) -> Status {
        if let Some(instance) = self.instance.take() {
            instance.close(host);
        }
        Status::Ok
    }

    fn class_request(&mut self, host: &mut H) -> Status {
        let Some(hub) = self.instance.as_mut() else {
            return Status::Fail;
        };
        match enumeration::step(hub, host) {
            Ok(status) => status,
            Err(error) => self.fail(error),
        }
    }

    fn process(&mut self, host: &mut H) -> Status {
        match self.instance.as_mut() {
            None => Status::Fail,
            Some(hub) if hub.enum_state == EnumState::Error => Status::Fail,
            Some(hub) if hub.enum_state != EnumState::Done => Status::Busy,
            Some(hub) => polling::step(hub, host),
        }
    }

    fn sof_process(&mut self, host: &mut H) -> Status {
        match self.instance.as_mut() {
            None => Status::Fail,
            Some(hub) if hub.enum_state == EnumState::Error => Status::Fail,
            Some(hub) if hub.enum_state != EnumState::Done => Status::Busy,
            Some(hub) => {
                polling::sof(hub, host);
                Status::Ok
            }
        }
    }
}
