//! Interrupt-safe access to a hub driver

use crate::{
    class::{ClassDriver, Status},
    host::Host,
    hub::Hub,
};
use core::cell::RefCell;
use cortex_m::interrupt::{self, Mutex};

/// A [`Hub`] that can be driven from both thread mode and an interrupt
///
/// Some host stacks invoke the start-of-frame hook from the USB interrupt,
/// while `class_request` and `process` run from the main loop. The hub
/// driver has no reentrancy protection, so every call must be serialized.
/// `SharedHub` serializes them with a critical section.
///
/// # Example
///
/// ```no_run
/// use usbh_hub::{Hub, SharedHub};
///
/// static HUB: SharedHub = SharedHub::new(Hub::new());
///
/// // In the USB interrupt, once per frame:
/// // HUB.sof_process(&mut host);
///
/// // In the main loop:
/// // HUB.process(&mut host);
/// ```
pub struct SharedHub {
    hub: Mutex<RefCell<Hub>>,
}

impl SharedHub {
    /// Wrap a hub driver, typically in a `static`
    pub const fn new(hub: Hub) -> Self {
        SharedHub {
            hub: Mutex::new(RefCell::new(hub)),
        }
    }

    /// Interrupt-safe, immutable access to the hub driver
    pub fn with_hub<R>(&self, func: impl FnOnce(&Hub) -> R) -> R {
        interrupt::free(|cs| {
            let hub = self.hub.borrow(cs);
            let hub = hub.borrow();
            func(&hub)
        })
    }

    /// Interrupt-safe, mutable access to the hub driver
    pub fn with_hub_mut<R>(&self, func: impl FnOnce(&mut Hub) -> R) -> R {
        interrupt::free(|cs| {
            let hub = self.hub.borrow(cs);
            let mut hub = hub.borrow_mut();
            func(&mut hub)
        })
    }

    /// See [`ClassDriver::init`]
    pub fn init<H: Host>(&self, host: &mut H) -> Status {
        self.with_hub_mut(|hub| hub.init(host))
    }

    /// See [`ClassDriver::deinit`]
    pub fn deinit<H: Host>(&self, host: &mut H) -> Status {
        self.with_hub_mut(|hub| hub.deinit(host))
    }

    /// See [`ClassDriver::class_request`]
    pub fn class_request<H: Host>(&self, host: &mut H) -> Status {
        self.with_hub_mut(|hub| hub.class_request(host))
    }

    /// See [`ClassDriver::process`]
    pub fn process<H: Host>(&self, host: &mut H) -> Status {
        self.with_hub_mut(|hub| hub.process(host))
    }

    /// Start-of-frame hook; safe to call from the frame interrupt
    pub fn sof_process<H: Host>(&self, host: &mut H) -> Status {
        self.with_hub_mut(|hub| hub.sof_process(host))
    }
}
