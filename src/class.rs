//! The class driver capability interface
//!
//! A host stack keeps one entry per supported USB class, and drives each
//! entry through the same five calls. [`ClassDriver`] is that entry.
//! The hub driver, [`Hub`](crate::Hub), is one implementation; HID, CDC
//! and mass storage drivers would be others.

use crate::host::Host;

/// Result of a class driver step, or of a host primitive
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Status {
    /// The operation completed.
    Ok,
    /// Call again; the operation is still in progress.
    Busy,
    /// The operation failed, and will not make progress.
    Fail,
    /// The device rejected the request.
    NotSupported,
}

impl Status {
    /// Returns `true` for [`Status::Ok`]
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Returns `true` for the two terminal failures
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Fail | Status::NotSupported)
    }
}

/// Entry points that a host stack invokes on a class driver
///
/// The host stack calls [`init()`](ClassDriver::init) once the device is
/// addressed and configured, then calls [`class_request()`](ClassDriver::class_request)
/// until it returns [`Status::Ok`] or a failure. After that, it calls
/// [`process()`](ClassDriver::process) from its main loop, and
/// [`sof_process()`](ClassDriver::sof_process) once per frame.
///
/// The host stack must never run two of these calls for the same driver at the
/// same time. See [`SharedHub`](crate::SharedHub) if the frame hook runs
/// in an interrupt handler.
///
/// The trait is object safe, so a host stack may hold `&mut dyn ClassDriver<H>`.
pub trait ClassDriver<H: Host> {
    /// Short, human-readable class name
    fn name(&self) -> &'static str;
    /// The interface class code that this driver binds to
    fn class_code(&self) -> u8;
    /// Bind to the device's interface, and allocate driver state
    fn init(&mut self, host: &mut H) -> Status;
    /// Release everything acquired in `init`
    fn deinit(&mut self, host: &mut H) -> Status;
    /// One step of class-specific enumeration
    fn class_request(&mut self, host: &mut H) -> Status;
    /// One step of the runtime state machine
    fn process(&mut self, host: &mut H) -> Status;
    /// Start-of-frame hook
    fn sof_process(&mut self, host: &mut H) -> Status;
}
