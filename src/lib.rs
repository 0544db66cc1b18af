//! A USB host class driver for USB 2.0 hubs
//!
//! `usbh-hub` enumerates a hub (reads its hub descriptor, powers its
//! downstream ports), then polls the hub's status change endpoint, and
//! drives every changed port through connection, reset, attach and detach
//! handling. Devices that appear behind the hub are reported to your host
//! stack as [`HubEvent`]s.
//!
//! The driver sits on top of a host stack. The host stack executes control
//! and interrupt transfers, owns pipes, and counts frames; you expose those
//! primitives by implementing [`Host`]. The host stack then drives the hub
//! through the [`ClassDriver`] interface. See the [`hub`] module for the
//! call sequence.
//!
//! The driver has no threads, and no interior mutability. If your
//! start-of-frame callback runs in an interrupt handler, share the driver
//! through [`SharedHub`].
//!
//! Enable the `defmt-03` feature to log driver activity with `defmt`.

#![no_std]

#[cfg(feature = "defmt-03")]
extern crate defmt_03 as defmt;

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

#[cfg(test)]
mod mock;

pub mod class;
pub mod descriptor;
pub mod host;
pub mod hub;
pub mod port;
pub mod request;
mod shared;

pub use class::{ClassDriver, Status};
pub use host::{Host, HubEvent, Pipe, Speed, UrbState};
pub use hub::{Config, EnumState, Error, Hub, PollState};
pub use shared::SharedHub;
