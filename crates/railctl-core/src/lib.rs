//! railctl-core - Register protocol core for layout boards
//!
//! This crate implements the host side of the register protocol spoken by
//! the microcontroller boards (throttles, lights, track switches) hanging
//! off a shared, half-duplex I2C bus.
//!
//! # Layers
//!
//! - [`checksum`] - single-byte additive checksum
//! - [`frame`] - register read frames and sequence-numbered write frames
//! - [`protocol`] - retrying register transport and the write-verify engine
//! - [`session`] - one owner for the bus handle and the sequence counter
//! - [`scan`] - bus enumeration from an `i2cdetect`-style grid
//! - [`inventory`] - identification registers into [`inventory::BoardInfo`]
//! - [`diag`] - block read/write and loopback stress tests
//!
//! Bus backends implement [`bus::RegisterBus`]; everything above the
//! transport is written against [`access::RegisterAccess`] so it works the
//! same on an exclusively owned session and on a shared one.
//!
//! # Example
//!
//! ```ignore
//! use railctl_core::access::RegisterAccess;
//! use railctl_core::session::BusSession;
//!
//! let mut session = BusSession::new(bus);
//! let found = session.enumerate();
//! let inventory = railctl_core::inventory::collect_inventory(&mut session, &found.addresses);
//! for entry in inventory.iter() {
//!     println!("{}: {}", entry.address, entry.info.description);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod access;
pub mod bus;
pub mod checksum;
pub mod diag;
pub mod error;
pub mod frame;
pub mod inventory;
pub mod lights;
pub mod protocol;
pub mod registers;
pub mod scan;
pub mod session;
pub mod stop;
pub mod throttle;
pub mod turnout;

pub use error::{Error, Result};
