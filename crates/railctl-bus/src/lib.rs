//! railctl-bus - Bus selection and shared sessions
//!
//! The CLI talks to buses only through this crate: it opens a backend from
//! a bus string, wraps it in a session and, when several activities need
//! the bus at once, shares that session behind a single lock.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  CLI (bin/railctl)                   │
//! │  - bus string, commands, progress bars               │
//! └──────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               railctl-bus (this crate)               │
//! │  - open_bus / open_session: backends by name         │
//! │  - SharedSession: one lock around bus + sequence     │
//! │  - SpeedPoller: background reads over a channel      │
//! └──────────────────────────────────────────────────────┘
//!                           │
//!             ┌─────────────┴─────────────┐
//!             ▼                           ▼
//! ┌────────────────────────┐  ┌────────────────────────┐
//! │     railctl-core       │  │    Backend crates      │
//! │  - transport, verify   │  │  - dummy, linux-i2c    │
//! │  - inventory, diag     │  │  - implement           │
//! │  - lights, throttle    │  │    RegisterBus         │
//! └────────────────────────┘  └────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use railctl_bus::{open_shared, SpeedPoller};
//! use railctl_core::throttle::Throttle;
//!
//! let session = open_shared("linux_i2c:bus=1", Default::default())?;
//! let (poller, readings) = SpeedPoller::start(session.clone(), Throttle::new(address), interval)?;
//! for event in readings.iter().take(10) {
//!     println!("{:?}", event);
//! }
//! poller.stop();
//! ```

mod poll;
mod registry;
mod shared;

pub use poll::{PollEvent, SpeedPoller, SpeedReading, DEFAULT_POLL_INTERVAL};
pub use registry::{
    available_buses, bus_names_short, open_bus, open_session, open_shared, parse_bus_params,
    BoxedBus, BusInfo, BusParams,
};
pub use shared::SharedSession;
