//! Background throttle speed poller
//!
//! A poller thread reads the speed register of one throttle board through a
//! [`SharedSession`] every interval and pushes the result to a channel. It
//! never touches presentation state; the consumer drains the receiver.

use crate::shared::SharedSession;
use railctl_core::bus::DeviceAddress;
use railctl_core::error::Error;
use railctl_core::stop::StopSignal;
use railctl_core::throttle::{Channel, Throttle};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Default time between speed reads
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Longest single sleep, so a stop request is noticed quickly
const STOP_CHECK: Duration = Duration::from_millis(20);

/// Measured speed of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedReading {
    /// Throttle board
    pub address: DeviceAddress,
    /// Channel measured
    pub channel: Channel,
    /// Speed as reported by the board
    pub speed: u8,
}

/// Event delivered by a poller
#[derive(Debug)]
pub enum PollEvent {
    /// A successful read, one event per channel
    Reading(SpeedReading),
    /// The speed register could not be read this round
    Failed {
        /// Throttle board
        address: DeviceAddress,
        /// What went wrong
        error: Error,
    },
}

/// Handle to a running poller thread
///
/// Dropping the handle stops the thread and waits for it.
pub struct SpeedPoller {
    address: DeviceAddress,
    stop: StopSignal,
    handle: Option<thread::JoinHandle<u64>>,
}

impl SpeedPoller {
    /// Start polling `throttle` and return the handle with its receiver
    pub fn start(
        session: SharedSession,
        throttle: Throttle,
        interval: Duration,
    ) -> std::io::Result<(Self, mpsc::Receiver<PollEvent>)> {
        let (tx, rx) = mpsc::channel();
        let poller = Self::spawn(session, throttle, interval, tx)?;
        Ok((poller, rx))
    }

    /// Start polling `throttle`, sending events to `sender`
    ///
    /// Several pollers may share one sender.
    pub fn spawn(
        mut session: SharedSession,
        throttle: Throttle,
        interval: Duration,
        sender: mpsc::Sender<PollEvent>,
    ) -> std::io::Result<Self> {
        let stop = StopSignal::new();
        let worker_stop = stop.clone();
        let address = throttle.address();

        let handle = thread::Builder::new()
            .name(format!("speed-poll-{}", address))
            .spawn(move || {
                log::debug!("poller for {} started, interval {:?}", address, interval);
                let mut rounds = 0u64;
                while !worker_stop.is_stopped() {
                    rounds += 1;
                    let events = match throttle.read_speed(&mut session) {
                        Ok(speeds) => Channel::ALL
                            .iter()
                            .map(|&channel| {
                                PollEvent::Reading(SpeedReading {
                                    address,
                                    channel,
                                    speed: speeds[usize::from(channel.index())],
                                })
                            })
                            .collect(),
                        Err(error) => vec![PollEvent::Failed { address, error }],
                    };
                    for event in events {
                        if sender.send(event).is_err() {
                            log::debug!("poller for {}: receiver gone", address);
                            return rounds;
                        }
                    }
                    sleep_unless_stopped(interval, &worker_stop);
                }
                log::debug!("poller for {} stopped after {} rounds", address, rounds);
                rounds
            })?;

        Ok(Self {
            address,
            stop,
            handle: Some(handle),
        })
    }

    /// Board being polled
    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Signal that stops this poller when raised
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Stop the thread and wait for it; returns the number of rounds run
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.stop.stop();
        match self.handle.take().map(thread::JoinHandle::join) {
            Some(Ok(rounds)) => rounds,
            Some(Err(_)) => {
                log::error!("poller for {} panicked", self.address);
                0
            }
            None => 0,
        }
    }
}

impl Drop for SpeedPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sleep_unless_stopped(total: Duration, stop: &StopSignal) {
    let mut left = total;
    while !left.is_zero() && !stop.is_stopped() {
        let step = left.min(STOP_CHECK);
        thread::sleep(step);
        left -= step;
    }
}
