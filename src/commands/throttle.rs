//! Throttle board commands

use railctl_bus::{PollEvent, SharedSession, SpeedPoller};
use railctl_core::access::RegisterAccess;
use railctl_core::throttle::{Channel, Direction, Throttle};
use std::collections::HashMap;
use std::error::Error;
use std::time::Duration;

/// Set the power of one channel
pub fn cmd_power<A: RegisterAccess + ?Sized>(
    access: &mut A,
    throttle: Throttle,
    channel: Channel,
    percent: u8,
) -> Result<(), Box<dyn Error>> {
    throttle.set_power(access, channel, percent)?;
    println!("{} channel {}: power {}%", throttle.address(), channel, percent);
    Ok(())
}

/// Set the direction of one channel
pub fn cmd_direction<A: RegisterAccess + ?Sized>(
    access: &mut A,
    throttle: Throttle,
    channel: Channel,
    direction: Direction,
) -> Result<(), Box<dyn Error>> {
    throttle.set_direction(access, channel, direction)?;
    println!("{} channel {}: {:?}", throttle.address(), channel, direction);
    Ok(())
}

/// Enable or disable momentum on one channel
pub fn cmd_momentum<A: RegisterAccess + ?Sized>(
    access: &mut A,
    throttle: Throttle,
    channel: Channel,
    enabled: bool,
) -> Result<(), Box<dyn Error>> {
    throttle.set_momentum(access, channel, enabled)?;
    println!(
        "{} channel {}: momentum {}",
        throttle.address(),
        channel,
        if enabled { "on" } else { "off" }
    );
    Ok(())
}

/// Read both channels once
pub fn cmd_speed<A: RegisterAccess + ?Sized>(
    access: &mut A,
    throttle: Throttle,
) -> Result<(), Box<dyn Error>> {
    let speeds = throttle.read_speed(access)?;
    for channel in Channel::ALL {
        println!(
            "{} channel {}: speed {}",
            throttle.address(),
            channel,
            speeds[usize::from(channel.index())]
        );
    }
    Ok(())
}

/// Poll the speed register in the background and print readings
///
/// Stops once every channel has reported `count` readings.
pub fn cmd_poll(
    session: SharedSession,
    throttle: Throttle,
    interval: Duration,
    count: u32,
) -> Result<(), Box<dyn Error>> {
    let (poller, events) = SpeedPoller::start(session, throttle, interval)?;
    let mut seen: HashMap<Channel, u32> = HashMap::new();
    let mut failures = 0u32;

    for event in events.iter() {
        match event {
            PollEvent::Reading(reading) => {
                println!(
                    "{} channel {}: speed {}",
                    reading.address, reading.channel, reading.speed
                );
                *seen.entry(reading.channel).or_default() += 1;
            }
            PollEvent::Failed { address, error } => {
                log::warn!("{}: speed read failed: {}", address, error);
                failures += 1;
            }
        }
        if Channel::ALL
            .iter()
            .all(|c| seen.get(c).copied().unwrap_or(0) >= count)
            || failures >= count
        {
            break;
        }
    }

    let rounds = poller.stop();
    log::info!("Poller ran {} round(s), {} failed", rounds, failures);
    if failures >= count {
        return Err(format!("{}: speed reads keep failing", throttle.address()).into());
    }
    Ok(())
}
