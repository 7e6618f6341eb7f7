//! Track switch command

use railctl_core::access::RegisterAccess;
use railctl_core::turnout::{Position, TurnoutBoard};
use std::error::Error;

/// Throw one turnout
pub fn cmd_turnout<A: RegisterAccess + ?Sized>(
    access: &mut A,
    board: TurnoutBoard,
    id: u8,
    position: Position,
) -> Result<(), Box<dyn Error>> {
    let report = board.set(access, id, position)?;
    println!(
        "{} turnout {}: {:?} (confirmed after {} attempt(s))",
        board.address(),
        id,
        position,
        report.attempts
    );
    Ok(())
}
