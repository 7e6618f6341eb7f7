//! Diagnostic commands with progress output

use crate::cli::TestArgs;
use indicatif::{ProgressBar, ProgressStyle};
use railctl_core::access::RegisterAccess;
use railctl_core::bus::DeviceAddress;
use railctl_core::diag::{self, RunControl};
use std::error::Error;

/// Which runner to drive
#[derive(Debug, Clone, Copy)]
pub enum TestKind {
    /// Single-attempt block reads
    Read {
        /// Register read
        register: u8,
    },
    /// Verified block writes
    Write {
        /// Register written
        register: u8,
    },
    /// Raw loopback reads
    Loopback,
}

impl TestKind {
    fn label(&self) -> &'static str {
        match self {
            TestKind::Read { .. } => "block read",
            TestKind::Write { .. } => "block write",
            TestKind::Loopback => "loopback",
        }
    }
}

fn create_progress_bar(total: u64, label: &str) -> Result<ProgressBar, Box<dyn Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{per_sec}}, {{eta}}) {}",
                label
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Run a diagnostic against one address or every address found by a scan
pub fn cmd_test<A: RegisterAccess + ?Sized>(
    access: &mut A,
    args: &TestArgs,
    kind: TestKind,
) -> Result<(), Box<dyn Error>> {
    let targets: Vec<DeviceAddress> = match args.address {
        Some(address) => vec![address],
        None => {
            let found = access.enumerate();
            if let Some(e) = found.probe_error {
                return Err(format!("Bus scan failed: {}", e).into());
            }
            found.addresses
        }
    };
    if targets.is_empty() {
        println!("No devices to test");
        return Ok(());
    }

    // Nothing raises the stop signal here; runs are bounded by --iterations
    let control = RunControl {
        pause_us: args.pause_us,
        ..Default::default()
    };

    for address in targets {
        let label = format!("{} {}", kind.label(), address);
        let pb = create_progress_bar(u64::from(args.iterations), &label)?;
        let progress = |done: u32| pb.set_position(u64::from(done));

        let summary = match kind {
            TestKind::Read { register } => {
                diag::block_read_test(access, address, register, args.iterations, &control, progress)?
                    .to_string()
            }
            TestKind::Write { register } => {
                diag::block_write_test(access, address, register, args.iterations, &control, progress)?
                    .to_string()
            }
            TestKind::Loopback => {
                diag::loopback_test(access, address, args.iterations, &control, progress)?
                    .to_string()
            }
        };

        pb.finish();
        println!("{}: {}", address, summary);
    }
    Ok(())
}
