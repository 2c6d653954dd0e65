//! External programs: the C compiler building gps-sdr-sim, gps-sdr-sim
//! itself and hackrf_transfer.
//!
//! Output goes straight to the console. A failing program is logged and
//! never stops the run.

use std::path::Path;
use std::process::Command;

use tracing::{error, info, warn};

use brdc_core::config::{SimulatorConfig, TransmitterConfig};

/// C compiler used for the one-time simulator build.
pub const COMPILER: &str = "gcc";

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Invocation {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Shell-like one-line rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs invocations inside a working directory.
pub trait CommandRunner {
    fn run(&mut self, cmd: &Invocation, cwd: &Path);
}

/// Spawns real processes and waits for them.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, cmd: &Invocation, cwd: &Path) {
        info!("running {}", cmd.command_line());
        match Command::new(&cmd.program)
            .args(&cmd.args)
            .current_dir(cwd)
            .status()
        {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("{} exited with {status}", cmd.program),
            Err(e) => error!("failed to start {}: {e}", cmd.program),
        }
    }
}

/// `gcc <source> -lm -O3 -o <binary>`
pub fn build_command(sim: &SimulatorConfig) -> Invocation {
    Invocation::new(COMPILER, &[sim.source.as_str(), "-lm", "-O3", "-o", sim.binary.as_str()])
}

/// `<work_dir>/<binary> -e <ephemeris> -l <location> -b <iq_bits>`
pub fn simulator_command(sim: &SimulatorConfig, work_dir: &Path, ephemeris: &Path) -> Invocation {
    let program = work_dir.join(&sim.binary);
    let ephemeris = ephemeris.display().to_string();
    let iq_bits = sim.iq_bits.to_string();
    Invocation::new(
        program.display().to_string(),
        &["-e", ephemeris.as_str(), "-l", sim.location.as_str(), "-b", iq_bits.as_str()],
    )
}

/// `hackrf_transfer -t <signal_file> -f <freq> -s <rate> -a <amp> -x <gain>`
pub fn transmitter_command(tx: &TransmitterConfig) -> Invocation {
    let frequency = tx.frequency.to_string();
    let sample_rate = tx.sample_rate.to_string();
    let amp = u8::from(tx.amp_enable).to_string();
    let gain = tx.tx_gain.to_string();
    Invocation::new(
        tx.binary.as_str(),
        &[
            "-t",
            tx.signal_file.as_str(),
            "-f",
            frequency.as_str(),
            "-s",
            sample_rate.as_str(),
            "-a",
            amp.as_str(),
            "-x",
            gain.as_str(),
        ],
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
