//! Machine control surface for drivers and debug front ends.

use log::debug;

use crate::diag::{Diagnostic, DiagnosticCounters, DiagnosticSink, LogSink};
use crate::execute::step_one;
use crate::memory::{AccessWidth, BusError, MemoryBus};
use crate::state::RegisterFile;
use crate::Fault;

/// Top-level configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// `PC` after [`Machine::reset`]. Zero unless a boot vector is wanted.
    pub reset_pc: u32,
    /// Emits a `trace`-level log record with the disassembly of every cycle.
    pub trace_instructions: bool,
}

/// Result of one [`Machine::step`]. Drivers may ignore it; every fault has
/// already been reported to the diagnostic sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Every cycle of the step completed without a fault.
    Retired {
        /// Fetch/decode/execute cycles run (2 when a delay slot executed).
        cycles: u32,
    },
    /// At least one fault was absorbed during the step.
    Faulted {
        /// Fetch/decode/execute cycles run.
        cycles: u32,
        /// The first fault of the step.
        fault: Fault,
    },
}

impl StepOutcome {
    /// Fetch/decode/execute cycles run by the step.
    #[must_use]
    pub const fn cycles(&self) -> u32 {
        match self {
            Self::Retired { cycles } | Self::Faulted { cycles, .. } => *cycles,
        }
    }

    /// The first fault of the step, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<Fault> {
        match self {
            Self::Retired { .. } => None,
            Self::Faulted { fault, .. } => Some(*fault),
        }
    }
}

/// When [`Machine::run`] returns early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunBoundary {
    /// Run the full step budget.
    #[default]
    StepBudget,
    /// Stop after the first step that absorbed a fault.
    Fault,
}

/// Aggregated outcome of [`Machine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Steps executed.
    pub steps: u64,
    /// Outcome of the last step, if any ran.
    pub final_step: Option<StepOutcome>,
}

/// Sink adapter that tallies faults before forwarding.
struct Counting<'a, S: ?Sized> {
    inner: &'a mut S,
    counters: &'a mut DiagnosticCounters,
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Counting<'_, S> {
    fn report(&mut self, diagnostic: Diagnostic) {
        if let Diagnostic::Fault { pc, fault } = diagnostic {
            self.counters.record_fault(fault, pc);
        }
        self.inner.report(diagnostic);
    }
}

/// A simulated machine: register file, memory bus, and diagnostic sink.
///
/// The bus is built and populated by the caller before stepping begins.
/// Machines are single-threaded; independent instances share nothing.
#[derive(Debug)]
pub struct Machine<S: DiagnosticSink = LogSink> {
    registers: RegisterFile,
    bus: MemoryBus,
    sink: S,
    counters: DiagnosticCounters,
    config: MachineConfig,
}

impl Machine<LogSink> {
    /// Creates a machine that logs diagnostics through the `log` facade.
    #[must_use]
    pub fn new(bus: MemoryBus) -> Self {
        Self::with_config(bus, MachineConfig::default())
    }

    /// Creates a logging machine with a custom configuration.
    #[must_use]
    pub fn with_config(bus: MemoryBus, config: MachineConfig) -> Self {
        Self::with_sink(bus, config, LogSink)
    }
}

impl<S: DiagnosticSink> Machine<S> {
    /// Creates a machine reporting to `sink`. Registers start reset.
    #[must_use]
    pub fn with_sink(bus: MemoryBus, config: MachineConfig, sink: S) -> Self {
        let mut registers = RegisterFile::new();
        registers.set_pc(config.reset_pc);
        Self {
            registers,
            bus,
            sink,
            counters: DiagnosticCounters::new(),
            config,
        }
    }

    /// Zeroes all registers, `HI`, and `LO`, sets `PC` to the configured reset
    /// address, and clears the counters. The bus and its regions are untouched.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.registers.set_pc(self.config.reset_pc);
        self.counters.reset();
        debug!(target: "mips_core", "reset, pc={:08x}", self.config.reset_pc);
    }

    /// Runs one step: a fetch/decode/execute cycle, plus the delay slot of a
    /// deferred jump.
    pub fn step(&mut self) -> StepOutcome {
        let mut sink = Counting {
            inner: &mut self.sink,
            counters: &mut self.counters,
        };
        let outcome = step_one(&mut self.registers, &self.bus, &mut sink, &self.config);
        self.counters.record_step(outcome.cycles());
        outcome
    }

    /// Runs up to `max_steps` steps, stopping early at `boundary`.
    pub fn run(&mut self, max_steps: u64, boundary: RunBoundary) -> RunOutcome {
        let mut outcome = RunOutcome {
            steps: 0,
            final_step: None,
        };
        while outcome.steps < max_steps {
            let step = self.step();
            outcome.steps += 1;
            outcome.final_step = Some(step);
            if boundary == RunBoundary::Fault && step.fault().is_some() {
                break;
            }
        }
        outcome
    }

    /// Reads general register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `0..32`.
    #[must_use]
    pub fn read_register(&self, index: usize) -> i32 {
        self.registers.get(index)
    }

    /// Reads memory through the bus without touching machine state.
    ///
    /// Device regions with read side effects still observe the access.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the address is unmapped or the region fails.
    pub fn peek_memory(&self, width: AccessWidth, address: u64) -> Result<u64, BusError> {
        self.bus.read(width, address)
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Mutable register file, for loaders and debuggers.
    pub const fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Memory bus.
    #[must_use]
    pub const fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    /// Mutable memory bus, for registering regions after construction.
    pub const fn bus_mut(&mut self) -> &mut MemoryBus {
        &mut self.bus
    }

    /// Diagnostic sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable diagnostic sink.
    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Execution and fault counters since the last reset.
    #[must_use]
    pub const fn counters(&self) -> &DiagnosticCounters {
        &self.counters
    }

    /// Machine configuration.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }
}
