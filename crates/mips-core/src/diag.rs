//! Diagnostic reports, the injectable sink they flow into, and per-class counters.

use std::fmt;

use log::{info, warn};

use crate::{Fault, FaultClass};

/// One report emitted by the engine. Reports are fire-and-forget: the engine
/// never inspects what the sink does with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// A non-fatal fault absorbed by the step.
    Fault {
        /// Address of the instruction that raised it.
        pc: u32,
        /// The fault.
        fault: Fault,
    },
    /// A coprocessor instruction was observed and not executed.
    Coprocessor {
        /// Address of the instruction.
        pc: u32,
        /// Coprocessor number.
        unit: u8,
        /// Format field.
        format: u8,
        /// Function field.
        function: u8,
    },
    /// A coprocessor load or store (`LWC1`/`SWC1`) was observed and not executed.
    CoprocessorTransfer {
        /// Address of the instruction.
        pc: u32,
        /// Coprocessor number.
        unit: u8,
        /// True for stores.
        store: bool,
        /// Effective address the transfer would have used.
        address: u32,
    },
    /// `BREAK` executed.
    Break {
        /// Address of the instruction.
        pc: u32,
        /// 20-bit code field.
        code: u32,
    },
    /// `SYSCALL` executed.
    Syscall {
        /// Address of the instruction.
        pc: u32,
        /// 20-bit code field.
        code: u32,
    },
}

impl Diagnostic {
    /// Address of the instruction this report is about.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        match self {
            Self::Fault { pc, .. }
            | Self::Coprocessor { pc, .. }
            | Self::CoprocessorTransfer { pc, .. }
            | Self::Break { pc, .. }
            | Self::Syscall { pc, .. } => *pc,
        }
    }

    /// The fault, for fault reports.
    #[must_use]
    pub const fn fault(&self) -> Option<Fault> {
        match self {
            Self::Fault { fault, .. } => Some(*fault),
            Self::Coprocessor { .. }
            | Self::CoprocessorTransfer { .. }
            | Self::Break { .. }
            | Self::Syscall { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault { pc, fault } => write!(f, "{pc:08x}: {fault}"),
            Self::Coprocessor {
                pc,
                unit,
                format,
                function,
            } => write!(
                f,
                "{pc:08x}: cop{unit} format 0x{format:02x} function 0x{function:02x} not executed"
            ),
            Self::CoprocessorTransfer {
                pc,
                unit,
                store,
                address,
            } => {
                let verb = if *store { "swc" } else { "lwc" };
                write!(f, "{pc:08x}: {verb}{unit} at 0x{address:08x} not executed")
            }
            Self::Break { pc, code } => write!(f, "{pc:08x}: break 0x{code:05x}"),
            Self::Syscall { pc, code } => write!(f, "{pc:08x}: syscall 0x{code:05x}"),
        }
    }
}

/// Destination for engine diagnostics, injected into the machine.
pub trait DiagnosticSink {
    /// Accepts one report. Must not fail or panic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Default sink: faults at `warn`, observations at `info`, via the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Fault { .. } => warn!(target: "mips_core", "{diagnostic}"),
            Diagnostic::Coprocessor { .. }
            | Diagnostic::CoprocessorTransfer { .. }
            | Diagnostic::Break { .. }
            | Diagnostic::Syscall { .. } => info!(target: "mips_core", "{diagnostic}"),
        }
    }
}

/// Sink that keeps every report in memory, for headless drivers and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    entries: Vec<Diagnostic>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Fault reports only.
    pub fn faults(&self) -> impl Iterator<Item = Fault> + '_ {
        self.entries.iter().filter_map(Diagnostic::fault)
    }

    /// Number of reports received.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drains and returns all reports.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

/// Saturating execution and fault counters kept by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagnosticCounters {
    /// The last fault that occurred, if any.
    pub last_fault: Option<Fault>,
    /// Address of the instruction that raised the last fault.
    pub last_fault_pc: u32,
    /// Decode-class faults.
    pub fault_count_decode: u64,
    /// Memory-class faults.
    pub fault_count_memory: u64,
    /// Register-class faults.
    pub fault_count_register: u64,
    /// Arithmetic-class faults.
    pub fault_count_arithmetic: u64,
    /// Control-class faults.
    pub fault_count_control: u64,
    /// Calls to `step`.
    pub step_count: u64,
    /// Fetch/decode/execute cycles, delay slots included.
    pub instruction_count: u64,
}

impl DiagnosticCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault occurrence under its class.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_fault(&mut self, fault: Fault, pc: u32) {
        self.last_fault = Some(fault);
        self.last_fault_pc = pc;
        let counter = match fault.class() {
            FaultClass::Decode => &mut self.fault_count_decode,
            FaultClass::Memory => &mut self.fault_count_memory,
            FaultClass::Register => &mut self.fault_count_register,
            FaultClass::Arithmetic => &mut self.fault_count_arithmetic,
            FaultClass::Control => &mut self.fault_count_control,
        };
        *counter = counter.saturating_add(1);
    }

    /// Total faults across all classes.
    #[must_use]
    pub const fn fault_count(&self) -> u64 {
        self.fault_count_decode
            .saturating_add(self.fault_count_memory)
            .saturating_add(self.fault_count_register)
            .saturating_add(self.fault_count_arithmetic)
            .saturating_add(self.fault_count_control)
    }

    /// Counts one `step` call that ran `cycles` fetch/decode/execute cycles.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_step(&mut self, cycles: u32) {
        self.step_count = self.step_count.saturating_add(1);
        self.instruction_count = self.instruction_count.saturating_add(u64::from(cycles));
    }

    /// Resets all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
