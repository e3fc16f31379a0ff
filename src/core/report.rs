// texbatch/src/core/report.rs
use super::WorkKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tiling,
    Blurring,
    Preview,
    Mipmap,
}

impl Phase {
    pub fn for_kind(kind: WorkKind) -> Self {
        match kind {
            WorkKind::Tile => Phase::Tiling,
            WorkKind::Blur => Phase::Blurring,
            WorkKind::Preview => Phase::Preview,
            WorkKind::MipmapTexture => Phase::Mipmap,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Tiling => "tiling",
            Phase::Blurring => "blurring",
            Phase::Preview => "preview",
            Phase::Mipmap => "mipmap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub attempted: usize,
    pub succeeded: usize,
}

impl PhaseOutcome {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            attempted: 0,
            succeeded: 0,
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Per-phase counts for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    phases: Vec<PhaseOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a phase so it shows up in the report even when it stays empty.
    pub fn register(&mut self, phase: Phase) {
        if self.phase(phase).is_none() {
            self.phases.push(PhaseOutcome::new(phase));
        }
    }

    pub fn record(&mut self, phase: Phase, success: bool) {
        self.register(phase);
        if let Some(outcome) = self.phases.iter_mut().find(|o| o.phase == phase) {
            outcome.attempted += 1;
            if success {
                outcome.succeeded += 1;
            }
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|o| o.phase == phase)
    }

    pub fn phases(&self) -> &[PhaseOutcome] {
        &self.phases
    }

    pub fn attempted(&self) -> usize {
        self.phases.iter().map(|o| o.attempted).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.phases.iter().map(|o| o.succeeded).sum()
    }

    pub fn nothing_to_do(&self) -> bool {
        self.attempted() == 0
    }

    /// Terminal flag for the batch: nothing failed.
    pub fn success(&self) -> bool {
        self.phases.iter().all(|o| o.failed() == 0)
    }

    pub fn summary(&self) -> String {
        if self.nothing_to_do() {
            return "Nothing to do...".to_string();
        }

        self.phases
            .iter()
            .filter(|o| o.attempted > 0)
            .map(|o| format!("{}: {}/{} succeeded", o.phase.name(), o.succeeded, o.attempted))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
