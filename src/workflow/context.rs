//! Accumulated run context.
//!
//! Replaces an untyped concatenated blob with a typed, append-only record
//! of prior step outputs. Consuming capabilities project the slices they
//! need instead of re-parsing a text dump.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentKind, CapabilityOutput};

/// One prior step's output, tagged with its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Step number that produced this output
    pub step: u32,

    /// Capability that produced it
    pub kind: AgentKind,

    /// The typed output itself
    pub output: CapabilityOutput,
}

/// The evolving context of a workflow run.
///
/// Starts from the objective and grows monotonically: entries are only
/// appended, never rewritten or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    objective: String,
    entries: Vec<ContextEntry>,
}

impl RunContext {
    /// Create a fresh context seeded with the run objective.
    pub fn new(objective: impl Into<String>) -> Self {
        Self { objective: objective.into(), entries: Vec::new() }
    }

    /// The run objective.
    pub fn objective(&self) -> &str {
        &self.objective
    }

    /// Append a step's output. The only mutation this type permits.
    pub fn push(&mut self, step: u32, output: CapabilityOutput) {
        let kind = output.kind();
        self.entries.push(ContextEntry { step, kind, output });
    }

    /// Prior outputs, in execution order.
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Number of recorded outputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any outputs have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the full record: objective plus every prior output, tagged
    /// by step and capability.
    pub fn render_all(&self) -> String {
        let mut text = format!("Objective: {}", self.objective);

        for entry in &self.entries {
            text.push_str(&format!(
                "\n\n[Step {} - {}]\n{}",
                entry.step,
                entry.kind,
                entry.output.render()
            ));
        }

        text
    }

    /// The document currently on the table, for review and negotiation.
    ///
    /// Picks the most recent drafted document or negotiated proposal; if
    /// none exists yet, falls back to the full record.
    pub fn document_view(&self) -> String {
        for entry in self.entries.iter().rev() {
            match &entry.output {
                CapabilityOutput::Draft(out) => return out.document.clone(),
                CapabilityOutput::Negotiate(out) => return out.proposal.clone(),
                _ => {}
            }
        }

        self.render_all()
    }

    /// The testimony record for cross-examination: the full accumulated
    /// record serves as the witness-statement basis.
    pub fn testimony_view(&self) -> String {
        self.render_all()
    }
}
