//! Agent capabilities and the invocation adapter.
//!
//! The six capabilities form a closed set. Each carries its own typed input
//! and output schema; dispatch is over the `AgentKind` tagged union, so an
//! unknown kind cannot reach the invocation layer. Input construction is
//! deterministic: the same kind, instruction, context, and defaults always
//! produce the same request.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ModelError, ModelProvider, PromptTemplate};
use crate::core::RunDefaults;
use crate::workflow::RunContext;

/// One of the six agent capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    /// Legal research
    Research,
    /// Document drafting
    Draft,
    /// Document review
    Review,
    /// Case-outcome prediction
    Predict,
    /// Clause negotiation
    Negotiate,
    /// Witness cross-examination
    CrossExamine,
}

impl AgentKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 6] = [
        Self::Research,
        Self::Draft,
        Self::Review,
        Self::Predict,
        Self::Negotiate,
        Self::CrossExamine,
    ];

    /// Kebab-case name, matching the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Predict => "predict",
            Self::Negotiate => "negotiate",
            Self::CrossExamine => "cross-examine",
        }
    }

    /// The prompt template this capability is invoked with.
    pub fn template(&self) -> PromptTemplate {
        match self {
            Self::Research => PromptTemplate::Research,
            Self::Draft => PromptTemplate::Draft,
            Self::Review => PromptTemplate::Review,
            Self::Predict => PromptTemplate::Predict,
            Self::Negotiate => PromptTemplate::Negotiate,
            Self::CrossExamine => PromptTemplate::CrossExamine,
        }
    }

    /// Build the capability-specific input for a step.
    ///
    /// Mapping rules are fixed:
    /// - research: the instruction is the query
    /// - draft: the instruction is the drafting prompt; ancillary fields
    ///   come from the defaults policy, never from context
    /// - review: the accumulated context is the document under review
    /// - predict: the instruction is the case summary; case fields come
    ///   from defaults
    /// - negotiate: the accumulated context is the current clause, the
    ///   instruction is the goal
    /// - cross-examine: the accumulated context is the witness statement,
    ///   the instruction is the evidence summary
    pub fn build_input(
        &self,
        instruction: &str,
        context: &RunContext,
        defaults: &RunDefaults,
    ) -> CapabilityInput {
        match self {
            Self::Research => {
                CapabilityInput::Research(ResearchInput { query: instruction.to_string() })
            }
            Self::Draft => CapabilityInput::Draft(DraftInput {
                prompt: instruction.to_string(),
                document_type: defaults.draft.document_type.clone(),
                tone: defaults.draft.tone.clone(),
                jurisdiction: defaults.draft.jurisdiction.clone(),
            }),
            Self::Review => {
                CapabilityInput::Review(ReviewInput { document: context.document_view() })
            }
            Self::Predict => CapabilityInput::Predict(PredictInput {
                case_summary: instruction.to_string(),
                case_type: defaults.predict.case_type.clone(),
                jurisdiction: defaults.predict.jurisdiction.clone(),
                judge: defaults.predict.judge.clone(),
            }),
            Self::Negotiate => CapabilityInput::Negotiate(NegotiateInput {
                current_clause: context.document_view(),
                goal: instruction.to_string(),
                opponent_role: defaults.negotiate.opponent_role.clone(),
                opponent_style: defaults.negotiate.opponent_style.clone(),
            }),
            Self::CrossExamine => CapabilityInput::CrossExamine(CrossExamineInput {
                witness_statement: context.testimony_view(),
                evidence_summary: instruction.to_string(),
                examiner_role: defaults.cross_examine.examiner_role.clone(),
            }),
        }
    }

    /// Validate and type a raw model response for this capability.
    pub fn parse_output(&self, value: serde_json::Value) -> Result<CapabilityOutput, ModelError> {
        let result = match self {
            Self::Research => serde_json::from_value(value).map(CapabilityOutput::Research),
            Self::Draft => serde_json::from_value(value).map(CapabilityOutput::Draft),
            Self::Review => serde_json::from_value(value).map(CapabilityOutput::Review),
            Self::Predict => serde_json::from_value(value).map(CapabilityOutput::Predict),
            Self::Negotiate => serde_json::from_value(value).map(CapabilityOutput::Negotiate),
            Self::CrossExamine => serde_json::from_value(value).map(CapabilityOutput::CrossExamine),
        };

        result.map_err(|e| {
            ModelError::SchemaValidation(format!("{} output invalid: {e}", self.as_str()))
        })
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "research" => Ok(Self::Research),
            "draft" => Ok(Self::Draft),
            "review" => Ok(Self::Review),
            "predict" => Ok(Self::Predict),
            "negotiate" => Ok(Self::Negotiate),
            "cross-examine" => Ok(Self::CrossExamine),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to a research invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchInput {
    /// Research query
    pub query: String,
}

/// Input to a drafting invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftInput {
    /// What to draft
    pub prompt: String,
    /// Kind of document
    pub document_type: String,
    /// Drafting tone
    pub tone: String,
    /// Governing jurisdiction
    pub jurisdiction: String,
}

/// Input to a review invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    /// Document text under review
    pub document: String,
}

/// Input to an outcome-prediction invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictInput {
    /// Summary of the case
    pub case_summary: String,
    /// Case category
    pub case_type: String,
    /// Jurisdiction the case is heard in
    pub jurisdiction: String,
    /// Presiding judge, if known
    pub judge: String,
}

/// Input to a negotiation invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiateInput {
    /// Clause currently on the table
    pub current_clause: String,
    /// What we want out of the negotiation
    pub goal: String,
    /// Who sits across the table
    pub opponent_role: String,
    /// Their negotiating style, if known
    pub opponent_style: String,
}

/// Input to a cross-examination invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossExamineInput {
    /// The witness statement to attack
    pub witness_statement: String,
    /// Summary of the evidence available
    pub evidence_summary: String,
    /// Role the examining attorney plays
    pub examiner_role: String,
}

/// Typed input union, tagged by capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "capability", rename_all = "kebab-case")]
pub enum CapabilityInput {
    Research(ResearchInput),
    Draft(DraftInput),
    Review(ReviewInput),
    Predict(PredictInput),
    Negotiate(NegotiateInput),
    CrossExamine(CrossExamineInput),
}

impl CapabilityInput {
    /// The capability this input belongs to.
    pub fn kind(&self) -> AgentKind {
        match self {
            Self::Research(_) => AgentKind::Research,
            Self::Draft(_) => AgentKind::Draft,
            Self::Review(_) => AgentKind::Review,
            Self::Predict(_) => AgentKind::Predict,
            Self::Negotiate(_) => AgentKind::Negotiate,
            Self::CrossExamine(_) => AgentKind::CrossExamine,
        }
    }

    /// Serialize the inner payload (without the tag) for the provider call.
    pub fn to_value(&self) -> serde_json::Value {
        let result = match self {
            Self::Research(input) => serde_json::to_value(input),
            Self::Draft(input) => serde_json::to_value(input),
            Self::Review(input) => serde_json::to_value(input),
            Self::Predict(input) => serde_json::to_value(input),
            Self::Negotiate(input) => serde_json::to_value(input),
            Self::CrossExamine(input) => serde_json::to_value(input),
        };
        // Serialization of plain string fields cannot fail
        result.unwrap_or(serde_json::Value::Null)
    }
}

/// Output of a research invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchOutput {
    /// What the research found
    pub findings: String,
    /// Authorities relied on
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Output of a drafting invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOutput {
    /// Full document text
    pub document: String,
    /// Drafting notes or caveats
    #[serde(default)]
    pub notes: String,
}

/// Output of a review invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// Overall assessment
    pub assessment: String,
    /// Specific issues found
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Output of an outcome-prediction invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictOutput {
    /// Likely outcome
    pub prediction: String,
    /// Confidence level (low/medium/high)
    #[serde(default)]
    pub confidence: String,
    /// Reasoning behind the prediction
    #[serde(default)]
    pub rationale: String,
}

/// Output of a negotiation invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiateOutput {
    /// Proposed clause language
    pub proposal: String,
    /// Negotiation rationale
    #[serde(default)]
    pub rationale: String,
}

/// Output of a cross-examination invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossExamineOutput {
    /// Prepared questions
    pub questions: Vec<String>,
    /// Line of attack
    #[serde(default)]
    pub strategy: String,
}

/// Typed output union, tagged by capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CapabilityOutput {
    Research(ResearchOutput),
    Draft(DraftOutput),
    Review(ReviewOutput),
    Predict(PredictOutput),
    Negotiate(NegotiateOutput),
    CrossExamine(CrossExamineOutput),
}

impl CapabilityOutput {
    /// The capability that produced this output.
    pub fn kind(&self) -> AgentKind {
        match self {
            Self::Research(_) => AgentKind::Research,
            Self::Draft(_) => AgentKind::Draft,
            Self::Review(_) => AgentKind::Review,
            Self::Predict(_) => AgentKind::Predict,
            Self::Negotiate(_) => AgentKind::Negotiate,
            Self::CrossExamine(_) => AgentKind::CrossExamine,
        }
    }

    /// Render as plain text for context threading and display.
    pub fn render(&self) -> String {
        match self {
            Self::Research(out) => {
                if out.sources.is_empty() {
                    out.findings.clone()
                } else {
                    format!("{}\nSources: {}", out.findings, out.sources.join("; "))
                }
            }
            Self::Draft(out) => out.document.clone(),
            Self::Review(out) => {
                if out.issues.is_empty() {
                    out.assessment.clone()
                } else {
                    format!("{}\nIssues:\n- {}", out.assessment, out.issues.join("\n- "))
                }
            }
            Self::Predict(out) => {
                let mut text = out.prediction.clone();
                if !out.confidence.is_empty() {
                    text.push_str(&format!(" (confidence: {})", out.confidence));
                }
                if !out.rationale.is_empty() {
                    text.push_str(&format!("\n{}", out.rationale));
                }
                text
            }
            Self::Negotiate(out) => out.proposal.clone(),
            Self::CrossExamine(out) => {
                if out.strategy.is_empty() {
                    out.questions.join("\n")
                } else {
                    format!("{}\n{}", out.strategy, out.questions.join("\n"))
                }
            }
        }
    }
}

/// Invoke one capability for one step.
///
/// Issues exactly one provider call; any service failure surfaces as a
/// `ModelError` without retries.
pub async fn invoke(
    provider: &dyn ModelProvider,
    kind: AgentKind,
    instruction: &str,
    context: &RunContext,
    defaults: &RunDefaults,
) -> Result<CapabilityOutput, ModelError> {
    let input = kind.build_input(instruction, context, defaults);

    tracing::debug!(kind = %kind, template = %kind.template(), "Invoking capability");

    let value = provider.generate_structured(kind.template(), &input.to_value()).await?;
    kind.parse_output(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_draft() -> RunContext {
        let mut ctx = RunContext::new("Negotiate the indemnity clause");
        ctx.push(
            1,
            CapabilityOutput::Draft(DraftOutput {
                document: "INDEMNITY. Vendor shall hold Customer harmless.".to_string(),
                notes: String::new(),
            }),
        );
        ctx
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.as_str().parse::<AgentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert_eq!("summarize".parse::<AgentKind>(), Err("summarize".to_string()));
    }

    #[test]
    fn test_kind_serde_matches_as_str() {
        for kind in AgentKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_research_input_forwards_instruction() {
        let ctx = RunContext::new("objective");
        let input =
            AgentKind::Research.build_input("find precedents", &ctx, &RunDefaults::default());

        match input {
            CapabilityInput::Research(r) => assert_eq!(r.query, "find precedents"),
            other => panic!("wrong input kind: {other:?}"),
        }
    }

    #[test]
    fn test_draft_input_uses_defaults_not_context() {
        let ctx = context_with_draft();
        let mut defaults = RunDefaults::default();
        defaults.draft.jurisdiction = "Delaware".to_string();

        let input = AgentKind::Draft.build_input("draft an NDA", &ctx, &defaults);

        match input {
            CapabilityInput::Draft(d) => {
                assert_eq!(d.prompt, "draft an NDA");
                assert_eq!(d.document_type, "contract");
                assert_eq!(d.tone, "neutral");
                assert_eq!(d.jurisdiction, "Delaware");
                // Context never leaks into drafting inputs
                assert!(!d.prompt.contains("INDEMNITY"));
            }
            other => panic!("wrong input kind: {other:?}"),
        }
    }

    #[test]
    fn test_review_input_consumes_context_document() {
        let ctx = context_with_draft();
        let input =
            AgentKind::Review.build_input("review the draft", &ctx, &RunDefaults::default());

        match input {
            CapabilityInput::Review(r) => {
                assert!(r.document.contains("INDEMNITY"));
                // The instruction is not the document
                assert!(!r.document.contains("review the draft"));
            }
            other => panic!("wrong input kind: {other:?}"),
        }
    }

    #[test]
    fn test_negotiate_input_splits_clause_and_goal() {
        let ctx = context_with_draft();
        let input =
            AgentKind::Negotiate.build_input("cap liability at fees paid", &ctx, &RunDefaults::default());

        match input {
            CapabilityInput::Negotiate(n) => {
                assert!(n.current_clause.contains("INDEMNITY"));
                assert_eq!(n.goal, "cap liability at fees paid");
                assert_eq!(n.opponent_role, "opposing counsel");
            }
            other => panic!("wrong input kind: {other:?}"),
        }
    }

    #[test]
    fn test_cross_examine_input_uses_full_record() {
        let ctx = context_with_draft();
        let input =
            AgentKind::CrossExamine.build_input("timeline contradictions", &ctx, &RunDefaults::default());

        match input {
            CapabilityInput::CrossExamine(x) => {
                assert!(x.witness_statement.contains("Negotiate the indemnity clause"));
                assert_eq!(x.evidence_summary, "timeline contradictions");
                assert_eq!(x.examiner_role, "defense counsel");
            }
            other => panic!("wrong input kind: {other:?}"),
        }
    }

    #[test]
    fn test_input_mapping_is_deterministic() {
        let ctx = context_with_draft();
        let defaults = RunDefaults::default();

        for kind in AgentKind::ALL {
            let a = kind.build_input("same instruction", &ctx, &defaults).to_value();
            let b = kind.build_input("same instruction", &ctx, &defaults).to_value();
            assert_eq!(
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap(),
                "{kind} mapping must be deterministic"
            );
        }
    }

    #[test]
    fn test_parse_output_valid() {
        let value = serde_json::json!({
            "findings": "no controlling precedent",
            "sources": ["Smith v. Jones"]
        });

        let output = AgentKind::Research.parse_output(value).unwrap();
        match output {
            CapabilityOutput::Research(r) => {
                assert_eq!(r.findings, "no controlling precedent");
                assert_eq!(r.sources.len(), 1);
            }
            other => panic!("wrong output kind: {other:?}"),
        }
    }

    #[test]
    fn test_parse_output_missing_required_field() {
        let value = serde_json::json!({ "sources": [] });
        let err = AgentKind::Research.parse_output(value).unwrap_err();
        assert!(matches!(err, ModelError::SchemaValidation(_)));
    }

    #[test]
    fn test_parse_output_optional_fields_default() {
        let value = serde_json::json!({ "prediction": "likely dismissal" });
        let output = AgentKind::Predict.parse_output(value).unwrap();

        match output {
            CapabilityOutput::Predict(p) => {
                assert_eq!(p.prediction, "likely dismissal");
                assert!(p.confidence.is_empty());
            }
            other => panic!("wrong output kind: {other:?}"),
        }
    }

    #[test]
    fn test_render_review_lists_issues() {
        let output = CapabilityOutput::Review(ReviewOutput {
            assessment: "Risky".to_string(),
            issues: vec!["uncapped liability".to_string(), "no cure period".to_string()],
        });

        let text = output.render();
        assert!(text.contains("Risky"));
        assert!(text.contains("- uncapped liability"));
        assert!(text.contains("- no cure period"));
    }
}
