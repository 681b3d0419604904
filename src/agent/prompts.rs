//! Prompt templates for structured model requests.
//!
//! Each template pairs a stable identifier with the system prompt that
//! constrains the model to the capability's output schema.

use serde::{Deserialize, Serialize};

/// Identifies one structured-output request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptTemplate {
    /// Objective -> ordered step plan
    PlanGeneration,
    /// Legal research query
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

impl PromptTemplate {
    /// Stable identifier, used in logs and request metadata.
    pub fn id(&self) -> &'static str {
        match self {
            Self::PlanGeneration => "plan-generation",
            Self::Research => "research",
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Predict => "predict",
            Self::Negotiate => "negotiate",
            Self::CrossExamine => "cross-examine",
        }
    }

    /// System prompt constraining the model to this template's output schema.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::PlanGeneration => {
                r#"You are the planning engine of a legal workflow assistant.
Given a user objective, produce an ordered plan of steps. Each step delegates
to exactly one agent kind from this closed set:
research, draft, review, predict, negotiate, cross-examine.

Respond with ONLY a JSON array, no prose, where each element is:
{"kind": "<agent kind>", "instruction": "<self-contained instruction for that agent>", "summary": "<short description of the step's intent>"}

Rules:
1. Use at least one step; use only the listed agent kinds
2. Order steps so later steps can build on earlier results
3. Each instruction must be self-contained and actionable on its own
4. Do not include any markdown formatting"#
            }
            Self::Research => {
                r#"You are a legal research assistant.
Research the query and report what the law and case history say.

Respond with ONLY a JSON object, no prose:
{"findings": "<your findings>", "sources": ["<authority or citation>", ...]}

Rules:
1. Be factual and cite the authorities you rely on
2. If the law is unsettled, say so in the findings
3. Do not include any markdown formatting"#
            }
            Self::Draft => {
                r#"You are a legal drafting assistant.
Draft the requested document per the given type, tone, and jurisdiction.

Respond with ONLY a JSON object, no prose:
{"document": "<full document text>", "notes": "<drafting notes or caveats>"}

Rules:
1. Match the requested document type, tone, and jurisdiction exactly
2. Use standard legal structure for the document type
3. Do not include any markdown formatting"#
            }
            Self::Review => {
                r#"You are a legal document reviewer.
Analyze the document for risks, gaps, and unfavorable terms.

Respond with ONLY a JSON object, no prose:
{"assessment": "<overall assessment>", "issues": ["<specific issue>", ...]}

Rules:
1. Flag every material risk, not just the worst one
2. Keep each issue specific enough to act on
3. Do not include any markdown formatting"#
            }
            Self::Predict => {
                r#"You are a litigation outcome analyst.
Assess the likely outcome of the case described.

Respond with ONLY a JSON object, no prose:
{"prediction": "<likely outcome>", "confidence": "<low|medium|high>", "rationale": "<why>"}

Rules:
1. Ground the prediction in the facts given; note missing facts
2. Calibrate confidence honestly
3. Do not include any markdown formatting"#
            }
            Self::Negotiate => {
                r#"You are a contract negotiation strategist.
Given the current clause and my goal, propose revised language and strategy.

Respond with ONLY a JSON object, no prose:
{"proposal": "<proposed clause language>", "rationale": "<negotiation rationale>"}

Rules:
1. The proposal must be drop-in replacement language for the clause
2. Explain the concession/gain trade-off in the rationale
3. Do not include any markdown formatting"#
            }
            Self::CrossExamine => {
                r#"You are a trial advocacy assistant preparing cross-examination.
Given a witness statement and an evidence summary, prepare questions.

Respond with ONLY a JSON object, no prose:
{"questions": ["<leading question>", ...], "strategy": "<line of attack>"}

Rules:
1. Questions must be leading and answerable yes/no where possible
2. Target contradictions between the statement and the evidence
3. Do not include any markdown formatting"#
            }
        }
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
