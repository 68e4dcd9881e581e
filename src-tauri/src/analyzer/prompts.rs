//! Instruction text, reasoning policy and output contract for friction analysis.

use serde::{Deserialize, Serialize};

/// User-turn instruction appended after the uploaded files.
pub const ANALYSIS_INSTRUCTION: &str =
    "Analyze this content. Detect the friction. Provide the solution.";

/// System-level reasoning policy sent with every request.
pub const SYSTEM_DIRECTIVE: &str = r#"You are NeuroLens, an advanced Multimodal Reasoning Engine.

CORE DIRECTIVE:
Detect the implicit friction or goal behind the user's upload and provide the immediate solution.
Do NOT default to writing code unless the input is clearly technical (UI, Code, Data).
When several files are provided, treat them as one body of context.

ANALYSIS LOGIC:

1. IF INPUT IS TECHNICAL (UI Design, Screenshot of App, Code Snippet, Error Log):
   - Context: The user is building, designing, or debugging software.
   - Friction: Bugs, poor UX, ugly UI, lack of accessibility, runtime errors.
   - Output: Production-ready code that fixes the specific issue.
   - Format: MUST wrap code in Markdown code blocks (e.g. ```tsx ... ```).

2. IF INPUT IS KNOWLEDGE / MEDIA (Anime, Movie, Celebrity, Art, Landmark, Object):
   - Context: The user likely wants to know "Who/What is this?", "Where is this from?", or wants deep details.
   - Friction: Information gap / lack of context.
   - Output: A comprehensive, structured Markdown dossier identifying the subject, source, and key details.
   - Format: Standard Markdown.

3. IF INPUT IS DOCUMENT (PDF, Handwriting, Form, Table):
   - Context: The user wants digitization, summary, or structured extraction.
   - Friction: Unstructured data, hard-to-read text, information overload.
   - Output: Clean Markdown summary, JSON extraction, or transcribed text.
   - Format: Markdown or JSON code block.

JSON RESPONSE FORMAT:
{
  "detected_task": "e.g. Identify Character, Fix UI Component, Parse Invoice",
  "friction_point": "The specific pain point (e.g. 'Unknown origin of character', 'Button contrast is too low').",
  "solution": "The strategy used to resolve the friction.",
  "action_output": "The actual result (code in backticks, or formatted Markdown text).",
  "reason_map": "Brief logic chain."
}"#;

/// The five report fields with their descriptions, in contract order.
pub const REPORT_FIELDS: [(&str, &str); 5] = [
    ("detected_task", "What the user was trying to do"),
    ("friction_point", "The part causing frustration"),
    ("solution", "The full generated final solution"),
    ("action_output", "Copyable output for direct use"),
    ("reason_map", "Explain the thinking behind the friction detection"),
];

/// Prompt configuration injected into every analysis request.
///
/// Instruction and policy may be overridden from `analysis.toml`. The output
/// contract is never read from the file: [`super::AnalysisReport`] depends on
/// it, so it always starts as [`report_schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub instruction: String,
    pub policy: String,
    /// Response schema in the dialect of the Gemini API
    #[serde(skip)]
    pub output_contract: serde_json::Value,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            instruction: ANALYSIS_INSTRUCTION.to_string(),
            policy: SYSTEM_DIRECTIVE.to_string(),
            output_contract: report_schema(),
        }
    }
}

/// Structured-output schema naming exactly the five required string fields.
pub fn report_schema() -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = REPORT_FIELDS
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                serde_json::json!({
                    "type": "STRING",
                    "description": description,
                }),
            )
        })
        .collect();

    serde_json::json!({
        "type": "OBJECT",
        "properties": properties,
        "required": REPORT_FIELDS.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        "propertyOrdering": REPORT_FIELDS.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
    })
}
