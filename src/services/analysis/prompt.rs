//! Advisory Prompt
//!
//! The prompt asks for a fixed pseudo-structured reply: three section
//! headers followed by a literal `END` token, which doubles as the stop
//! sequence.

use code_insight_core::CodeSubmission;
use code_insight_llm::LlmRequestOptions;

/// Literal that terminates the reply
pub const END_MARKER: &str = "END";

/// Build the analysis prompt for one submission
pub fn build_analysis_prompt(submission: &CodeSubmission) -> String {
    format!(
        r#"You are a code analysis tool. Analyze the following {language} code from the file "{filename}" and provide feedback in the exact format specified below.

CODE:
{code}

FORMAT YOUR RESPONSE EXACTLY LIKE THIS:

ERRORS:
- List each error with type, message, severity (error/warning/info), and line number
- One error per line in this format: TYPE: message [SEVERITY] (line NUMBER)
Example: SYNTAX: Missing semicolon [ERROR] (line 5)

SUGGESTIONS:
- List each suggestion with type, message, and line number
- One suggestion per line in this format: TYPE: message (line NUMBER)
Example: STYLE: Use const instead of let (line 3)

METRICS:
COMPLEXITY: 5
MEMORY: 1024
TIME: 100

{end}
"#,
        language = submission.language(),
        filename = submission.filename(),
        code = submission.code(),
        end = END_MARKER,
    )
}

/// Generation controls for advisory requests: the configured token budget
/// and temperature, stopping at the end marker.
pub fn advisory_request_options() -> LlmRequestOptions {
    LlmRequestOptions {
        stop_sequences: vec![END_MARKER.to_string()],
        ..Default::default()
    }
}
