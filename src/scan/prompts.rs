//! Fixed prompt templates for the two service calls.

/// Sentence every detailed analysis must end with.
pub const DISCLAIMER: &str = "Consult with a Doctor before making any decisions.";

/// Instruction sent alongside the image for the detailed analysis.
pub fn analysis_prompt() -> String {
    format!(
        "You are a medical practitioner and an expert in analyzing medical-related images \
working for a reputed hospital.\n\
You will be provided with images and need to identify anomalies, diseases, or health issues.\n\
Write detailed findings, next steps, and recommendations.\n\
Always add the disclaimer: '{DISCLAIMER}'"
    )
}

/// Wrap a finished analysis in the "explain it to a child" instruction.
pub fn simplify_prompt(analysis: &str) -> String {
    format!("Explain the following information to a 5-year-old child:\n{analysis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_ends_with_disclaimer() {
        let prompt = analysis_prompt();
        assert!(prompt.contains("identify anomalies"));
        assert!(prompt.contains("findings, next steps, and recommendations"));
        assert!(prompt.ends_with(&format!("'{DISCLAIMER}'")));
    }

    #[test]
    fn simplify_prompt_embeds_analysis_verbatim() {
        let prompt = simplify_prompt("Findings: none.\nLine two");
        assert!(prompt.starts_with("Explain the following information to a 5-year-old child:\n"));
        assert!(prompt.ends_with("Findings: none.\nLine two"));
    }
}
