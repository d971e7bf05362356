use flowsketch_core::schema::{ARTIFACT_NAME, RULES, SCHEMA};

/// Build the single instruction payload sent to the generator. The user's
/// description is embedded verbatim at the end.
pub fn flowchart_prompt(description: &str) -> String {
    format!(
        "You are a flowchart architect. Turn the process description below into a flowchart.\n\n\
Create exactly ONE file named \"{ARTIFACT_NAME}\".\n\
The file content MUST be valid JSON and nothing else.\n\
Do NOT include markdown.\n\
Do NOT include explanations.\n\
Do NOT include backticks.\n\n\
The JSON schema MUST be exactly:\n\n\
{SCHEMA}\n\n\
## Rules\n{RULES}\n\n\
Description:\n\
{description}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_schema_and_artifact_name() {
        let prompt = flowchart_prompt("User login flow");
        assert!(prompt.contains(SCHEMA));
        assert!(prompt.contains("\"flowchart.json\""));
        assert!(prompt.contains("Do NOT include backticks."));
    }

    #[test]
    fn prompt_keeps_description_verbatim() {
        let description = "  Checkout:\n  cart -> pay -> \"ship\"  ";
        let prompt = flowchart_prompt(description);
        assert!(prompt.ends_with(&format!("Description:\n{description}\n")));
    }
}
