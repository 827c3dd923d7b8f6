//! System prompt assembly

/// Base grading instructions shared by every mode
const BASE_PROMPT: &str = "You are a literary analyst grading a piece of \
writing. Respond with a single JSON object and nothing else. The object \
must contain: \"overallScore\" (number, 0-100), \"title\" (a short label \
for the piece), \"summary\" (2-3 sentences), \"tags\" (array of strings), \
and \"dimensions\" (array of objects with \"name\", \"score\" 0-100, and \
\"comment\"). Judge structure, voice, pacing, imagery, and originality. \
Do not wrap the JSON in markdown fences.";

/// Extra instructions per analysis mode
fn mode_instructions(mode: &str) -> &'static str {
    match mode {
        "quick" => "Keep it brief: at most three dimensions and one-line comments.",
        "professional" => {
            "Grade as a demanding professional editor: cite concrete passages in \
             comments and be sparing with scores above 85."
        }
        _ => "Cover at least five dimensions with specific, constructive comments.",
    }
}

/// Build the system prompt for an analysis mode
pub fn build_system_prompt(mode: &str) -> String {
    format!("{BASE_PROMPT}\n\n{}", mode_instructions(mode))
}

/// Wrap search output as a reference message for the conversation
pub fn search_context_message(summary: &str) -> String {
    format!("Background material gathered by a web search, for reference only:\n\n{summary}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_modes_get_the_default_instructions() {
        assert_eq!(
            build_system_prompt("whatever"),
            build_system_prompt("full")
        );
        assert_ne!(build_system_prompt("quick"), build_system_prompt("full"));
    }
}
