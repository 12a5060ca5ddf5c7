//! Prompt sent with every grouped CSV.

/// Instruction placed before the CSV text.
pub const AUGMENT_INSTRUCTION: &str = "Add an example value to each line/row of the csv.";

/// Full request text: the instruction, a blank line, then the raw CSV.
pub fn augment_prompt(instruction: &str, csv_text: &str) -> String {
    format!("{}\n\n{}", instruction, csv_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let prompt = augment_prompt(AUGMENT_INSTRUCTION, "a,b\nc,d");
        assert_eq!(
            prompt,
            "Add an example value to each line/row of the csv.\n\na,b\nc,d"
        );
    }
}
