use std::fmt;

/// German tone target. Tone adjustment is only offered for German locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneMode {
    Formal,
    Informal,
}

impl ToneMode {
    pub fn instruction(self) -> &'static str {
        match self {
            ToneMode::Formal => {
                "Convert all text to formal German using the 'Sie' form. Use formal \
                 verb forms, formal pronouns (Sie, Ihnen, Ihr), and formal capitalization."
            }
            ToneMode::Informal => {
                "Convert all text to informal German using the 'Du' form. Use informal \
                 verb forms, informal pronouns (du, dir, dein), and informal capitalization."
            }
        }
    }
}

impl fmt::Display for ToneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneMode::Formal => write!(f, "formal"),
            ToneMode::Informal => write!(f, "informal"),
        }
    }
}

pub fn is_german(locale: &str) -> bool {
    matches!(locale.to_lowercase().as_str(), "de" | "de-ch")
}

const HARD_CONSTRAINTS: &str = "HARD CONSTRAINTS:\n\
1. NEVER change placeholders: %{name}, %{count}, {{count}}, {count}, %s, %d, %1$s, etc.\n\
2. NEVER change HTML tags, Markdown syntax, URLs, or escape sequences.\n\
3. Keep the same meaning and product terminology.\n\
4. Prefer UI-friendly concise text.\n\
5. If the text is already correct, return it unchanged.";

const GERMAN_CHECKS: &str = "GERMAN-SPECIFIC CHECKS:\n\
- Check clause order and verb-final position in subordinate clauses.\n\
- Check comma rules (including \"dass\", relative clauses, infinitive clauses).\n\
- Check agreement (case, number, gender).\n\
- Ensure consistent \"Sie\" forms and capitalization.\n\
- Avoid overly long nested sentences; split only when clearly better.";

pub fn grammar_system_prompt(locale: &str) -> String {
    let mut prompt = format!(
        "You are a grammar checker for {locale} translations. Check and correct grammar \
         errors while preserving ALL placeholders, HTML tags, Markdown syntax, URLs, and \
         escape sequences exactly as they appear.\n\n{HARD_CONSTRAINTS}"
    );
    if is_german(locale) {
        prompt.push_str("\n\n");
        prompt.push_str(GERMAN_CHECKS);
    }
    prompt.push_str(
        "\n\nFor each entry, return ONLY the corrected text (or the original if no \
         changes are needed). No explanations, no commentary.",
    );
    prompt
}

pub fn tone_system_prompt(locale: &str, mode: ToneMode) -> String {
    format!(
        "You are a tone adjuster for {locale} translations. Adjust the tone of the text \
         while preserving ALL placeholders, HTML tags, Markdown syntax, URLs, and escape \
         sequences exactly as they appear.\n\n{HARD_CONSTRAINTS}\n\nTONE ADJUSTMENT:\n{}\n\n\
         For each entry, return ONLY the adjusted text (or the original if it already has \
         the desired tone). No explanations, no commentary.",
        mode.instruction()
    )
}

/// Numbered entry list; answers are expected back one per line, same order.
pub fn numbered_user_prompt(intro: &str, values: &[String]) -> String {
    let mut prompt = format!("{intro}\n\n");
    for (i, value) in values.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, value));
    }
    prompt
}

pub fn grammar_user_prompt(values: &[String]) -> String {
    numbered_user_prompt(
        "Check and correct the following translation entries. \
         Return each corrected entry on a new line, in the same order:",
        values,
    )
}

pub fn tone_user_prompt(locale: &str, mode: ToneMode, values: &[String]) -> String {
    numbered_user_prompt(
        &format!(
            "Adjust the tone of the following {locale} translation entries to {mode}. \
             Return each adjusted entry on a new line, in the same order:"
        ),
        values,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn german_prompt_gets_extra_checks() {
        assert!(grammar_system_prompt("de").contains("GERMAN-SPECIFIC"));
        assert!(grammar_system_prompt("de-CH").contains("GERMAN-SPECIFIC"));
        assert!(!grammar_system_prompt("fr").contains("GERMAN-SPECIFIC"));
    }

    #[test]
    fn user_prompt_numbers_entries() {
        let prompt = grammar_user_prompt(&["Eins".to_string(), "Zwei".to_string()]);
        assert!(prompt.contains("1. Eins\n"));
        assert!(prompt.contains("2. Zwei\n"));
    }

    #[test]
    fn tone_is_german_only_helper() {
        assert!(is_german("de"));
        assert!(is_german("DE-CH"));
        assert!(!is_german("en"));
    }
}
