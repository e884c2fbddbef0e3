//! Prompt text for the mail assistant.
//!
//! System instructions are localized (English and German today); task prompts
//! for translate/summarize/compose are built around the user's text.

use crate::locale::SystemLanguage;

const PERSONA_EN: &str = "You are the mail assistant built into the user's email client. \
You help read, understand, translate, summarize and write emails.";

const PERSONA_DE: &str = "Du bist der Mail-Assistent im E-Mail-Programm des Nutzers. \
Du hilfst beim Lesen, Verstehen, Übersetzen, Zusammenfassen und Schreiben von E-Mails.";

const FORMATTING_EN: &str = r#"## Formatting
- Use Markdown: short paragraphs, bullet lists where they help, **bold** for key facts
- Never wrap the whole answer in a code block
- When drafting an email, output only the email text, without commentary"#;

const FORMATTING_DE: &str = r#"## Formatierung
- Verwende Markdown: kurze Absätze, Aufzählungen wo sinnvoll, **fett** für wichtige Fakten
- Setze nie die ganze Antwort in einen Codeblock
- Wenn du eine E-Mail entwirfst, gib nur den E-Mail-Text ohne Kommentar aus"#;

const STYLE_EN: &str = r#"## Response Style
- Be concise and direct; lead with the answer
- Do not invent facts that are not in the email or the conversation
- If the question is ambiguous, say what you assumed"#;

const STYLE_DE: &str = r#"## Antwortstil
- Sei knapp und direkt; beginne mit der Antwort
- Erfinde keine Fakten, die nicht in der E-Mail oder im Gespräch stehen
- Ist die Frage mehrdeutig, nenne deine Annahme"#;

/// Full system instructions for a chat turn.
pub fn system_instructions(language: &SystemLanguage, active_account: Option<&str>) -> String {
    let mut out = String::new();

    if language.is_german() {
        out.push_str(PERSONA_DE);
        out.push_str("\n\n## Sprache\n");
        out.push_str(&format!(
            "- Antworte standardmäßig auf {} ({}), außer der Nutzer schreibt in einer anderen Sprache oder wünscht eine andere\n",
            language.native_name, language.name
        ));
        if let Some(account) = active_account {
            out.push_str(&format!("- Das aktive Konto des Nutzers ist {}\n", account));
        }
        out.push('\n');
        out.push_str(FORMATTING_DE);
        out.push_str("\n\n");
        out.push_str(STYLE_DE);
    } else {
        out.push_str(PERSONA_EN);
        out.push_str("\n\n## Language\n");
        out.push_str(&format!(
            "- Reply in {} by default, unless the user writes in or asks for another language\n",
            language.name
        ));
        if let Some(account) = active_account {
            out.push_str(&format!("- The user's active account is {}\n", account));
        }
        out.push('\n');
        out.push_str(FORMATTING_EN);
        out.push_str("\n\n");
        out.push_str(STYLE_EN);
    }

    out
}

pub fn translate_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text into {target}. Keep the meaning, tone and formatting. \
Output only the translation, without notes or explanations.\n\n---\n{text}",
        target = target_language,
        text = text
    )
}

pub fn summarize_prompt(text: &str, language: &SystemLanguage) -> String {
    format!(
        "Summarize the following email in {lang}. Start with one sentence stating what it is about, \
then list the key points, decisions, deadlines and anything the reader must do.\n\n---\n{text}",
        lang = language.name,
        text = text
    )
}

pub fn compose_prompt(instruction: &str, context: Option<&str>, language: &SystemLanguage) -> String {
    let mut prompt = format!(
        "Help me write an email. Unless the instruction says otherwise, write it in {}.\n\
Output only the email text.\n\n## Instruction\n{}",
        language.name, instruction
    );
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\n## Context (email being answered or current draft)\n");
        prompt.push_str(context);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_instructions_include_language_and_account() {
        let text = system_instructions(&SystemLanguage::from_code("en"), Some("anna@example.com"));
        assert!(text.contains("Reply in English by default"));
        assert!(text.contains("anna@example.com"));
        assert!(text.contains("## Formatting"));
    }

    #[test]
    fn test_german_instructions_are_localized() {
        let text = system_instructions(&SystemLanguage::from_code("de"), None);
        assert!(text.contains("Mail-Assistent"));
        assert!(text.contains("Deutsch"));
        assert!(!text.contains("aktive Konto"));
    }

    #[test]
    fn test_compose_skips_blank_context() {
        let lang = SystemLanguage::default();
        let with = compose_prompt("Decline politely", Some("Can you join Friday?"), &lang);
        let without = compose_prompt("Decline politely", Some("  "), &lang);
        assert!(with.contains("Can you join Friday?"));
        assert!(!without.contains("## Context"));
    }

    #[test]
    fn test_translate_names_target() {
        let prompt = translate_prompt("Hallo Welt", "French");
        assert!(prompt.contains("into French"));
        assert!(prompt.ends_with("Hallo Welt"));
    }
}
