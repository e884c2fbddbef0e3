//! System language detection from the POSIX locale environment.

/// (code, English name, native name)
const LANGUAGES: &[(&str, &str, &str)] = &[
    ("en", "English", "English"),
    ("de", "German", "Deutsch"),
    ("fr", "French", "Français"),
    ("es", "Spanish", "Español"),
    ("it", "Italian", "Italiano"),
    ("pt", "Portuguese", "Português"),
    ("nl", "Dutch", "Nederlands"),
    ("pl", "Polish", "Polski"),
    ("sv", "Swedish", "Svenska"),
    ("da", "Danish", "Dansk"),
    ("nb", "Norwegian", "Norsk"),
    ("fi", "Finnish", "Suomi"),
    ("cs", "Czech", "Čeština"),
    ("tr", "Turkish", "Türkçe"),
    ("ru", "Russian", "Русский"),
    ("uk", "Ukrainian", "Українська"),
    ("ja", "Japanese", "日本語"),
    ("zh", "Chinese", "中文"),
    ("ko", "Korean", "한국어"),
];

const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemLanguage {
    pub code: &'static str,
    /// English name, used when instructing the assistant
    pub name: &'static str,
    pub native_name: &'static str,
}

impl Default for SystemLanguage {
    fn default() -> Self {
        Self::from_code("en")
    }
}

impl SystemLanguage {
    /// Look up a two-letter code; unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        let code = code.to_ascii_lowercase();
        // Norwegian Bokmål and Nynorsk share an entry.
        let code = match code.as_str() {
            "no" | "nn" => "nb".to_string(),
            _ => code,
        };
        LANGUAGES
            .iter()
            .find(|(c, _, _)| *c == code)
            .or_else(|| LANGUAGES.first())
            .map(|&(code, name, native_name)| SystemLanguage {
                code,
                name,
                native_name,
            })
            .unwrap_or(SystemLanguage {
                code: "en",
                name: "English",
                native_name: "English",
            })
    }

    /// Parse a locale string like `de_DE.UTF-8` or `pt-BR`.
    pub fn from_locale(locale: &str) -> Option<Self> {
        let trimmed = locale.trim();
        if trimmed.is_empty() || trimmed == "C" || trimmed == "POSIX" {
            return None;
        }
        let code: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if code.len() < 2 {
            return None;
        }
        Some(Self::from_code(&code))
    }

    /// Detect from `LC_ALL`, `LC_MESSAGES`, then `LANG`.
    pub fn detect() -> Self {
        Self::detect_with(|key| std::env::var(key).ok())
    }

    pub fn detect_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        LOCALE_VARS
            .iter()
            .filter_map(|var| lookup(var))
            .find_map(|value| Self::from_locale(&value))
            .unwrap_or_default()
    }

    pub fn is_german(&self) -> bool {
        self.code == "de"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_locale_strings() {
        assert_eq!(SystemLanguage::from_locale("de_DE.UTF-8").unwrap().name, "German");
        assert_eq!(SystemLanguage::from_locale("pt-BR").unwrap().name, "Portuguese");
        assert_eq!(SystemLanguage::from_locale("C"), None);
        assert_eq!(SystemLanguage::from_locale(""), None);
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert_eq!(SystemLanguage::from_code("xx").name, "English");
    }

    #[test]
    fn test_detect_order() {
        let env: HashMap<&str, &str> = [("LC_ALL", ""), ("LC_MESSAGES", "C"), ("LANG", "fr_FR.UTF-8")]
            .into_iter()
            .collect();
        let lang = SystemLanguage::detect_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(lang.code, "fr");
        assert_eq!(lang.native_name, "Français");
    }

    #[test]
    fn test_detect_defaults_to_english() {
        let lang = SystemLanguage::detect_with(|_| None);
        assert_eq!(lang, SystemLanguage::default());
        assert_eq!(lang.name, "English");
    }
}
