use crate::{
    domain::UserId,
    ports::LanguageCodes,
    store::{Storage, NS_LANGUAGE},
    Result,
};

/// English language names and their ISO 639-1 codes.
const ISO_639_1: &[(&str, &str)] = &[
    ("Afrikaans", "af"),
    ("Albanian", "sq"),
    ("Amharic", "am"),
    ("Arabic", "ar"),
    ("Armenian", "hy"),
    ("Azerbaijani", "az"),
    ("Basque", "eu"),
    ("Belarusian", "be"),
    ("Bengali", "bn"),
    ("Bosnian", "bs"),
    ("Bulgarian", "bg"),
    ("Burmese", "my"),
    ("Catalan", "ca"),
    ("Chinese", "zh"),
    ("Croatian", "hr"),
    ("Czech", "cs"),
    ("Danish", "da"),
    ("Dutch", "nl"),
    ("English", "en"),
    ("Esperanto", "eo"),
    ("Estonian", "et"),
    ("Filipino", "tl"),
    ("Finnish", "fi"),
    ("French", "fr"),
    ("Galician", "gl"),
    ("Georgian", "ka"),
    ("German", "de"),
    ("Greek", "el"),
    ("Gujarati", "gu"),
    ("Haitian", "ht"),
    ("Hausa", "ha"),
    ("Hebrew", "he"),
    ("Hindi", "hi"),
    ("Hungarian", "hu"),
    ("Icelandic", "is"),
    ("Igbo", "ig"),
    ("Indonesian", "id"),
    ("Irish", "ga"),
    ("Italian", "it"),
    ("Japanese", "ja"),
    ("Javanese", "jv"),
    ("Kannada", "kn"),
    ("Kazakh", "kk"),
    ("Khmer", "km"),
    ("Korean", "ko"),
    ("Kurdish", "ku"),
    ("Lao", "lo"),
    ("Latin", "la"),
    ("Latvian", "lv"),
    ("Lithuanian", "lt"),
    ("Luxembourgish", "lb"),
    ("Macedonian", "mk"),
    ("Malagasy", "mg"),
    ("Malay", "ms"),
    ("Malayalam", "ml"),
    ("Maltese", "mt"),
    ("Maori", "mi"),
    ("Marathi", "mr"),
    ("Mongolian", "mn"),
    ("Nepali", "ne"),
    ("Norwegian", "no"),
    ("Pashto", "ps"),
    ("Persian", "fa"),
    ("Polish", "pl"),
    ("Portuguese", "pt"),
    ("Punjabi", "pa"),
    ("Romanian", "ro"),
    ("Russian", "ru"),
    ("Samoan", "sm"),
    ("Serbian", "sr"),
    ("Shona", "sn"),
    ("Sindhi", "sd"),
    ("Sinhala", "si"),
    ("Slovak", "sk"),
    ("Slovenian", "sl"),
    ("Somali", "so"),
    ("Spanish", "es"),
    ("Sundanese", "su"),
    ("Swahili", "sw"),
    ("Swedish", "sv"),
    ("Tajik", "tg"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("Thai", "th"),
    ("Turkish", "tr"),
    ("Ukrainian", "uk"),
    ("Urdu", "ur"),
    ("Uzbek", "uz"),
    ("Vietnamese", "vi"),
    ("Welsh", "cy"),
    ("Xhosa", "xh"),
    ("Yiddish", "yi"),
    ("Yoruba", "yo"),
    ("Zulu", "zu"),
];

/// Built-in ISO 639-1 name table. Names match exactly (case-sensitive, title case).
#[derive(Clone, Copy, Debug, Default)]
pub struct IsoLanguages;

impl LanguageCodes for IsoLanguages {
    fn code_for(&self, name: &str) -> Option<String> {
        ISO_639_1
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| code.to_string())
    }
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn user input into a language code.
///
/// Inputs of up to 3 characters are taken as codes already. Longer inputs are
/// treated as language names; names the table does not know pass through
/// capitalized (there is no better fallback).
pub fn normalize_language(raw: &str, codes: &dyn LanguageCodes) -> String {
    if raw.chars().count() <= 3 {
        return raw.to_string();
    }
    let name = capitalize_first(raw);
    codes.code_for(&name).unwrap_or(name)
}

/// Per-user language preferences under `language/<userId>`.
#[derive(Clone)]
pub struct LanguagePreferences {
    storage: Storage,
}

impl LanguagePreferences {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn get(&self, user: &UserId) -> Result<Option<String>> {
        let lang: Option<String> = self.storage.get(NS_LANGUAGE, user.as_str()).await?;
        Ok(lang.filter(|l| !l.is_empty()))
    }

    pub async fn set(&self, user: &UserId, language: &str) -> Result<()> {
        self.storage.set(NS_LANGUAGE, user.as_str(), language).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn names_map_to_codes() {
        assert_eq!(normalize_language("spanish", &IsoLanguages), "es");
        assert_eq!(normalize_language("Japanese", &IsoLanguages), "ja");
    }

    #[test]
    fn short_inputs_are_codes() {
        assert_eq!(normalize_language("fr", &IsoLanguages), "fr");
        assert_eq!(normalize_language("zho", &IsoLanguages), "zho");
    }

    #[test]
    fn unknown_names_pass_through_capitalized() {
        assert_eq!(normalize_language("klingon", &IsoLanguages), "Klingon");
    }

    #[tokio::test]
    async fn preferences_round_trip_per_user() {
        let prefs = LanguagePreferences::new(Storage::new(Arc::new(MemoryStore::new())));
        let u = UserId::from("u1");
        assert_eq!(prefs.get(&u).await.unwrap(), None);
        prefs.set(&u, "de").await.unwrap();
        assert_eq!(prefs.get(&u).await.unwrap().as_deref(), Some("de"));
        assert_eq!(prefs.get(&UserId::from("u2")).await.unwrap(), None);
    }
}
