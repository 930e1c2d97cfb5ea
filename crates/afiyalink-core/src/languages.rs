#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

const fn lang(name: &'static str, code: &'static str) -> Language {
    Language { name, code }
}

/// Languages offered by the translator, ISO 639-1 codes
pub const LANGUAGES: &[Language] = &[
    lang("English", "en"),
    lang("Chinese", "zh"),
    lang("Spanish", "es"),
    lang("French", "fr"),
    lang("German", "de"),
    lang("Arabic", "ar"),
    lang("Hindi", "hi"),
    lang("Bengali", "bn"),
    lang("Urdu", "ur"),
    lang("Japanese", "ja"),
    lang("Korean", "ko"),
    lang("Italian", "it"),
    lang("Portuguese", "pt"),
    lang("Russian", "ru"),
    lang("Turkish", "tr"),
    lang("Vietnamese", "vi"),
    lang("Thai", "th"),
    lang("Persian", "fa"),
    lang("Malay", "ms"),
    lang("Indonesian", "id"),
    lang("Swahili", "sw"),
    lang("Dutch", "nl"),
    lang("Greek", "el"),
    lang("Polish", "pl"),
    lang("Romanian", "ro"),
    lang("Hungarian", "hu"),
    lang("Czech", "cs"),
    lang("Slovak", "sk"),
    lang("Finnish", "fi"),
    lang("Swedish", "sv"),
    lang("Norwegian", "no"),
    lang("Danish", "da"),
    lang("Hebrew", "he"),
    lang("Punjabi", "pa"),
    lang("Marathi", "mr"),
    lang("Tamil", "ta"),
    lang("Telugu", "te"),
    lang("Kannada", "kn"),
    lang("Malayalam", "ml"),
    lang("Gujarati", "gu"),
    lang("Burmese", "my"),
    lang("Nepali", "ne"),
    lang("Sinhala", "si"),
    lang("Khmer", "km"),
    lang("Lao", "lo"),
    lang("Filipino", "tl"),
    lang("Haitian Creole", "ht"),
    lang("Uzbek", "uz"),
    lang("Kazakh", "kk"),
    lang("Amharic", "am"),
];

pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

pub fn by_name(name: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.name.eq_ignore_ascii_case(name))
}

/// Accepts either a code or a display name
pub fn resolve(code_or_name: &str) -> Option<&'static Language> {
    find(code_or_name).or_else(|| by_name(code_or_name))
}

fn position(code: &str) -> usize {
    LANGUAGES
        .iter()
        .position(|l| l.code.eq_ignore_ascii_case(code))
        .unwrap_or(0)
}

/// The language after `code`, wrapping around. Unknown codes start at the top.
pub fn next(code: &str) -> &'static Language {
    &LANGUAGES[(position(code) + 1) % LANGUAGES.len()]
}

pub fn prev(code: &str) -> &'static Language {
    let i = position(code);
    &LANGUAGES[(i + LANGUAGES.len() - 1) % LANGUAGES.len()]
}
