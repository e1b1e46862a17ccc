//! Name cleaning for census text fields.
//!
//! The source files were produced on a DOS code page and are read as
//! ISO-8859-1, which turns accented letters into unrelated symbols. The
//! repair table maps those symbols back. It is a fixed, lossy list of
//! substitutions applied in order, not a general charset converter.

/// Built-in repairs, applied in order after trimming.
///
/// The first five rows are the historical table and must stay first and
/// in this order.
pub const DEFAULT_REPAIRS: &[(&str, &str)] = &[
    ("\u{00A1}", "í"),
    ("\u{00A2}", "ó"),
    ("\u{00A4}", "ñ"),
    ("\u{0082}", "é"),
    ("\u{00A3}", "ú"),
    ("\u{00A0}", "á"),
    ("\u{00A5}", "Ñ"),
    // stray markers
    ("\u{FEFF}", ""),
    ("\u{FFFD}", ""),
];

/// Characters removed anywhere in a name.
const STRIPPED: [char; 2] = ['\t', '"'];

/// Ordered substitution list used to clean name fields.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    repairs: Vec<(String, String)>,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self {
            repairs: DEFAULT_REPAIRS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl TextCleaner {
    /// Create a cleaner with the built-in table followed by `extra` rows.
    pub fn with_extra(extra: &[(String, String)]) -> Self {
        let mut cleaner = Self::default();
        cleaner
            .repairs
            .extend(extra.iter().filter(|(from, _)| !from.is_empty()).cloned());
        cleaner
    }

    /// Number of substitution rows.
    pub fn len(&self) -> usize {
        self.repairs.len()
    }

    /// Clean a raw name field.
    pub fn clean(&self, raw: &str) -> String {
        let mut text: String = trim_control(raw)
            .chars()
            .filter(|c| !STRIPPED.contains(c))
            .collect();

        for (from, to) in &self.repairs {
            if text.contains(from.as_str()) {
                text = text.replace(from.as_str(), to);
            }
        }

        text
    }
}

/// Trim ASCII spaces and control characters from both ends.
///
/// `str::trim` would also eat U+00A0, which is a mis-decoded `á` here.
pub fn trim_control(raw: &str) -> &str {
    raw.trim_matches(|c: char| c <= ' ')
}
