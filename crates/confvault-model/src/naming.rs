//! Filesystem-safe item names and backup file names

use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("this regex should always be valid"));

/// Replace every char that is not a letter, digit, `_`, whitespace or `-` with `_`
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

/// [`sanitize_name`] followed by lowercasing, used for collision checks
#[must_use]
pub fn sanitize_name_folded(name: &str) -> String {
    sanitize_name(name).to_lowercase()
}

/// Which file of a kind's layout an operation addresses
///
/// A kind's file template may reference `{item_name}` and `{item_id}`. Index
/// kinds use a fixed file name, member kinds are keyed by name and, when
/// names collide once sanitized, by name and identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileKey<'a> {
    item: Option<(&'a str, &'a str)>,
    extended: bool,
}

impl<'a> FileKey<'a> {
    /// File template used verbatim
    #[inline]
    #[must_use]
    pub const fn fixed() -> Self {
        Self {
            item: None,
            extended: false,
        }
    }

    /// File of the item named `name` with identifier `id`
    #[inline]
    #[must_use]
    pub const fn item(name: &'a str, id: &'a str) -> Self {
        Self {
            item: Some((name, id)),
            extended: false,
        }
    }

    /// Append the identifier to the sanitized name
    #[inline]
    #[must_use]
    pub const fn extended(self, extended: bool) -> Self {
        Self { extended, ..self }
    }

    /// Check whether the identifier is appended to the name
    #[inline]
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        self.extended
    }

    /// Render the file name from a layout template
    ///
    /// # Examples
    /// ```
    /// # use confvault_model::FileKey;
    /// let key = FileKey::item("DC/Branch", "0f0f0f0f-1e1e-2d2d-3c3c-4b4b4b4b4b4b");
    /// assert_eq!(key.file_name("{item_name}.json"), "DC_Branch.json");
    /// assert_eq!(
    ///     key.extended(true).file_name("{item_name}.json"),
    ///     "DC_Branch_0f0f0f0f-1e1e-2d2d-3c3c-4b4b4b4b4b4b.json"
    /// );
    /// assert_eq!(FileKey::fixed().file_name("index.json"), "index.json");
    /// ```
    #[must_use]
    pub fn file_name(&self, template: &str) -> String {
        match self.item {
            None => template.to_owned(),
            Some((name, id)) => {
                let safe_name = if self.extended {
                    format!("{}_{id}", sanitize_name(name))
                } else {
                    sanitize_name(name)
                };
                template
                    .replace("{item_name}", &safe_name)
                    .replace("{item_id}", id)
            }
        }
    }
}
