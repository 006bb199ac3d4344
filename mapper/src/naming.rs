use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// An acronym followed by a capitalized word, e.g. `HTTPServer`. A single capital counts,
    /// so `ABc` splits as `A_Bc`.
    static ref ACRONYM_BOUNDARY: Regex = Regex::new(r"([A-Z0-9]+)([A-Z][a-z])").unwrap();
    /// A lowercase letter or digit followed by an uppercase letter, e.g. `fooBar`.
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
}

const SEPARATOR: &str = "${1}_${2}";

/// Convert an element or attribute name into the lowercase, underscore-delimited field name under
/// which its value is stored.
///
/// ```
/// assert_eq!(dt_mapper::normalize("HTTPServer"), "http_server");
/// assert_eq!(dt_mapper::normalize("publishOptions"), "publish_options");
/// assert_eq!(dt_mapper::normalize("my-items"), "my_items");
/// ```
pub fn normalize(raw_name: &str) -> String {
    let word: Cow<str> = ACRONYM_BOUNDARY.replace_all(raw_name, SEPARATOR);
    let word = CAMEL_BOUNDARY.replace_all(&word, SEPARATOR);
    word.replace('-', "_").to_lowercase()
}
