//! Accessor pairing by naming convention.
//!
//! Readers and writers are matched to a canonical property name purely by
//! prefix convention (`getName`/`isName` paired with `setName`), independent
//! of whether a same-named field exists.

// -----------------------------------------------------------------------------
// NamingConvention

/// The accessor prefix convention used to derive canonical property names.
///
/// # Examples
///
/// ```
/// use carton_plan::naming::NamingConvention;
///
/// let naming = NamingConvention::default();
/// assert_eq!(naming.reader_property("getOne"), Some("one".into()));
/// assert_eq!(naming.reader_property("isReady"), Some("ready".into()));
/// assert_eq!(naming.writer_property("setOne"), Some("one".into()));
///
/// // Not accessor-shaped: no property identity.
/// assert_eq!(naming.reader_property("gettysburg"), None);
/// assert_eq!(naming.reader_property("get"), None);
/// ```
#[derive(Debug, Clone)]
pub struct NamingConvention {
    reader_prefixes: Vec<String>,
    writer_prefix: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            reader_prefixes: vec!["get".into(), "is".into()],
            writer_prefix: "set".into(),
        }
    }
}

impl NamingConvention {
    /// A convention with explicit reader prefixes and one writer prefix.
    pub fn new<'a>(readers: impl IntoIterator<Item = &'a str>, writer: &str) -> Self {
        Self {
            reader_prefixes: readers.into_iter().map(String::from).collect(),
            writer_prefix: writer.into(),
        }
    }

    /// Canonical property name of a reader method, if it is reader-shaped.
    pub fn reader_property(&self, method: &str) -> Option<String> {
        self.reader_prefixes
            .iter()
            .find_map(|prefix| strip_property(method, prefix))
    }

    /// Canonical property name of a writer method, if it is writer-shaped.
    pub fn writer_property(&self, method: &str) -> Option<String> {
        strip_property(method, &self.writer_prefix)
    }
}

/// `getOne` with prefix `get` becomes `one`. The character after the prefix
/// must be uppercase, so `gettysburg` is not an accessor.
fn strip_property(method: &str, prefix: &str) -> Option<String> {
    let rest = method.strip_prefix(prefix)?;
    let first = rest.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let mut name = String::with_capacity(rest.len());
    name.push(first.to_ascii_lowercase());
    name.push_str(&rest[first.len_utf8()..]);
    Some(name)
}

// -----------------------------------------------------------------------------
// Tests
