//! Operation naming: derivation of statistics names from type paths, and
//! validation against the export namespace grammar.
//!
//! Statistics names end up as keys in external metrics backends, so a small
//! set of characters is reserved (separators and wildcards of common metric
//! namespaces). Derived names therefore join segments with `.` rather than
//! the Rust path separator. Validation happens once, when a statistics entry
//! is created.

use std::sync::OnceLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// NameStyle
// ---------------------------------------------------------------------------

/// Rendering style for names derived from a Rust type path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// Only the final type segment: `Widget.refresh`.
    ShortName,
    /// Every path segment: `floodgate_core.naming.Widget.refresh`.
    FullyQualifiedName,
    /// Module segments reduced to their first character:
    /// `f.n.Widget.refresh`.
    CompactFullyQualifiedName,
}

/// Derive an operation name from a `::`-separated type path and a method name.
///
/// Segments are joined with `.` so the result is a valid statistics name.
/// The last segment of `type_path` is treated as the type and is never
/// abbreviated; the compact style shortens every module segment before it.
#[must_use]
pub fn qualified_operation_name(type_path: &str, method: &str, style: NameStyle) -> String {
    let segments: Vec<&str> = type_path.split("::").collect();
    match style {
        NameStyle::ShortName => {
            let type_name = segments.last().copied().unwrap_or(type_path);
            format!("{type_name}.{method}")
        }
        NameStyle::FullyQualifiedName => format!("{}.{method}", segments.join(".")),
        NameStyle::CompactFullyQualifiedName => {
            let mut compact = String::with_capacity(type_path.len() + method.len() + 2);
            let last = segments.len().saturating_sub(1);
            for (index, segment) in segments.iter().enumerate() {
                if index < last {
                    if let Some(initial) = segment.chars().next() {
                        compact.push(initial);
                    }
                } else {
                    compact.push_str(segment);
                }
                compact.push('.');
            }
            compact.push_str(method);
            compact
        }
    }
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

/// Error raised when a statistics name cannot be used as an export identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The name is empty.
    #[error("statistics name is empty")]
    Empty,
    /// The name contains a character reserved by the export namespace.
    #[error("statistics name {name:?} contains reserved character {found:?}")]
    ReservedCharacter {
        /// The offending name.
        name: String,
        /// The first reserved character found.
        found: char,
    },
}

fn reserved_characters() -> &'static Regex {
    static RESERVED: OnceLock<Regex> = OnceLock::new();
    RESERVED.get_or_init(|| {
        Regex::new("[:,=*?\"]|[[:cntrl:]]").expect("reserved-character pattern is valid")
    })
}

/// Validate a statistics name for use as an export identifier.
///
/// # Errors
///
/// Returns [`NameError::Empty`] for the empty string and
/// [`NameError::ReservedCharacter`] when the name contains one of
/// `: , = * ? "` or a control character.
pub fn validate_statistics_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if let Some(found) = reserved_characters().find(name) {
        return Err(NameError::ReservedCharacter {
            name: name.to_string(),
            found: found.as_str().chars().next().unwrap_or('\0'),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
