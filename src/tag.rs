//! Field tag grammar.
//!
//! A tag is `NAME[,key=value]*`. The first segment is the external key; the
//! rest are options. Segments are whitespace-trimmed.
//!
//! One exception to comma splitting: once a segment starts with `default=`,
//! everything from there to the end of the tag is that option's value, commas
//! included. Defaults are often lists themselves:
//!
//! ```text
//! PEERS,parser=comma-list,default=a.example, b.example
//!                         └──────── default ────────┘
//! ```
//!
//! The escape is applied once. A default value may itself contain `default=`
//! and is still taken verbatim.

use std::collections::BTreeMap;

use crate::error::TagError;

pub const CONST: &str = "const";
pub const DEFAULT: &str = "default";
pub const DEFAULT_FROM: &str = "defaultFrom";
pub const PARSER: &str = "parser";

/// Validator run on an option's final raw value.
pub type Validator<'a> = Box<dyn Fn(&str) -> Result<(), String> + 'a>;

/// A parsed field tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    /// External key to look up. Empty only for constant fields.
    pub name: String,
    pub options: BTreeMap<String, String>,
}

impl Tag {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Whether `const` is set to a true value. Unset or invalid reads as false.
    pub fn is_const(&self) -> bool {
        self.option(CONST)
            .and_then(|v| parse_bool(v).ok())
            .unwrap_or(false)
    }
}

/// A recognized option: its key, an implicit default, and a validator.
pub struct TagOption<'a> {
    name: &'static str,
    default: Option<&'static str>,
    validator: Validator<'a>,
}

impl<'a> TagOption<'a> {
    /// An option that accepts any value and has no implicit default.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            validator: Box::new(|_| Ok(())),
        }
    }

    /// Value synthesized when the tag does not set this option.
    pub fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub fn validator(mut self, f: impl Fn(&str) -> Result<(), String> + 'a) -> Self {
        self.validator = Box::new(f);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Parse `raw` against the options legal for the field.
pub fn parse_tag(raw: &str, options: &[TagOption<'_>]) -> Result<Tag, TagError> {
    let (head, default_segment) = split_default(raw);

    let mut parts = head.split(',');
    // split always yields at least one item
    let name = parts.next().unwrap_or_default().trim().to_string();
    let mut tag = Tag {
        name,
        options: BTreeMap::new(),
    };

    for segment in parts.chain(default_segment).map(str::trim) {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(TagError::NotKeyValue(segment.to_string()));
        };
        if !options.iter().any(|option| option.name == key) {
            return Err(TagError::Unrecognized(key.to_string()));
        }
        if tag.options.contains_key(key) {
            return Err(TagError::Duplicate(key.to_string()));
        }
        tag.options.insert(key.to_string(), value.to_string());
    }

    for option in options {
        if !tag.options.contains_key(option.name) {
            let Some(default) = option.default else {
                continue;
            };
            tag.options.insert(option.name.to_string(), default.to_string());
        }
        let value = &tag.options[option.name];
        (option.validator)(value).map_err(|reason| TagError::Option {
            key: option.name.to_string(),
            reason,
        })?;
    }

    Ok(tag)
}

/// Split off the trailing `default=` segment, if any.
///
/// The marker must follow a comma (optionally with whitespace between) and
/// must not be in the first segment, so `default=x` alone is a key name.
fn split_default(raw: &str) -> (&str, Option<&str>) {
    for (comma, _) in raw.match_indices(',') {
        if comma == 0 {
            continue;
        }
        let rest = raw[comma + 1..].trim_start();
        if rest.starts_with("default=") {
            return (&raw[..comma], Some(rest));
        }
    }
    (raw, None)
}

/// Boolean strings as accepted for `const` and the `parse-bool` parser:
/// `1 t T TRUE true True 0 f F FALSE false False`.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid boolean {s:?}")),
    }
}
