//! Auto-generate markdown documentation.

use std::collections::HashMap;
use std::path::PathBuf;

pub use rollcall_macro::Document;
use serde::Serialize;

pub(crate) fn toml_value_as_markdown<T: Serialize>(value: &T) -> String {
    let mut result = String::new();
    value
        .serialize(toml::ser::ValueSerializer::new(&mut result))
        .expect("not a valid toml value");
    format!("`{result}`")
}

#[derive(Clone, Default)]
pub struct ValueInfo {
    pub required: Option<bool>,
    pub r#type: Option<String>,
    pub default: Option<String>,
}

impl ValueInfo {
    fn as_markdown(&self) -> String {
        let mut lines = vec![];

        if let Some(required) = self.required {
            let yesno = if required { "yes" } else { "no" };
            lines.push(format!("**Required:** {yesno}"));
        }

        if let Some(r#type) = &self.r#type {
            lines.push(format!("**Type:** {type}"));
        }

        if let Some(default) = &self.default {
            lines.push(format!("**Default:** {default}"));
        }

        lines.join("  \n")
    }
}

#[derive(Clone, Default)]
pub struct StructInfo {
    pub fields: HashMap<String, Box<Doc>>,
}

#[derive(Clone, Default)]
pub struct Doc {
    pub description: Option<String>,
    pub value_info: ValueInfo,
    pub struct_info: StructInfo,
}

struct Entry {
    path: String,
    description: String,
    value_info: ValueInfo,
}

impl Doc {
    fn entries(&self) -> Vec<Entry> {
        let mut entries = vec![];

        // Sections only show up through their fields.
        if self.struct_info.fields.is_empty() {
            entries.push(Entry {
                path: String::new(),
                description: self.description.clone().unwrap_or_default(),
                value_info: self.value_info.clone(),
            });
        }

        for (segment, field) in &self.struct_info.fields {
            for mut entry in field.entries() {
                entry.path = if entry.path.is_empty() {
                    segment.clone()
                } else {
                    format!("{segment}.{}", entry.path)
                };
                entries.push(entry);
            }
        }

        entries
    }

    pub fn as_markdown(&self) -> String {
        // Alphabetical order keeps the generated file stable across runs.
        let mut entries = self.entries();
        entries.sort_unstable_by(|a, b| a.path.cmp(&b.path));

        let mut result = String::new();

        result.push_str("# Configuration options\n\n");
        result.push_str("Rollcall's config file uses the [TOML](https://toml.io/) format.\n");

        for entry in entries {
            result.push_str(&format!("\n## `{}`\n", entry.path));

            let value_info = entry.value_info.as_markdown();
            if !value_info.is_empty() {
                result.push_str(&format!("\n{value_info}\n"));
            }

            if !entry.description.is_empty() {
                result.push_str(&format!("\n{}\n", entry.description));
            }
        }

        result
    }
}

pub trait Document {
    fn doc() -> Doc;
}

fn value_doc(r#type: &str) -> Doc {
    let mut doc = Doc::default();
    doc.value_info.required = Some(true);
    doc.value_info.r#type = Some(r#type.to_string());
    doc
}

impl Document for String {
    fn doc() -> Doc {
        value_doc("string")
    }
}

impl Document for bool {
    fn doc() -> Doc {
        value_doc("boolean")
    }
}

impl Document for u64 {
    fn doc() -> Doc {
        value_doc("integer")
    }
}

impl Document for PathBuf {
    fn doc() -> Doc {
        value_doc("path")
    }
}

impl<I: Document> Document for Option<I> {
    fn doc() -> Doc {
        let mut doc = I::doc();
        assert_eq!(doc.value_info.required, Some(true));
        doc.value_info.required = Some(false);
        doc
    }
}
