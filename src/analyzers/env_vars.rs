//! Environment variables from `.env` templates and code references

use super::{line_of, read_entry, Analyzer};
use crate::inventory::{FileCategory, Inventory};
use crate::stack::StackProfile;
use crate::surface::{EnvVarSurface, SourceRef, Surface};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

const TEMPLATE_FILES: &[&str] = &[".env.example", ".env.template", ".env.sample", ".env.dist"];

/// Template values meaning "must be provided"
const REQUIRED_PLACEHOLDERS: &[&str] = &["", "REQUIRED", "TODO", "changeme"];

pub struct EnvVarAnalyzer {
    template_line: Regex,
    references: Vec<Regex>,
}

impl Default for EnvVarAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvVarAnalyzer {
    pub fn new() -> Self {
        let references = [
            // JavaScript / TypeScript
            r#"process\.env\.([A-Z_][A-Z0-9_]*)"#,
            r#"process\.env\[\s*['"]([A-Z_][A-Z0-9_]*)['"]\s*\]"#,
            r#"import\.meta\.env\.([A-Z_][A-Z0-9_]*)"#,
            // Python
            r#"os\.environ(?:\.get)?[\[(]\s*['"]([A-Z_][A-Z0-9_]*)['"]"#,
            r#"os\.getenv\(\s*['"]([A-Z_][A-Z0-9_]*)['"]"#,
            // Ruby
            r#"ENV(?:\.fetch\(|\[)\s*['"]([A-Z_][A-Z0-9_]*)['"]"#,
            // Go
            r#"os\.(?:Getenv|LookupEnv)\(\s*"([A-Z_][A-Z0-9_]*)""#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect();

        Self {
            template_line: Regex::new(r"(?m)^(?:export\s+)?([A-Z_][A-Z0-9_]*)=(.*)$").expect("valid regex"),
            references,
        }
    }
}

/// Vars in first-seen order
#[derive(Default)]
struct Collected {
    order: Vec<String>,
    vars: HashMap<String, EnvVarSurface>,
}

impl Collected {
    fn entry(&mut self, name: &str, source: SourceRef) -> &mut EnvVarSurface {
        if !self.vars.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.vars.entry(name.to_string()).or_insert_with(|| EnvVarSurface {
            name: name.to_string(),
            default_value: None,
            required: false,
            used_in: Vec::new(),
            sources: vec![source],
            description: None,
        })
    }

    fn into_surfaces(mut self) -> Vec<Surface> {
        self.order
            .iter()
            .filter_map(|name| self.vars.remove(name))
            .map(Surface::EnvVar)
            .collect()
    }
}

impl Analyzer for EnvVarAnalyzer {
    fn name(&self) -> &str {
        "env_vars"
    }

    fn analyze(&self, inventory: &Inventory, _stack: &StackProfile, workdir: &Path) -> Result<Vec<Surface>> {
        let mut collected = Collected::default();

        for template in TEMPLATE_FILES {
            for entry in inventory.files_named(template) {
                let Some(content) = read_entry(workdir, entry) else {
                    continue;
                };
                for cap in self.template_line.captures_iter(&content) {
                    let (Some(name), Some(value)) = (cap.get(1), cap.get(2)) else {
                        continue;
                    };
                    let value = value.as_str().trim().trim_matches(|c| c == '"' || c == '\'');
                    let required = REQUIRED_PLACEHOLDERS.contains(&value);
                    let source = SourceRef::line(&entry.path, line_of(&content, name.start()));

                    let var = collected.entry(name.as_str(), source);
                    var.required |= required;
                    if !required && var.default_value.is_none() {
                        var.default_value = Some(value.to_string());
                    }
                }
            }
        }

        for entry in inventory.files_in(FileCategory::Source) {
            let Some(content) = read_entry(workdir, entry) else {
                continue;
            };
            for pattern in &self.references {
                for cap in pattern.captures_iter(&content) {
                    let Some(name) = cap.get(1) else {
                        continue;
                    };
                    let source = SourceRef::line(&entry.path, line_of(&content, name.start()));
                    let var = collected.entry(name.as_str(), source);
                    if !var.used_in.contains(&entry.path) {
                        var.used_in.push(entry.path.clone());
                    }
                }
            }
        }

        Ok(collected.into_surfaces())
    }
}
