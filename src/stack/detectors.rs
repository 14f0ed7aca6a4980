//! Built-in stack detectors
//!
//! Detection is deterministic: dependency names declared in package manifests and
//! well-known marker files. Each match yields one [`Signal`] whose evidence is the
//! file that matched.

use super::registry::{DetectionInput, Detector};
use super::Signal;
use anyhow::Result;
use regex::Regex;
use tracing::debug;

/// Package ecosystem a dependency rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Npm,
    Pypi,
    RubyGems,
    GoModules,
    Composer,
}

impl Ecosystem {
    fn manifests(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Npm => &["package.json"],
            Ecosystem::Pypi => &["requirements.txt", "pyproject.toml"],
            Ecosystem::RubyGems => &["Gemfile"],
            Ecosystem::GoModules => &["go.mod"],
            Ecosystem::Composer => &["composer.json"],
        }
    }

    fn all() -> &'static [Ecosystem] {
        &[
            Ecosystem::Npm,
            Ecosystem::Pypi,
            Ecosystem::RubyGems,
            Ecosystem::GoModules,
            Ecosystem::Composer,
        ]
    }
}

/// A dependency that indicates a stack
#[derive(Debug, Clone)]
pub struct DependencyRule {
    pub stack: String,
    pub ecosystem: Ecosystem,
    pub dependency: String,
    pub confidence: f64,
}

impl DependencyRule {
    pub fn new(stack: &str, ecosystem: Ecosystem, dependency: &str, confidence: f64) -> Self {
        Self {
            stack: stack.to_string(),
            ecosystem,
            dependency: dependency.to_string(),
            confidence,
        }
    }

    fn matches(&self, dependency: &str) -> bool {
        match self.ecosystem {
            // Go module paths carry major version suffixes (`/v4`)
            Ecosystem::GoModules => dependency.starts_with(&self.dependency),
            Ecosystem::Pypi => dependency.eq_ignore_ascii_case(&self.dependency),
            _ => dependency == self.dependency,
        }
    }
}

pub struct ManifestDependencyDetector {
    rules: Vec<DependencyRule>,
}

impl ManifestDependencyDetector {
    pub fn new(rules: Vec<DependencyRule>) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        use Ecosystem::*;
        Self::new(vec![
            DependencyRule::new("react", Npm, "react", 0.4),
            DependencyRule::new("nextjs", Npm, "next", 0.5),
            DependencyRule::new("vue", Npm, "vue", 0.4),
            DependencyRule::new("nuxt", Npm, "nuxt", 0.5),
            DependencyRule::new("angular", Npm, "@angular/core", 0.5),
            DependencyRule::new("svelte", Npm, "svelte", 0.4),
            DependencyRule::new("express", Npm, "express", 0.5),
            DependencyRule::new("fastify", Npm, "fastify", 0.5),
            DependencyRule::new("nestjs", Npm, "@nestjs/core", 0.5),
            DependencyRule::new("koa", Npm, "koa", 0.5),
            DependencyRule::new("redux", Npm, "redux", 0.4),
            DependencyRule::new("redux", Npm, "@reduxjs/toolkit", 0.4),
            DependencyRule::new("zustand", Npm, "zustand", 0.4),
            DependencyRule::new("prisma", Npm, "@prisma/client", 0.4),
            DependencyRule::new("mongoose", Npm, "mongoose", 0.4),
            DependencyRule::new("typeorm", Npm, "typeorm", 0.4),
            DependencyRule::new("django", Pypi, "django", 0.5),
            DependencyRule::new("flask", Pypi, "flask", 0.5),
            DependencyRule::new("fastapi", Pypi, "fastapi", 0.5),
            DependencyRule::new("sqlalchemy", Pypi, "sqlalchemy", 0.4),
            DependencyRule::new("rails", RubyGems, "rails", 0.5),
            DependencyRule::new("sinatra", RubyGems, "sinatra", 0.5),
            DependencyRule::new("gin", GoModules, "github.com/gin-gonic/gin", 0.5),
            DependencyRule::new("echo", GoModules, "github.com/labstack/echo", 0.5),
            DependencyRule::new("laravel", Composer, "laravel/framework", 0.5),
            DependencyRule::new("symfony", Composer, "symfony/framework-bundle", 0.5),
        ])
    }

    fn dependencies(ecosystem: Ecosystem, manifest: &str, content: &str) -> Vec<String> {
        match (ecosystem, manifest) {
            (Ecosystem::Npm, _) => json_keys(content, &["dependencies", "devDependencies", "peerDependencies"]),
            (Ecosystem::Composer, _) => json_keys(content, &["require", "require-dev"]),
            (Ecosystem::Pypi, "pyproject.toml") => pyproject_dependencies(content),
            (Ecosystem::Pypi, _) => requirements_dependencies(content),
            (Ecosystem::RubyGems, _) => gemfile_dependencies(content),
            (Ecosystem::GoModules, _) => go_mod_dependencies(content),
        }
    }
}

impl Detector for ManifestDependencyDetector {
    fn name(&self) -> &str {
        "manifest-dependencies"
    }

    fn detect(&self, input: &DetectionInput<'_>) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for ecosystem in Ecosystem::all() {
            let rules: Vec<&DependencyRule> =
                self.rules.iter().filter(|r| r.ecosystem == *ecosystem).collect();
            if rules.is_empty() {
                continue;
            }

            for manifest_name in ecosystem.manifests() {
                for entry in input.inventory.files_named(manifest_name) {
                    let Some(content) = input.read(&entry.path) else {
                        debug!(path = %entry.path, "Manifest unreadable, skipping");
                        continue;
                    };
                    let deps = Self::dependencies(*ecosystem, manifest_name, &content);

                    for rule in &rules {
                        if deps.iter().any(|d| rule.matches(d)) {
                            signals.push(Signal::new(
                                rule.stack.clone(),
                                rule.confidence,
                                [entry.path.clone()],
                            )?);
                        }
                    }
                }
            }
        }

        Ok(signals)
    }
}

fn json_keys(content: &str, sections: &[&str]) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(content) else {
        return Vec::new();
    };
    sections
        .iter()
        .filter_map(|section| value.get(section).and_then(|v| v.as_object()))
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}

fn requirement_name(spec: &str) -> Option<String> {
    let name: String = spec
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn requirements_dependencies(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(requirement_name)
        .collect()
}

fn pyproject_dependencies(content: &str) -> Vec<String> {
    let Ok(value) = content.parse::<toml::Table>() else {
        return Vec::new();
    };
    let mut deps = Vec::new();

    if let Some(list) = value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        deps.extend(list.iter().filter_map(|d| d.as_str()).filter_map(requirement_name));
    }

    if let Some(table) = value
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
    {
        deps.extend(table.keys().cloned());
    }

    deps
}

fn gemfile_dependencies(content: &str) -> Vec<String> {
    let gem_re = Regex::new(r#"(?m)^\s*gem\s+['"]([^'"]+)['"]"#).expect("valid regex");
    gem_re
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn go_mod_dependencies(content: &str) -> Vec<String> {
    let mut deps = Vec::new();
    let mut in_block = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with("require (") {
            in_block = true;
            continue;
        }
        if in_block && line.starts_with(')') {
            in_block = false;
            continue;
        }
        let spec = if in_block {
            Some(line)
        } else {
            line.strip_prefix("require ")
        };
        if let Some(module) = spec.and_then(|s| s.split_whitespace().next()) {
            if !module.starts_with("//") {
                deps.push(module.to_string());
            }
        }
    }

    deps
}

/// A file whose presence indicates a stack
#[derive(Debug, Clone)]
pub struct MarkerRule {
    pub stack: String,
    pub marker: String,
    pub confidence: f64,
}

impl MarkerRule {
    pub fn new(stack: &str, marker: &str, confidence: f64) -> Self {
        Self {
            stack: stack.to_string(),
            marker: marker.to_string(),
            confidence,
        }
    }

    fn matches(&self, path: &str) -> bool {
        path == self.marker || path.ends_with(&format!("/{}", self.marker))
    }
}

pub struct MarkerFileDetector {
    rules: Vec<MarkerRule>,
}

impl MarkerFileDetector {
    pub fn new(rules: Vec<MarkerRule>) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![
            MarkerRule::new("nextjs", "next.config.js", 0.4),
            MarkerRule::new("nextjs", "next.config.mjs", 0.4),
            MarkerRule::new("nextjs", "next.config.ts", 0.4),
            MarkerRule::new("nuxt", "nuxt.config.ts", 0.4),
            MarkerRule::new("nuxt", "nuxt.config.js", 0.4),
            MarkerRule::new("angular", "angular.json", 0.4),
            MarkerRule::new("svelte", "svelte.config.js", 0.4),
            MarkerRule::new("vue", "vue.config.js", 0.3),
            MarkerRule::new("react", "src/App.tsx", 0.3),
            MarkerRule::new("react", "src/App.jsx", 0.3),
            MarkerRule::new("django", "manage.py", 0.3),
            MarkerRule::new("rails", "config/routes.rb", 0.4),
            MarkerRule::new("laravel", "artisan", 0.3),
        ])
    }
}

impl Detector for MarkerFileDetector {
    fn name(&self) -> &str {
        "marker-files"
    }

    fn detect(&self, input: &DetectionInput<'_>) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for rule in &self.rules {
            let evidence: Vec<String> = input
                .inventory
                .files
                .iter()
                .filter(|f| rule.matches(&f.path))
                .map(|f| f.path.clone())
                .collect();

            if !evidence.is_empty() {
                signals.push(Signal::new(rule.stack.clone(), rule.confidence, evidence)?);
            }
        }

        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{entry, Inventory};
    use crate::stack::StackAggregator;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn repo(files: &[(&str, &str)]) -> (TempDir, Inventory) {
        let temp = TempDir::new().unwrap();
        let mut entries = Vec::new();
        for (path, content) in files {
            let full = temp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, content).unwrap();
            entries.push(entry(path));
        }
        let inventory = Inventory::new(temp.path().to_path_buf(), entries, Vec::new());
        (temp, inventory)
    }

    fn stacks(detector: &dyn Detector, temp: &TempDir, inventory: &Inventory) -> Vec<String> {
        let input = DetectionInput::new(inventory, temp.path());
        let mut names: Vec<_> = detector
            .detect(&input)
            .unwrap()
            .iter()
            .map(|s| s.stack_name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_package_json_dependencies() {
        let (temp, inventory) = repo(&[(
            "package.json",
            r#"{"dependencies": {"react": "^18", "next": "14"}, "devDependencies": {"zustand": "4"}}"#,
        )]);
        let names = stacks(&ManifestDependencyDetector::with_defaults(), &temp, &inventory);
        assert_eq!(names, vec!["nextjs", "react", "zustand"]);
    }

    #[test]
    fn test_requirements_txt() {
        let (temp, inventory) = repo(&[(
            "requirements.txt",
            "# web\nDjango==4.2\nsqlalchemy>=2.0\n-r base.txt\n",
        )]);
        let names = stacks(&ManifestDependencyDetector::with_defaults(), &temp, &inventory);
        assert_eq!(names, vec!["django", "sqlalchemy"]);
    }

    #[test]
    fn test_pyproject() {
        let (temp, inventory) = repo(&[(
            "pyproject.toml",
            "[project]\nname = \"svc\"\ndependencies = [\"fastapi>=0.100\"]\n\n[tool.poetry.dependencies]\nflask = \"^3\"\n",
        )]);
        let names = stacks(&ManifestDependencyDetector::with_defaults(), &temp, &inventory);
        assert_eq!(names, vec!["fastapi", "flask"]);
    }

    #[test]
    fn test_gemfile_and_go_mod() {
        let (temp, inventory) = repo(&[
            ("Gemfile", "source 'https://rubygems.org'\ngem 'rails', '~> 7.1'\n"),
            (
                "svc/go.mod",
                "module example.com/svc\n\nrequire (\n\tgithub.com/labstack/echo/v4 v4.11.0\n)\n",
            ),
        ]);
        let names = stacks(&ManifestDependencyDetector::with_defaults(), &temp, &inventory);
        assert_eq!(names, vec!["echo", "rails"]);
    }

    #[test]
    fn test_malformed_manifest_yields_nothing() {
        let (temp, inventory) = repo(&[("package.json", "{not json")]);
        let names = stacks(&ManifestDependencyDetector::with_defaults(), &temp, &inventory);
        assert!(names.is_empty());
    }

    #[test]
    fn test_marker_files() {
        let inventory = Inventory::new(
            PathBuf::from("/repo"),
            vec![entry("web/next.config.js"), entry("src/App.tsx"), entry("README.md")],
            Vec::new(),
        );
        let input = DetectionInput::new(&inventory, Path::new("/repo"));
        let signals = MarkerFileDetector::with_defaults().detect(&input).unwrap();

        let next = signals.iter().find(|s| s.stack_name() == "nextjs").unwrap();
        assert_eq!(next.evidence(), &["web/next.config.js".to_string()]);
        assert!(signals.iter().any(|s| s.stack_name() == "react"));
        assert_eq!(signals.len(), 2);
    }

    #[test]
    fn test_detectors_combine_through_aggregator() {
        let (temp, inventory) = repo(&[
            ("package.json", r#"{"dependencies": {"react": "^18"}}"#),
            ("src/App.tsx", "export default function App() {}"),
        ]);
        let registry = crate::stack::DetectorRegistry::with_defaults();
        let input = DetectionInput::new(&inventory, temp.path());
        let profile = StackAggregator::new().detect(&registry, &input);

        assert_eq!(profile.stacks["react"], 0.7);
        assert_eq!(profile.evidence["react"], vec!["package.json", "src/App.tsx"]);
    }
}
