//! Surface records produced by analyzers
//!
//! A surface is one structural fact extracted from a repository: a route, an API
//! endpoint, a data model and so on. Every category is a variant of the closed
//! [`Surface`] enum so evaluators can match exhaustively instead of comparing
//! discriminator strings.

mod kinds;

pub use kinds::{IntegrationKind, MiddlewareKind, StoreKind};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a surface in the analyzed repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
}

impl SourceRef {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
            line_start: None,
            line_end: None,
        }
    }

    pub fn line(path: impl Into<String>, line: u32) -> Self {
        Self {
            file_path: path.into(),
            line_start: Some(line),
            line_end: Some(line),
        }
    }

    pub fn with_lines(mut self, start: u32, end: u32) -> Self {
        self.line_start = Some(start);
        self.line_end = Some(end);
        self
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line_start, self.line_end) {
            (Some(start), Some(end)) if start != end => {
                write!(f, "{}:{}-{}", self.file_path, start, end)
            }
            (Some(start), _) => write!(f, "{}:{}", self.file_path, start),
            _ => write!(f, "{}", self.file_path),
        }
    }
}

/// Surface category discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    Route,
    Api,
    Model,
    Component,
    EnvVar,
    Config,
    Middleware,
    StateStore,
    Integration,
    UiFlow,
}

impl SurfaceType {
    pub fn all() -> &'static [SurfaceType] {
        &[
            SurfaceType::Route,
            SurfaceType::Api,
            SurfaceType::Model,
            SurfaceType::Component,
            SurfaceType::EnvVar,
            SurfaceType::Config,
            SurfaceType::Middleware,
            SurfaceType::StateStore,
            SurfaceType::Integration,
            SurfaceType::UiFlow,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceType::Route => "route",
            SurfaceType::Api => "api",
            SurfaceType::Model => "model",
            SurfaceType::Component => "component",
            SurfaceType::EnvVar => "env_var",
            SurfaceType::Config => "config",
            SurfaceType::Middleware => "middleware",
            SurfaceType::StateStore => "state_store",
            SurfaceType::Integration => "integration",
            SurfaceType::UiFlow => "ui_flow",
        }
    }

    /// Plural label used in progress messages and report headings
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceType::Route => "Routes",
            SurfaceType::Api => "APIs",
            SurfaceType::Model => "Models",
            SurfaceType::Component => "Components",
            SurfaceType::EnvVar => "Environment variables",
            SurfaceType::Config => "Config",
            SurfaceType::Middleware => "Middleware",
            SurfaceType::StateStore => "State stores",
            SurfaceType::Integration => "Integrations",
            SurfaceType::UiFlow => "UI flows",
        }
    }

    /// Prefix of the document ids assigned to this category
    pub fn id_prefix(&self) -> &'static str {
        match self {
            SurfaceType::Route => "ROUTE",
            SurfaceType::Api => "API",
            SurfaceType::Model => "MODEL",
            SurfaceType::Component => "COMP",
            SurfaceType::EnvVar => "ENV",
            SurfaceType::Config => "CFG",
            SurfaceType::Middleware => "MW",
            SurfaceType::StateStore => "STORE",
            SurfaceType::Integration => "INT",
            SurfaceType::UiFlow => "FLOW",
        }
    }

    /// Minimum documented percentage required by the coverage gate
    pub fn coverage_threshold(&self) -> f64 {
        match self {
            SurfaceType::Route | SurfaceType::Api | SurfaceType::Model => 95.0,
            SurfaceType::EnvVar => 100.0,
            SurfaceType::Config | SurfaceType::Middleware | SurfaceType::Integration => 90.0,
            SurfaceType::Component | SurfaceType::StateStore => 85.0,
            SurfaceType::UiFlow => 75.0,
        }
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSurface {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub api_calls: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSurface {
    pub name: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub request_schema: serde_json::Value,
    #[serde(default)]
    pub response_schema: serde_json::Value,
    #[serde(default)]
    pub models: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelField {
    pub name: String,
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSurface {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<ModelField>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSurface {
    pub name: String,
    #[serde(default)]
    pub props: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVarSurface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub used_in: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSurface {
    pub name: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub used_in: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareSurface {
    pub name: String,
    pub kind: MiddlewareKind,
    /// Route glob patterns the middleware is mounted on, e.g. `/api/*`
    #[serde(default)]
    pub applies_to: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateStoreSurface {
    pub name: String,
    pub kind: StoreKind,
    #[serde(default)]
    pub consumers: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSurface {
    pub name: String,
    pub provider: String,
    pub kind: IntegrationKind,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiFlowSurface {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub routes: Vec<String>,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One extracted structural fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "surface_type", rename_all = "snake_case")]
pub enum Surface {
    Route(RouteSurface),
    Api(ApiSurface),
    Model(ModelSurface),
    Component(ComponentSurface),
    EnvVar(EnvVarSurface),
    Config(ConfigSurface),
    Middleware(MiddlewareSurface),
    StateStore(StateStoreSurface),
    Integration(IntegrationSurface),
    UiFlow(UiFlowSurface),
}

macro_rules! each_variant {
    ($surface:expr, $inner:ident => $body:expr) => {
        match $surface {
            Surface::Route($inner) => $body,
            Surface::Api($inner) => $body,
            Surface::Model($inner) => $body,
            Surface::Component($inner) => $body,
            Surface::EnvVar($inner) => $body,
            Surface::Config($inner) => $body,
            Surface::Middleware($inner) => $body,
            Surface::StateStore($inner) => $body,
            Surface::Integration($inner) => $body,
            Surface::UiFlow($inner) => $body,
        }
    };
}

impl Surface {
    pub fn surface_type(&self) -> SurfaceType {
        match self {
            Surface::Route(_) => SurfaceType::Route,
            Surface::Api(_) => SurfaceType::Api,
            Surface::Model(_) => SurfaceType::Model,
            Surface::Component(_) => SurfaceType::Component,
            Surface::EnvVar(_) => SurfaceType::EnvVar,
            Surface::Config(_) => SurfaceType::Config,
            Surface::Middleware(_) => SurfaceType::Middleware,
            Surface::StateStore(_) => SurfaceType::StateStore,
            Surface::Integration(_) => SurfaceType::Integration,
            Surface::UiFlow(_) => SurfaceType::UiFlow,
        }
    }

    pub fn name(&self) -> &str {
        each_variant!(self, s => s.name.as_str())
    }

    pub fn sources(&self) -> &[SourceRef] {
        each_variant!(self, s => s.sources.as_slice())
    }

    pub fn description(&self) -> Option<&str> {
        each_variant!(self, s => s.description.as_deref())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        each_variant!(self, s => s.description = Some(description))
    }

    /// File of the first source reference, if any
    pub fn primary_file(&self) -> Option<&str> {
        self.sources().first().map(|s| s.file_path.as_str())
    }

    pub fn declared_in(&self, file: &str) -> bool {
        self.sources().iter().any(|s| s.file_path == file)
    }
}

/// Count surfaces per category
pub fn count_by_type(surfaces: &[Surface]) -> std::collections::BTreeMap<SurfaceType, usize> {
    let mut counts = std::collections::BTreeMap::new();
    for surface in surfaces {
        *counts.entry(surface.surface_type()).or_insert(0) += 1;
    }
    counts
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_surface_type_and_name() {
        let surface = route("/users", &["UserList"], &[]);
        assert_eq!(surface.surface_type(), SurfaceType::Route);
        assert_eq!(surface.name(), "/users");
        assert_eq!(surface.primary_file(), Some("src/routes.tsx"));
    }

    #[test]
    fn test_serialization_uses_surface_type_tag() {
        let surface = api("GetUser", json!({}), json!({"$ref": "#/components/schemas/User"}));
        let value = serde_json::to_value(&surface).unwrap();
        assert_eq!(value["surface_type"], "api");
        assert_eq!(value["name"], "GetUser");

        let back: Surface = serde_json::from_value(value).unwrap();
        assert_eq!(back, surface);
    }

    #[test]
    fn test_set_description() {
        let mut surface = model("User");
        assert!(surface.description().is_none());
        surface.set_description("A registered account");
        assert_eq!(surface.description(), Some("A registered account"));
    }

    #[test]
    fn test_source_ref_display() {
        assert_eq!(SourceRef::file("a.ts").to_string(), "a.ts");
        assert_eq!(SourceRef::line("a.ts", 4).to_string(), "a.ts:4");
        assert_eq!(SourceRef::file("a.ts").with_lines(4, 9).to_string(), "a.ts:4-9");
    }

    #[test]
    fn test_count_by_type() {
        let surfaces = vec![route("/a", &[], &[]), route("/b", &[], &[]), model("User")];
        let counts = count_by_type(&surfaces);
        assert_eq!(counts[&SurfaceType::Route], 2);
        assert_eq!(counts[&SurfaceType::Model], 1);
        assert!(!counts.contains_key(&SurfaceType::Api));
    }

    #[test]
    fn test_every_type_has_distinct_prefix() {
        let mut prefixes: Vec<_> = SurfaceType::all().iter().map(|t| t.id_prefix()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), SurfaceType::all().len());
    }
}
