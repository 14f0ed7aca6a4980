use super::{TraceMap, TraceRow, TraceTarget, TraceabilityReport};
use crate::gaps::schema::referenced_models;
use crate::surface::{Surface, SurfaceType};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

pub const ROUTES_TO_COMPONENTS: &str = "Routes → Components";
pub const ROUTES_TO_APIS: &str = "Routes → APIs";
pub const APIS_TO_MODELS: &str = "APIs → Models";
pub const CONFIG_TO_FILES: &str = "Config → Files";
pub const MIDDLEWARE_TO_ROUTES: &str = "Middleware → Routes";
pub const STORES_TO_COMPONENTS: &str = "State stores → Components";
pub const INTEGRATIONS_TO_APIS: &str = "Integrations → APIs";

/// Target entities of one map and the keys each can be reached by
struct Targets {
    /// (display name, lookup keys)
    entries: Vec<(String, Vec<String>)>,
}

impl Targets {
    fn of<'a>(surfaces: impl Iterator<Item = &'a Surface>, keys: impl Fn(&Surface) -> Vec<String>) -> Self {
        Self {
            entries: surfaces.map(|s| (s.name().to_string(), keys(s))).collect(),
        }
    }

    fn resolve(&self, reference: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, keys)| keys.iter().any(|k| k == reference))
            .map(|(name, _)| name.as_str())
    }
}

/// Partially built map
struct MapBuilder {
    map: TraceMap,
    referenced: HashSet<String>,
}

impl MapBuilder {
    fn new(title: &str, source_type: SurfaceType, target: TraceTarget) -> Self {
        Self {
            map: TraceMap {
                title: title.to_string(),
                source_type,
                target,
                rows: Vec::new(),
                orphan_sources: Vec::new(),
                orphan_targets: Vec::new(),
            },
            referenced: HashSet::new(),
        }
    }

    fn row(&mut self, source: &Surface, resolved: Vec<String>, unresolved: Vec<String>) {
        let mut deduped = Vec::with_capacity(resolved.len());
        for name in resolved {
            if !deduped.contains(&name) {
                self.referenced.insert(name.clone());
                deduped.push(name);
            }
        }
        if deduped.is_empty() {
            self.map.orphan_sources.push(source.name().to_string());
        }
        self.map.rows.push(TraceRow {
            source: source.name().to_string(),
            file: source.primary_file().map(str::to_string),
            resolved: deduped,
            unresolved,
        });
    }

    fn finish(mut self, targets: Option<&Targets>) -> TraceMap {
        if let Some(targets) = targets {
            let mut seen = BTreeSet::new();
            for (name, _) in &targets.entries {
                if !self.referenced.contains(name) && seen.insert(name.clone()) {
                    self.map.orphan_targets.push(name.clone());
                }
            }
        }
        self.map
    }
}

fn by_type(surfaces: &[Surface], surface_type: SurfaceType) -> impl Iterator<Item = &Surface> {
    surfaces.iter().filter(move |s| s.surface_type() == surface_type)
}

/// Route pattern matcher where `*` stays within one path segment and `**` crosses them
fn route_matcher(pattern: &str) -> Option<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .ok()
        .map(|g| g.compile_matcher())
}

fn name_key(surface: &Surface) -> Vec<String> {
    vec![surface.name().to_string()]
}

/// Resolve each reference against `targets`, splitting into (resolved, unresolved)
fn resolve_all(targets: &Targets, references: &[String]) -> (Vec<String>, Vec<String>) {
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    for reference in references {
        match targets.resolve(reference) {
            Some(name) => resolved.push(name.to_string()),
            None => unresolved.push(reference.clone()),
        }
    }
    (resolved, unresolved)
}

/// Builds the seven traceability maps
#[derive(Debug, Default, Clone)]
pub struct TraceabilityBuilder {
    known_files: Option<HashSet<String>>,
}

impl TraceabilityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict config file references to files that exist in the inventory.
    pub fn with_known_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(&self, surfaces: &[Surface]) -> TraceabilityReport {
        let maps = vec![
            self.routes_to_components(surfaces),
            self.routes_to_apis(surfaces),
            self.apis_to_models(surfaces),
            self.config_to_files(surfaces),
            self.middleware_to_routes(surfaces),
            self.stores_to_components(surfaces),
            self.integrations_to_apis(surfaces),
        ];
        for map in &maps {
            debug!(
                map = %map.title,
                links = map.link_count(),
                unresolved = map.unresolved_count(),
                orphans = map.orphan_sources.len() + map.orphan_targets.len(),
                "Built trace map"
            );
        }
        TraceabilityReport { maps }
    }

    fn routes_to_components(&self, surfaces: &[Surface]) -> TraceMap {
        let targets = Targets::of(by_type(surfaces, SurfaceType::Component), name_key);
        let mut map = MapBuilder::new(
            ROUTES_TO_COMPONENTS,
            SurfaceType::Route,
            TraceTarget::Surface(SurfaceType::Component),
        );
        for surface in surfaces {
            if let Surface::Route(route) = surface {
                let (resolved, unresolved) = resolve_all(&targets, &route.components);
                map.row(surface, resolved, unresolved);
            }
        }
        map.finish(Some(&targets))
    }

    fn routes_to_apis(&self, surfaces: &[Surface]) -> TraceMap {
        let targets = Targets::of(by_type(surfaces, SurfaceType::Api), |s| match s {
            Surface::Api(api) => vec![
                api.name.clone(),
                api.path.clone(),
                format!("{} {}", api.method, api.path),
            ],
            _ => name_key(s),
        });
        let mut map = MapBuilder::new(
            ROUTES_TO_APIS,
            SurfaceType::Route,
            TraceTarget::Surface(SurfaceType::Api),
        );
        for surface in surfaces {
            if let Surface::Route(route) = surface {
                let (resolved, unresolved) = resolve_all(&targets, &route.api_calls);
                map.row(surface, resolved, unresolved);
            }
        }
        map.finish(Some(&targets))
    }

    fn apis_to_models(&self, surfaces: &[Surface]) -> TraceMap {
        let targets = Targets::of(by_type(surfaces, SurfaceType::Model), name_key);
        let mut map = MapBuilder::new(
            APIS_TO_MODELS,
            SurfaceType::Api,
            TraceTarget::Surface(SurfaceType::Model),
        );
        for surface in surfaces {
            if let Surface::Api(api) = surface {
                let mut references = api.models.clone();
                for schema in [&api.request_schema, &api.response_schema] {
                    for model in referenced_models(schema) {
                        if !references.contains(&model) {
                            references.push(model);
                        }
                    }
                }
                let (resolved, unresolved) = resolve_all(&targets, &references);
                map.row(surface, resolved, unresolved);
            }
        }
        map.finish(Some(&targets))
    }

    fn config_to_files(&self, surfaces: &[Surface]) -> TraceMap {
        let mut map = MapBuilder::new(CONFIG_TO_FILES, SurfaceType::Config, TraceTarget::File);
        for surface in surfaces {
            if let Surface::Config(config) = surface {
                let (resolved, unresolved): (Vec<String>, Vec<String>) =
                    config.used_in.iter().cloned().partition(|file| match &self.known_files {
                        Some(known) => known.contains(file),
                        None => true,
                    });
                map.row(surface, resolved, unresolved);
            }
        }
        map.finish(None)
    }

    fn middleware_to_routes(&self, surfaces: &[Surface]) -> TraceMap {
        let routes: Vec<&Surface> = by_type(surfaces, SurfaceType::Route).collect();
        let targets = Targets::of(routes.iter().copied(), name_key);
        let mut map = MapBuilder::new(
            MIDDLEWARE_TO_ROUTES,
            SurfaceType::Middleware,
            TraceTarget::Surface(SurfaceType::Route),
        );

        for surface in surfaces {
            let Surface::Middleware(middleware) = surface else {
                continue;
            };
            let mut resolved = Vec::new();
            let mut unresolved = Vec::new();
            for pattern in &middleware.applies_to {
                let matcher = route_matcher(pattern);
                let matched: Vec<String> = routes
                    .iter()
                    .filter_map(|r| match (r, &matcher) {
                        (Surface::Route(route), Some(m)) if m.is_match(&route.path) => {
                            Some(route.name.clone())
                        }
                        (Surface::Route(route), None) if route.path == *pattern => {
                            Some(route.name.clone())
                        }
                        _ => None,
                    })
                    .collect();
                if matched.is_empty() {
                    unresolved.push(pattern.clone());
                } else {
                    resolved.extend(matched);
                }
            }
            map.row(surface, resolved, unresolved);
        }
        map.finish(Some(&targets))
    }

    fn stores_to_components(&self, surfaces: &[Surface]) -> TraceMap {
        let targets = Targets::of(by_type(surfaces, SurfaceType::Component), name_key);
        let mut map = MapBuilder::new(
            STORES_TO_COMPONENTS,
            SurfaceType::StateStore,
            TraceTarget::Surface(SurfaceType::Component),
        );
        for surface in surfaces {
            if let Surface::StateStore(store) = surface {
                let (resolved, unresolved) = resolve_all(&targets, &store.consumers);
                map.row(surface, resolved, unresolved);
            }
        }
        map.finish(Some(&targets))
    }

    /// Integrations link to every API declared in one of their source files.
    fn integrations_to_apis(&self, surfaces: &[Surface]) -> TraceMap {
        let apis: Vec<&Surface> = by_type(surfaces, SurfaceType::Api).collect();
        let targets = Targets::of(apis.iter().copied(), name_key);
        let mut map = MapBuilder::new(
            INTEGRATIONS_TO_APIS,
            SurfaceType::Integration,
            TraceTarget::Surface(SurfaceType::Api),
        );
        for surface in surfaces {
            if let Surface::Integration(_) = surface {
                let resolved: Vec<String> = apis
                    .iter()
                    .filter(|api| surface.sources().iter().any(|s| api.declared_in(&s.file_path)))
                    .map(|api| api.name().to_string())
                    .collect();
                map.row(surface, resolved, Vec::new());
            }
        }
        map.finish(Some(&targets))
    }
}
