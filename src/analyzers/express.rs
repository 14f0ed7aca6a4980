//! Routes, endpoints and middleware of Express-style Node servers

use super::{line_of, read_entry, Analyzer};
use crate::inventory::{FileCategory, Inventory};
use crate::stack::StackProfile;
use crate::surface::{ApiSurface, MiddlewareKind, MiddlewareSurface, RouteSurface, SourceRef, Surface};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Stacks whose routing API looks like `app.get('/path', handler)`
pub const EXPRESS_FAMILY: &[&str] = &["express", "fastify", "koa", "nestjs"];

const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "mts", "cts"];

pub struct ExpressRouteAnalyzer {
    route: Regex,
    middleware: Regex,
}

impl Default for ExpressRouteAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressRouteAnalyzer {
    pub fn new() -> Self {
        Self {
            route: Regex::new(
                r#"\b(?:app|router|server|fastify|api)\.(get|post|put|patch|delete|options|head|all)\(\s*['"`]([^'"`]+)['"`]"#,
            )
            .expect("valid regex"),
            middleware: Regex::new(
                r#"\b(?:app|router|server)\.(?:use|register)\(\s*(?:['"`]([^'"`]+)['"`]\s*,\s*)?([A-Za-z_$][\w$.]*)"#,
            )
            .expect("valid regex"),
        }
    }
}

fn middleware_kind(name: &str) -> MiddlewareKind {
    let lower = name.to_lowercase();
    if lower.contains("cors") {
        MiddlewareKind::Cors
    } else if lower.contains("auth") || lower.contains("passport") || lower.contains("jwt") || lower.contains("session") {
        MiddlewareKind::Auth
    } else if lower.contains("morgan") || lower.contains("logger") || lower.contains("log") {
        MiddlewareKind::Logging
    } else if lower.contains("ratelimit") || lower.contains("limiter") || lower.contains("throttle") {
        MiddlewareKind::RateLimit
    } else if lower.contains("valid") || lower.contains("celebrate") {
        MiddlewareKind::Validation
    } else if lower.contains("error") {
        MiddlewareKind::ErrorHandler
    } else {
        MiddlewareKind::Other
    }
}

/// Route glob covering `prefix` and everything below it
fn mount_glob(prefix: Option<&str>) -> String {
    match prefix.map(|p| p.trim_end_matches('/')) {
        None | Some("") => "**".to_string(),
        Some(p) => format!("{{{p},{p}/**}}"),
    }
}

#[derive(Default)]
struct Extracted {
    routes: Vec<RouteSurface>,
    route_index: HashMap<String, usize>,
    apis: Vec<ApiSurface>,
    api_index: HashMap<String, usize>,
    middleware: Vec<MiddlewareSurface>,
}

impl Extracted {
    fn add_endpoint(&mut self, method: &str, path: &str, source: SourceRef) {
        let method = if method == "all" {
            "ALL".to_string()
        } else {
            method.to_uppercase()
        };
        let api_name = format!("{} {}", method, path);

        match self.api_index.get(&api_name) {
            Some(&i) => self.apis[i].sources.push(source.clone()),
            None => {
                self.api_index.insert(api_name.clone(), self.apis.len());
                self.apis.push(ApiSurface {
                    name: api_name.clone(),
                    method: method.clone(),
                    path: path.to_string(),
                    request_schema: serde_json::Value::Null,
                    response_schema: serde_json::Value::Null,
                    models: Vec::new(),
                    sources: vec![source.clone()],
                    description: None,
                });
            }
        }

        let index = match self.route_index.get(path) {
            Some(&i) => i,
            None => {
                self.route_index.insert(path.to_string(), self.routes.len());
                self.routes.push(RouteSurface {
                    name: path.to_string(),
                    path: path.to_string(),
                    methods: Vec::new(),
                    components: Vec::new(),
                    api_calls: Vec::new(),
                    sources: Vec::new(),
                    description: None,
                });
                self.routes.len() - 1
            }
        };
        let route = &mut self.routes[index];
        if !route.methods.contains(&method) {
            route.methods.push(method);
        }
        if !route.api_calls.contains(&api_name) {
            route.api_calls.push(api_name);
        }
        if !route.sources.contains(&source) {
            route.sources.push(source);
        }
    }

    fn into_surfaces(self) -> Vec<Surface> {
        self.routes
            .into_iter()
            .map(Surface::Route)
            .chain(self.apis.into_iter().map(Surface::Api))
            .chain(self.middleware.into_iter().map(Surface::Middleware))
            .collect()
    }
}

impl Analyzer for ExpressRouteAnalyzer {
    fn name(&self) -> &str {
        "express_routes"
    }

    fn analyze(&self, inventory: &Inventory, stack: &StackProfile, workdir: &Path) -> Result<Vec<Surface>> {
        if !stack.has_any(EXPRESS_FAMILY) {
            return Ok(Vec::new());
        }

        let mut extracted = Extracted::default();
        let scripts = inventory
            .files_in(FileCategory::Source)
            .filter(|f| SCRIPT_EXTENSIONS.contains(&f.extension.as_str()));

        for entry in scripts {
            let Some(content) = read_entry(workdir, entry) else {
                continue;
            };

            for cap in self.route.captures_iter(&content) {
                let (Some(method), Some(path)) = (cap.get(1), cap.get(2)) else {
                    continue;
                };
                let source = SourceRef::line(&entry.path, line_of(&content, method.start()));
                extracted.add_endpoint(method.as_str(), path.as_str(), source);
            }

            for cap in self.middleware.captures_iter(&content) {
                let Some(handler) = cap.get(2) else {
                    continue;
                };
                let name = handler.as_str();
                if name == "express.static" || name.ends_with("Router") {
                    continue;
                }
                extracted.middleware.push(MiddlewareSurface {
                    name: name.to_string(),
                    kind: middleware_kind(name),
                    applies_to: vec![mount_glob(cap.get(1).map(|m| m.as_str()))],
                    sources: vec![SourceRef::line(&entry.path, line_of(&content, handler.start()))],
                    description: None,
                });
            }
        }

        Ok(extracted.into_surfaces())
    }
}
