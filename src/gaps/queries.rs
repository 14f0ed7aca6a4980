use super::schema::{is_empty_schema, referenced_models};
use super::{GapCategory, GapEntry, GapInput, GapQuery};
use crate::surface::{Surface, SurfaceType};
use anyhow::Result;
use std::collections::HashSet;
use tracing::warn;

/// Literal markers that identify an acceptance-criteria section
pub const ACCEPTANCE_MARKERS: &[&str] = &["## Acceptance Criteria", "Acceptance criteria:", "Given "];

/// Titles closer than this are offered as a likely mismatch
const SUGGESTION_SIMILARITY: f64 = 0.85;

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Surfaces whose name matches no written document title
pub struct UncoveredSurfaceQuery;

impl GapQuery for UncoveredSurfaceQuery {
    fn name(&self) -> &'static str {
        "uncovered_surface"
    }

    fn run(&self, input: &GapInput<'_>) -> Result<Vec<GapEntry>> {
        let titles: Vec<String> = input.documents.iter().map(|d| normalize(&d.title)).collect();
        let title_set: HashSet<&str> = titles.iter().map(String::as_str).collect();

        let mut gaps = Vec::new();
        for surface in input.surfaces {
            let name = normalize(surface.name());
            if title_set.contains(name.as_str()) {
                continue;
            }

            let closest = input
                .documents
                .iter()
                .filter(|d| d.surface_type == surface.surface_type())
                .map(|d| (d, strsim::jaro_winkler(&name, &normalize(&d.title))))
                .filter(|(_, score)| *score >= SUGGESTION_SIMILARITY)
                .max_by(|a, b| a.1.total_cmp(&b.1));

            let action = match closest {
                Some((doc, _)) => format!(
                    "Write a {} document for '{}' (closest existing: {} '{}')",
                    surface.surface_type(),
                    surface.name(),
                    doc.id,
                    doc.title
                ),
                None => format!(
                    "Write a {} document for '{}'",
                    surface.surface_type(),
                    surface.name()
                ),
            };

            gaps.push(GapEntry::new(
                GapCategory::UncoveredSurface,
                format!("{} '{}' has no document", surface.surface_type(), surface.name()),
                surface.primary_file(),
                action,
            ));
        }
        Ok(gaps)
    }
}

/// Documents without any acceptance-criteria marker
pub struct IncompleteDocumentQuery;

impl GapQuery for IncompleteDocumentQuery {
    fn name(&self) -> &'static str {
        "incomplete_document"
    }

    fn run(&self, input: &GapInput<'_>) -> Result<Vec<GapEntry>> {
        let mut gaps = Vec::new();
        for document in input.documents {
            let body = match input.writer.read_body(document) {
                Ok(body) => body,
                Err(e) => {
                    warn!(id = %document.id, error = %e, "Document body unreadable");
                    gaps.push(GapEntry::new(
                        GapCategory::IncompleteDocument,
                        format!("Document {} '{}' is missing or unreadable", document.id, document.title),
                        Some(&document.path),
                        "Regenerate the document by re-running without --resume",
                    ));
                    continue;
                }
            };
            if ACCEPTANCE_MARKERS.iter().any(|m| body.contains(m)) {
                continue;
            }
            gaps.push(GapEntry::new(
                GapCategory::IncompleteDocument,
                format!("Document {} '{}' has no acceptance criteria", document.id, document.title),
                Some(&document.path),
                "Add an '## Acceptance Criteria' section with Given/When/Then statements",
            ));
        }
        Ok(gaps)
    }
}

/// APIs with neither a request nor a response schema
pub struct UndocumentedContractQuery;

impl GapQuery for UndocumentedContractQuery {
    fn name(&self) -> &'static str {
        "undocumented_contract"
    }

    fn run(&self, input: &GapInput<'_>) -> Result<Vec<GapEntry>> {
        let gaps = input
            .surfaces
            .iter()
            .filter_map(|s| match s {
                Surface::Api(api) => Some(api),
                _ => None,
            })
            .filter(|api| is_empty_schema(&api.request_schema) && is_empty_schema(&api.response_schema))
            .map(|api| {
                GapEntry::new(
                    GapCategory::UndocumentedContract,
                    format!("API {} {} has no request or response schema", api.method, api.path),
                    api.sources.first().map(|s| s.file_path.as_str()),
                    format!("Document the request and response contract of '{}'", api.name),
                )
            })
            .collect();
        Ok(gaps)
    }
}

/// Models referenced through `$ref` that lack a model surface or its document
pub struct OrphanedDataContractQuery;

impl GapQuery for OrphanedDataContractQuery {
    fn name(&self) -> &'static str {
        "orphaned_data_contract"
    }

    fn run(&self, input: &GapInput<'_>) -> Result<Vec<GapEntry>> {
        let models: HashSet<String> = input
            .surfaces
            .iter()
            .filter(|s| s.surface_type() == SurfaceType::Model)
            .map(|s| normalize(s.name()))
            .collect();
        let documented: HashSet<String> = input
            .documents
            .iter()
            .filter(|d| d.surface_type == SurfaceType::Model)
            .map(|d| normalize(&d.title))
            .collect();

        let mut reported: HashSet<String> = HashSet::new();
        let mut gaps = Vec::new();
        for surface in input.surfaces {
            let Surface::Api(api) = surface else {
                continue;
            };
            let mut referenced = referenced_models(&api.request_schema);
            for name in referenced_models(&api.response_schema) {
                if !referenced.contains(&name) {
                    referenced.push(name);
                }
            }

            for model in referenced {
                let key = normalize(&model);
                if reported.contains(&key) {
                    continue;
                }
                let file = api.sources.first().map(|s| s.file_path.as_str());
                if !models.contains(&key) {
                    gaps.push(GapEntry::new(
                        GapCategory::OrphanedDataContract,
                        format!("Model '{}' referenced by API '{}' was never extracted", model, api.name),
                        file,
                        format!("Add a model definition for '{}' or fix the reference", model),
                    ));
                    reported.insert(key);
                } else if !documented.contains(&key) {
                    gaps.push(GapEntry::new(
                        GapCategory::OrphanedDataContract,
                        format!("Model '{}' referenced by API '{}' has no document", model, api.name),
                        file,
                        format!("Write a model document for '{}'", model),
                    ));
                    reported.insert(key);
                }
            }
        }
        Ok(gaps)
    }
}

/// Cross-references that resolve to no surface.
///
/// A reference is only checked when its target category has at least one surface;
/// an empty category means no analyzer extracted it, not that it is missing.
pub struct DanglingReferenceQuery;

impl GapQuery for DanglingReferenceQuery {
    fn name(&self) -> &'static str {
        "dangling_reference"
    }

    fn run(&self, input: &GapInput<'_>) -> Result<Vec<GapEntry>> {
        let mut components = HashSet::new();
        let mut apis = HashSet::new();
        let mut routes = HashSet::new();
        for surface in input.surfaces {
            match surface {
                Surface::Component(c) => {
                    components.insert(c.name.as_str());
                }
                Surface::Api(a) => {
                    apis.insert(a.name.as_str());
                    apis.insert(a.path.as_str());
                }
                Surface::Route(r) => {
                    routes.insert(r.path.as_str());
                    routes.insert(r.name.as_str());
                }
                _ => {}
            }
        }

        let mut gaps = Vec::new();
        let mut check = |owner: &Surface, target: SurfaceType, known: &HashSet<&str>, names: &[String]| {
            if known.is_empty() {
                return;
            }
            for name in names.iter().filter(|n| !known.contains(n.as_str())) {
                gaps.push(GapEntry::new(
                    GapCategory::DanglingReference,
                    format!(
                        "{} '{}' references unknown {} '{}'",
                        owner.surface_type(),
                        owner.name(),
                        target,
                        name
                    ),
                    owner.primary_file(),
                    format!("Extract {} '{}' or remove the stale reference", target, name),
                ));
            }
        };

        for surface in input.surfaces {
            match surface {
                Surface::Route(route) => {
                    check(surface, SurfaceType::Component, &components, &route.components);
                    check(surface, SurfaceType::Api, &apis, &route.api_calls);
                }
                Surface::StateStore(store) => {
                    check(surface, SurfaceType::Component, &components, &store.consumers);
                }
                Surface::UiFlow(flow) => {
                    check(surface, SurfaceType::Route, &routes, &flow.routes);
                }
                Surface::Api(_)
                | Surface::Model(_)
                | Surface::Component(_)
                | Surface::EnvVar(_)
                | Surface::Config(_)
                | Surface::Middleware(_)
                | Surface::Integration(_) => {}
            }
        }
        Ok(gaps)
    }
}
