use super::{DocumentWriter, WrittenDocument};
use crate::surface::Surface;
use crate::util::fs::write_atomic;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ACCEPTANCE_CRITERIA_HEADING: &str = "## Acceptance Criteria";

const DOCS_DIR: &str = "docs";

/// Writes one markdown file per surface under `<output>/docs/<surface_type>/<id>.md`
pub struct MarkdownWriter {
    output_dir: PathBuf,
}

impl MarkdownWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn relative_path(surface: &Surface, id: &str) -> String {
        format!("{}/{}/{}.md", DOCS_DIR, surface.surface_type(), id)
    }

    fn record(surface: &Surface, id: &str, skipped: bool) -> WrittenDocument {
        WrittenDocument {
            surface_type: surface.surface_type(),
            id: id.to_string(),
            title: surface.name().to_string(),
            path: Self::relative_path(surface, id),
            skipped,
        }
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        self.output_dir.join(Path::new(relative))
    }
}

impl DocumentWriter for MarkdownWriter {
    fn write(&self, surface: &Surface, id: &str) -> Result<WrittenDocument> {
        let relative = Self::relative_path(surface, id);
        let path = self.absolute(&relative);
        let replaced = path.exists();

        let body = render(surface, id);
        write_atomic(&path, body.as_bytes())
            .with_context(|| format!("Failed to write document {}", path.display()))?;
        debug!(id, path = %path.display(), replaced, "Wrote document");

        Ok(Self::record(surface, id, false))
    }

    fn existing(&self, surface: &Surface, id: &str) -> Result<WrittenDocument> {
        Ok(Self::record(surface, id, true))
    }

    fn read_body(&self, document: &WrittenDocument) -> Result<String> {
        let path = self.absolute(&document.path);
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read document {}", path.display()))
    }
}

fn bullet_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "**{}:**\n", heading);
    for item in items {
        let _ = writeln!(out, "- `{}`", item);
    }
    out.push('\n');
}

fn schema_block(out: &mut String, heading: &str, schema: &serde_json::Value) {
    let _ = writeln!(out, "**{}:**\n", heading);
    let pretty = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    let _ = writeln!(out, "```json\n{}\n```\n", pretty);
}

/// Render the markdown body for one surface
pub(crate) fn render(surface: &Surface, id: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}: {}\n", id, surface.name());
    let _ = writeln!(out, "- **Type:** {}", surface.surface_type().label());
    for source in surface.sources() {
        let _ = writeln!(out, "- **Source:** `{}`", source);
    }
    out.push('\n');

    if let Some(description) = surface.description() {
        let _ = writeln!(out, "## Description\n\n{}\n", description);
    }

    out.push_str("## Details\n\n");
    let criteria = match surface {
        Surface::Route(route) => {
            let _ = writeln!(out, "- **Path:** `{}`", route.path);
            let _ = writeln!(out, "- **Methods:** {}\n", route.methods.join(", "));
            bullet_list(&mut out, "Components", &route.components);
            bullet_list(&mut out, "API calls", &route.api_calls);
            vec![format!(
                "Given a client, when it requests `{} {}`, then the route responds without error.",
                route.methods.first().map(String::as_str).unwrap_or("GET"),
                route.path
            )]
        }
        Surface::Api(api) => {
            let _ = writeln!(out, "- **Endpoint:** `{} {}`\n", api.method, api.path);
            schema_block(&mut out, "Request schema", &api.request_schema);
            schema_block(&mut out, "Response schema", &api.response_schema);
            bullet_list(&mut out, "Models", &api.models);
            vec![
                format!(
                    "Given a valid request, when `{} {}` is called, then the response matches the response schema.",
                    api.method, api.path
                ),
                "Given an invalid request, when the endpoint is called, then it is rejected with a client error.".to_string(),
            ]
        }
        Surface::Model(model) => {
            out.push_str("| Field | Type |\n|---|---|\n");
            for field in &model.fields {
                let _ = writeln!(out, "| {} | {} |", field.name, field.field_type);
            }
            out.push('\n');
            vec![format!(
                "Given a `{}` record, when it is persisted and read back, then every field is preserved.",
                model.name
            )]
        }
        Surface::Component(component) => {
            bullet_list(&mut out, "Props", &component.props);
            vec![format!(
                "Given the `{}` component, when it renders with its documented props, then it displays without error.",
                component.name
            )]
        }
        Surface::EnvVar(var) => {
            let _ = writeln!(out, "- **Required:** {}", if var.required { "yes" } else { "no" });
            if let Some(default) = &var.default_value {
                let _ = writeln!(out, "- **Default:** `{}`", default);
            }
            out.push('\n');
            bullet_list(&mut out, "Used in", &var.used_in);
            if var.required {
                vec![format!(
                    "Given `{}` is unset, when the application starts, then it fails with a clear error.",
                    var.name
                )]
            } else {
                vec![format!(
                    "Given `{}` is unset, when the application starts, then the default value is used.",
                    var.name
                )]
            }
        }
        Surface::Config(config) => {
            bullet_list(&mut out, "Keys", &config.keys);
            bullet_list(&mut out, "Used in", &config.used_in);
            vec![format!(
                "Given the `{}` configuration, when a key is missing, then the application reports it.",
                config.name
            )]
        }
        Surface::Middleware(middleware) => {
            let _ = writeln!(out, "- **Kind:** {}\n", middleware.kind);
            bullet_list(&mut out, "Applies to", &middleware.applies_to);
            vec![format!(
                "Given a request to a matching route, when it is handled, then `{}` runs before the handler.",
                middleware.name
            )]
        }
        Surface::StateStore(store) => {
            let _ = writeln!(out, "- **Kind:** {}\n", store.kind);
            bullet_list(&mut out, "Consumers", &store.consumers);
            vec![format!(
                "Given a state change in `{}`, when consumers re-render, then they observe the new state.",
                store.name
            )]
        }
        Surface::Integration(integration) => {
            let _ = writeln!(out, "- **Provider:** {}", integration.provider);
            let _ = writeln!(out, "- **Kind:** {}\n", integration.kind);
            vec![format!(
                "Given `{}` is unavailable, when the integration is called, then the failure is handled gracefully.",
                integration.provider
            )]
        }
        Surface::UiFlow(flow) => {
            if !flow.steps.is_empty() {
                out.push_str("**Steps:**\n\n");
                for (i, step) in flow.steps.iter().enumerate() {
                    let _ = writeln!(out, "{}. {}", i + 1, step);
                }
                out.push('\n');
            }
            bullet_list(&mut out, "Routes", &flow.routes);
            vec![format!(
                "Given a user starting `{}`, when every step is completed, then the flow ends on its final route.",
                flow.name
            )]
        }
    };

    let _ = writeln!(out, "{}\n", ACCEPTANCE_CRITERIA_HEADING);
    for criterion in criteria {
        let _ = writeln!(out, "- [ ] {}", criterion);
    }
    out
}
