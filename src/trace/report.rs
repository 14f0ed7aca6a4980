use super::TraceabilityReport;
use std::fmt::Write as _;

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items
            .iter()
            .map(|i| format!("`{}`", i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn render_markdown(report: &TraceabilityReport) -> String {
    let mut out = String::from("# Traceability Matrix\n\n");
    let _ = writeln!(
        out,
        "**Links:** {} | **Orphans:** {}\n",
        report.link_count(),
        report.orphan_count()
    );

    for map in &report.maps {
        let _ = writeln!(out, "## {}\n", map.title);
        if map.rows.is_empty() {
            let _ = writeln!(out, "_No {} found._\n", map.source_type.label().to_lowercase());
        } else {
            let _ = writeln!(
                out,
                "| {} | File | {} | Unresolved |\n|---|---|---|---|",
                map.source_type.label(),
                map.target.label()
            );
            for row in &map.rows {
                let _ = writeln!(
                    out,
                    "| `{}` | {} | {} | {} |",
                    row.source,
                    row.file.as_deref().unwrap_or("-"),
                    list(&row.resolved),
                    list(&row.unresolved)
                );
            }
            out.push('\n');
        }

        if !map.orphan_sources.is_empty() || !map.orphan_targets.is_empty() {
            out.push_str("### Orphans\n\n");
            if !map.orphan_sources.is_empty() {
                let _ = writeln!(
                    out,
                    "- {} without links: {}",
                    map.source_type.label(),
                    list(&map.orphan_sources)
                );
            }
            if !map.orphan_targets.is_empty() {
                let _ = writeln!(
                    out,
                    "- {} never referenced: {}",
                    map.target.label(),
                    list(&map.orphan_targets)
                );
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::fixtures::*;
    use crate::trace::TraceabilityBuilder;

    #[test]
    fn test_render_sections() {
        let surfaces = vec![route("/users", &["UserList"], &[]), component("UserList"), component("Footer")];
        let markdown = render_markdown(&TraceabilityBuilder::new().build(&surfaces));

        assert!(markdown.contains("## Routes → Components"));
        assert!(markdown.contains("| `/users` | src/routes.tsx | `UserList` | - |"));
        assert!(markdown.contains("- Components never referenced: `Footer`"));
        assert!(markdown.contains("_No middleware found._"));
    }
}
