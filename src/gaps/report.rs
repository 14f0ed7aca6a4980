use super::GapReport;
use std::fmt::Write as _;

pub fn render_markdown(report: &GapReport) -> String {
    let mut out = String::from("# Gap Report\n\n");
    if report.is_empty() {
        out.push_str("No gaps found.\n");
        return out;
    }

    let _ = writeln!(out, "**Total gaps:** {}\n", report.len());
    for (category, entries) in report.by_category() {
        let _ = writeln!(out, "## {} ({})\n", category.label(), entries.len());
        out.push_str("| Description | File | Recommended action |\n|---|---|---|\n");
        for entry in entries {
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                escape(&entry.description),
                entry.file.as_deref().map(escape).unwrap_or_default(),
                escape(&entry.recommended_action)
            );
        }
        out.push('\n');
    }
    out
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}
