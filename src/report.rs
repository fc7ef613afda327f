//! Markdown rendering of a finished documentation job.

use crate::pipeline::Documentation;
use std::collections::HashSet;

/// Render the job as one Markdown document: a title header, then one
/// `## METHOD path` section per endpoint in document order.
///
/// Repeated `(method, path)` pairs share a summary and are rendered once.
pub fn render_markdown(doc: &Documentation) -> String {
    let info = &doc.schema_info;
    let mut out = String::new();

    let title = info.title.as_deref().unwrap_or("API Documentation");
    out.push_str(&format!("# {title}\n\n"));
    if let Some(version) = &info.version {
        out.push_str(&format!("**Version:** {version}  \n"));
    }
    if let Some(base_url) = &info.base_url {
        out.push_str(&format!("**Base URL:** `{base_url}`  \n"));
    }
    out.push_str(&format!(
        "**Endpoints:** {} ({} failed)\n\n",
        doc.summaries.len(),
        doc.failed.len()
    ));

    let mut seen = HashSet::new();
    for endpoint in &doc.endpoints {
        let key = endpoint.key();
        if !seen.insert(key.clone()) {
            continue;
        }
        out.push_str(&format!("---\n\n## {key}\n\n"));
        match doc.summaries.get(&key) {
            Some(summary) => out.push_str(summary.trim_end()),
            None => out.push_str("_No summary generated._"),
        }
        out.push_str("\n\n");
    }
    out
}
