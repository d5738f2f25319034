//! Fixed prompt text
//!
//! Templates are static data. The only dynamic parts are the allowed-id
//! listing and the document itself.

use synth_attribution::{SourceMap, BREAKDOWN_TITLE};

/// Attribution rules embedded in the upstream synthesis prompt
pub const ATTRIBUTION_RULES_TEMPLATE: &str = "\
SOURCE ATTRIBUTION RULES
Every section (each `## ` heading) must end with exactly one line of the form:
Attribution: Primary=<ids>; Secondary=<ids>; Constraints=<ids>; UNK=<true|false>

- <ids> is a comma-separated list of the allowed source IDs below, or empty.
- Primary: sources that supplied the main content of the section.
- Secondary: sources that supplied supporting content.
- Constraints: sources that only supplied caveats or limitations.
- Set UNK=true when you are not certain which sources contributed.
- Use only these IDs, written exactly as shown:
{allowed_ids}
- Do not add a section titled \"{breakdown_heading}\"; it is generated separately.";

/// Instructions for the single corrective call
pub const REPAIR_PROMPT_TEMPLATE: &str = "\
The document below violates the source attribution format. Fix it.

Instructions:
1. Add or fix Attribution lines only. Do not alter any other content.
2. Each section (each `## ` heading, or `### ` if there are none) must end with one line:
   Attribution: Primary=<ids>; Secondary=<ids>; Constraints=<ids>; UNK=<true|false>
3. Use UNK=true when you are uncertain which sources contributed.
4. Use only the allowed IDs below, written exactly as shown:
{allowed_ids}
5. Do not add a section titled \"{breakdown_heading}\".
6. Return the complete corrected document and nothing else.

Document:
{document}";

/// One `- <id>: <name>` line per source, in map order
#[must_use]
pub fn format_allowed_ids(source_map: &SourceMap) -> String {
    if source_map.is_empty() {
        return "(no sources registered)".to_string();
    }

    source_map
        .iter()
        .map(|item| format!("- {}: {}", item.id, item.display_name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rules block for the upstream synthesis prompt
#[must_use]
pub fn attribution_rules(source_map: &SourceMap) -> String {
    let allowed_ids = format_allowed_ids(source_map);
    fill_template(
        ATTRIBUTION_RULES_TEMPLATE,
        &[
            ("{allowed_ids}", allowed_ids.as_str()),
            ("{breakdown_heading}", BREAKDOWN_TITLE),
        ],
    )
}

/// Prompt for the one repair call
#[must_use]
pub fn build_repair_prompt(document: &str, source_map: &SourceMap) -> String {
    let allowed_ids = format_allowed_ids(source_map);
    fill_template(
        REPAIR_PROMPT_TEMPLATE,
        &[
            ("{allowed_ids}", allowed_ids.as_str()),
            ("{breakdown_heading}", BREAKDOWN_TITLE),
            ("{document}", document),
        ],
    )
}

/// Single pass over `template`; substituted values are never rescanned
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
