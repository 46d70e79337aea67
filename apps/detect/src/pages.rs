//! # Pages
//!
//! Server-rendered HTML for the landing page and the configuration form.
//!
//! Every page shares the same layout: a navbar (Home, Configuration), a
//! centered card and a footer, colored with the configured theme.

use crate::config::APP_TITLE;
use crate::form::FormField;
use detect_core::{Criteria, Evaluation, Requirement, Selection};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use pulldown_cmark::{Options, Parser, html};

/// Shown when the documentation file cannot be read.
pub const FALLBACK_DOCS: &str =
    "# Documentation\n\nDocumentation file not found. Please create `README_web.md`.";

pub const FORM_SUBTITLE: &str = "Select your configuration options from the dropdowns below. \
Based on your selection, the system size will be calculated and the appropriate requirements \
and criteria will be generated.";

// =============================================================================
// LAYOUT
// =============================================================================

/// Render markdown to HTML (tables and strikethrough enabled).
#[must_use]
pub fn markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Wrap page content in the shared document shell.
#[must_use]
pub fn layout(theme: &str, content: &str) -> String {
    let theme = attr(theme);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{APP_TITLE}</title>
<style>
:root {{ --theme: {theme}; }}
body {{ margin: 0; font-family: system-ui, sans-serif; background: #f9fafb; color: #1f2937; }}
header {{ background: var(--theme); color: #fff; }}
header nav {{ max-width: 56rem; margin: 0 auto; padding: 0.75rem 1rem; display: flex; gap: 1rem; align-items: center; }}
header a {{ color: #fff; font-weight: 700; text-decoration: none; }}
header a:hover {{ text-decoration: underline; }}
.brand {{ font-size: 1.5rem; font-weight: 700; margin-right: 1rem; }}
main {{ display: flex; justify-content: center; padding: 2rem 1rem; }}
.card {{ width: 100%; max-width: 56rem; background: #fff; border-radius: 1rem; box-shadow: 0 10px 25px rgba(0,0,0,.1); padding: 2.5rem; }}
.prose h1 {{ font-size: 1.5rem; }} .prose h2 {{ font-size: 1.25rem; }} .prose h3 {{ font-size: 1.125rem; }}
.field {{ margin-bottom: 1.5rem; }} .field label {{ display: block; font-size: 1.125rem; font-weight: 600; }}
.field .description {{ font-size: 0.875rem; color: #4b5563; }}
.field select {{ width: 100%; padding: 0.5rem; }}
.half {{ max-width: 50%; }}
.button {{ display: inline-block; padding: 0.75rem 2rem; border: 0; border-radius: 0.5rem; color: #fff; background: var(--theme); font-size: 1rem; cursor: pointer; text-decoration: none; }}
.button.process {{ background: #16a34a; }}
.status {{ padding: 1rem; border-left: 4px solid; border-radius: 0.25rem; margin: 1rem 0; }}
.status.warning {{ background: #fef9c3; border-color: #eab308; }}
.status.error {{ background: #fee2e2; border-color: #ef4444; }}
.status.success {{ background: #dcfce7; border-color: #22c55e; }}
table {{ width: 100%; border-collapse: collapse; margin-bottom: 1.5rem; }}
th, td {{ text-align: left; padding: 0.5rem; border-bottom: 1px solid #e5e7eb; vertical-align: top; white-space: normal; overflow-wrap: anywhere; }}
td.value {{ text-align: center; }}
footer {{ text-align: center; font-size: 0.875rem; color: #4b5563; border-top: 1px solid #e5e7eb; margin-top: 1.5rem; padding-top: 0.5rem; }}
</style>
</head>
<body>
{navbar}
<main><div class="card">
{content}
{footer}
</div></main>
</body>
</html>
"#,
        navbar = navbar(),
        footer = footer(),
    )
}

fn navbar() -> String {
    format!(
        r#"<header><nav><span class="brand">{APP_TITLE}</span><a href="/">Home</a><a href="/tool">Configuration</a></nav></header>"#
    )
}

fn footer() -> String {
    format!("<footer><p>{APP_TITLE} system size classifier</p></footer>")
}

// =============================================================================
// LANDING PAGE
// =============================================================================

/// The documentation page with a link into the form.
#[must_use]
pub fn landing_page(theme: &str, docs: &str) -> String {
    let content = format!(
        r#"<article class="prose">{}</article>
<hr>
<p style="text-align:center"><a class="button" href="/tool">Start Configuration</a></p>"#,
        markdown(docs)
    );
    layout(theme, &content)
}

// =============================================================================
// CONFIGURATION PAGE
// =============================================================================

/// Outcome of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Fields still at the placeholder option, by display name.
    Placeholder(Vec<String>),
    /// The calculation failed with this message.
    Failed(String),
    /// The calculation succeeded with this size label.
    Sized(String),
    /// The size was computed but filtering the records failed.
    ProcessFailed(String),
}

impl Status {
    fn render(&self) -> String {
        match self {
            Self::Placeholder(fields) => {
                let items: String = fields
                    .iter()
                    .map(|f| format!("<li>{}</li>", text(f)))
                    .collect();
                format!(
                    "<div class=\"status warning\"><strong>Error:</strong> The following fields are still set to 'TBD':<ul>{items}</ul></div>"
                )
            }
            Self::Failed(message) => format!(
                "<div class=\"status error\"><strong>\u{2717} Error calculating system size:</strong> {}</div>",
                text(message)
            ),
            Self::Sized(size) => format!(
                "<div class=\"status success\"><strong>\u{2713} System Size:</strong> {}</div>",
                text(size)
            ),
            Self::ProcessFailed(message) => format!(
                "<div class=\"status error\"><strong>Error processing requirements and criteria:</strong> {}</div>",
                text(message)
            ),
        }
    }
}

/// Everything the configuration page shows.
#[derive(Debug, Clone, Copy)]
pub struct ToolView<'a> {
    pub fields: &'a [FormField],
    pub selection: &'a Selection,
    pub status: Option<&'a Status>,
    /// Present once the user asked to process with the computed size.
    pub evaluation: Option<&'a Evaluation>,
}

/// The configuration form, its status message and the result tables.
#[must_use]
pub fn tool_page(theme: &str, view: ToolView<'_>) -> String {
    let mut content = format!("<p class=\"description\">{}</p>\n", text(FORM_SUBTITLE));
    content.push_str("<form method=\"post\" action=\"/tool\">\n");
    for field in view.fields {
        content.push_str(&select_field(field, view.selection));
    }
    content.push_str("<hr>\n");
    if let Some(status) = view.status {
        content.push_str(&status.render());
    }
    content.push_str(
        "<p><button class=\"button\" type=\"submit\" name=\"step\" value=\"submit\">Submit Configuration</button>",
    );
    if matches!(view.status, Some(Status::Sized(_) | Status::ProcessFailed(_))) {
        content.push_str(
            " <button class=\"button process\" type=\"submit\" name=\"step\" value=\"process\">Process with System Size</button>",
        );
    }
    content.push_str("</p>\n</form>\n");

    if let Some(evaluation) = view.evaluation {
        content.push_str(&results(evaluation, view.selection));
    }
    layout(theme, &content)
}

fn select_field(field: &FormField, selection: &Selection) -> String {
    let selected = selection
        .get(&field.name)
        .map(String::as_str)
        .or_else(|| field.initial());
    let options: String = field
        .options
        .iter()
        .map(|option| {
            let mark = if Some(option.as_str()) == selected {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{}\"{mark}>{}</option>",
                attr(option),
                text(option)
            )
        })
        .collect();
    let width = if field.full_width { "field" } else { "field half" };
    format!(
        "<div class=\"{width}\" data-icon=\"{icon}\">\n<label for=\"{id}\">{label}</label>\n<div class=\"description\">{description}</div>\n<select id=\"{id}\" name=\"{id}\" title=\"{placeholder}\">{options}</select>\n</div>\n",
        icon = field.icon,
        id = attr(&field.name),
        label = text(&field.label),
        description = markdown(&field.description),
        placeholder = attr(&field.placeholder),
    )
}

fn results(evaluation: &Evaluation, selection: &Selection) -> String {
    let query = download_query(selection);
    format!(
        r#"<section class="results">
<p><a class="button" href="/download/requirements.csv?{query}">Download Requirements CSV</a> <a class="button" href="/download/criteria.csv?{query}">Download Criteria CSV</a></p>
<h2>Requirements</h2>
{requirements}
<h2>Criteria</h2>
{criteria}
</section>
"#,
        query = attr(&query),
        requirements = requirements_table(&evaluation.requirements),
        criteria = criteria_table(&evaluation.criteria),
    )
}

/// The selection as a URL query string.
#[must_use]
pub fn download_query(selection: &Selection) -> String {
    selection
        .iter()
        .map(|(field, label)| {
            format!(
                "{}={}",
                urlencoding::encode(field),
                urlencoding::encode(label)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[must_use]
pub fn requirements_table(records: &[Requirement]) -> String {
    let rows: String = records
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td class=\"value\">{}</td><td>{}</td></tr>",
                text(&r.id),
                r.value,
                text(&r.description)
            )
        })
        .collect();
    format!(
        "<table class=\"requirements\"><thead><tr><th style=\"width:15%\">ID</th><th style=\"width:10%\">Value</th><th>Description</th></tr></thead><tbody>{rows}</tbody></table>"
    )
}

#[must_use]
pub fn criteria_table(records: &[Criteria]) -> String {
    let rows: String = records
        .iter()
        .map(|c| {
            format!(
                "<tr><td>{}</td><td class=\"value\">{}</td><td>{}</td><td>{}</td></tr>",
                text(&c.id),
                c.value,
                text(&c.criteria),
                text(&c.context)
            )
        })
        .collect();
    format!(
        "<table class=\"criteria\"><thead><tr><th style=\"width:15%\">ID</th><th style=\"width:10%\">Value</th><th style=\"width:40%\">Criteria</th><th>Context</th></tr></thead><tbody>{rows}</tbody></table>"
    )
}

// =============================================================================
// TESTS
// =============================================================================
