// src/web/page.rs
//! Server-rendered HTML for the upload form and the dashboard.

use rocket::http::RawStr;
use std::fmt::Write;

use crate::error::DashboardError;
use crate::panels::{Panel, PanelBody};
use crate::session::{DashboardSession, EXPORT_FILE_NAME};
use crate::template_processor::TemplateProcessor;
use crate::utils::{escape_html, format_probability};

const UPLOAD_TITLE: &str = "Spot the Scam";
const DASHBOARD_TITLE: &str = "Spot the Scam - Results";

fn upload_form() -> &'static str {
    r#"<form class="upload" action="/dashboard" method="post" enctype="multipart/form-data">
<label for="csv_file">Upload a job postings CSV</label>
<input type="file" id="csv_file" name="csv_file" accept=".csv,text/csv" required>
<button type="submit">Analyze</button>
</form>
"#
}

fn error_banner(error: &DashboardError) -> String {
    let mut html = format!(
        "<div class=\"error-banner\" role=\"alert\" data-code=\"{}\"><strong>{}</strong><ul>",
        error.error_code(),
        escape_html(&error.to_string())
    );
    for suggestion in error.suggestions() {
        let _ = write!(html, "<li>{}</li>", escape_html(&suggestion));
    }
    html.push_str("</ul></div>\n");
    html
}

pub fn upload_page(error: Option<&DashboardError>) -> String {
    let mut content = String::new();
    if let Some(error) = error {
        content.push_str(&error_banner(error));
    }
    content.push_str(upload_form());
    TemplateProcessor::render_page(UPLOAD_TITLE, &content)
}

/// Plain error page for failures that never reached the pipeline.
pub fn status_page(heading: &str, message: &str) -> String {
    let content = format!(
        "<div class=\"error-banner\" role=\"alert\"><strong>{}</strong><p>{}</p></div>\n{}",
        escape_html(heading),
        escape_html(message),
        upload_form()
    );
    TemplateProcessor::render_page(UPLOAD_TITLE, &content)
}

pub fn dashboard_page(session: &DashboardSession, panels: &[Panel], export_csv: &str) -> String {
    let mut content = String::new();
    content.push_str(upload_form());

    let _ = write!(
        content,
        "<p class=\"meta\">{} &middot; {} rows &middot; {} predicted fraudulent &middot; model {}</p>\n",
        escape_html(&session.file_name),
        session.row_count(),
        session.fraud_count(),
        escape_html(&session.model_name)
    );

    content.push_str("<h2>Fraud Prediction Results</h2>\n");
    content.push_str(&results_table(session));
    let _ = write!(
        content,
        "<p><a class=\"download\" download=\"{name}\" href=\"data:text/csv;charset=utf-8,{data}\">&#128229; Download Full Results as CSV</a></p>\n",
        name = EXPORT_FILE_NAME,
        data = escape_html(RawStr::new(export_csv).percent_encode().as_str()),
    );

    content.push_str("<h2>&#128269; Visual Insights</h2>\n<div class=\"panels\">\n");
    for panel in panels {
        content.push_str(&panel_section(panel));
    }
    content.push_str("</div>\n");

    TemplateProcessor::render_page(DASHBOARD_TITLE, &content)
}

fn results_table(session: &DashboardSession) -> String {
    let mut html = String::from(
        "<div class=\"results\"><table id=\"results\">\n<thead><tr><th>title</th><th>fraud_probability</th><th>fraud_prediction</th></tr></thead>\n<tbody>\n",
    );
    for row in session.results() {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape_html(&row.title),
            format_probability(row.fraud_probability),
            row.fraud_prediction
        );
    }
    html.push_str("</tbody></table></div>\n");
    html
}

fn panel_section(panel: &Panel) -> String {
    let body = match &panel.body {
        PanelBody::Chart { svg, .. } => format!(
            "<img alt=\"{}\" src=\"data:image/svg+xml;charset=utf-8,{}\">",
            escape_html(panel.heading),
            escape_html(RawStr::new(svg).percent_encode().as_str())
        ),
        PanelBody::Info { message } => format!("<p class=\"info\">{}</p>", escape_html(message)),
        PanelBody::Error { message } => {
            format!("<p class=\"panel-error\">{}</p>", escape_html(message))
        }
    };
    format!(
        "<section class=\"panel\" id=\"{}\">\n<h3>{}</h3>\n{}\n</section>\n",
        panel.id,
        escape_html(panel.heading),
        body
    )
}
