//! Server-rendered HTML.
//!
//! Every value interpolated into markup goes through [`escape`]. Styling and
//! behaviour live in `static/app.css` and `static/app.js`.

use std::fmt::Write as _;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use pidview_core::listing::strip_extension;
use pidview_core::{AppError, Comparison, Extraction, FileEntry, Folder, SortKey};

use crate::auth::SessionUser;
use crate::error::{log_error, HttpAppError};

/// Escape text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_date(created: Option<DateTime<Utc>>) -> String {
    created
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}

pub fn layout(title: &str, user: Option<&SessionUser>, body: &str) -> String {
    let account = match user {
        Some(user) => format!(
            r#"<span class="user">{}</span><form method="post" action="/api/auth/signout"><button class="btn btn-secondary" type="submit">Sign out</button></form>"#,
            escape(user.display_name())
        ),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | P&amp;ID Compare</title>
<link rel="stylesheet" href="/static/app.css">
<script src="/static/app.js" defer></script>
</head>
<body>
<header class="topbar"><a class="brand" href="/">P&amp;ID Compare</a><div class="account">{account}</div></header>
<main class="container">
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    )
}

fn page_header(title: &str, back: Option<(&str, &str)>, actions: &str) -> String {
    let back = back
        .map(|(href, label)| {
            format!(
                r#"<a class="back" href="{}">&larr; {}</a>"#,
                escape(href),
                escape(label)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="flex-between page-header"><div class="heading">{back}<h1 class="title">{}</h1></div><div class="actions">{actions}</div></div>"#,
        escape(title)
    )
}

/// Search box and sort selector. Submits as a plain GET form.
pub fn listing_controls(action: &str, query: &str, sort: SortKey) -> String {
    let mut options = String::new();
    for key in SortKey::ALL {
        let selected = if key == sort { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{}"{}>{}</option>"#,
            key.as_str(),
            selected,
            key.label()
        );
    }
    format!(
        r#"<form class="search-bar" method="get" action="{}"><input type="search" name="q" value="{}" placeholder="Search..." autocomplete="off"><select name="sort">{}</select><button class="btn btn-secondary" type="submit">Apply</button></form>"#,
        escape(action),
        escape(query),
        options
    )
}

fn error_banner(message: &str) -> String {
    format!(
        r#"<div class="card card-error"><h3>Error</h3><p>{}</p></div>"#,
        escape(message)
    )
}

fn empty_card(message: &str) -> String {
    format!(r#"<div class="card"><p>{}</p></div>"#, escape(message))
}

fn summary(shown: usize, total: usize) -> String {
    if shown == total {
        format!(r#"<p class="muted">{} item(s)</p>"#, total)
    } else {
        format!(r#"<p class="muted">Showing {} of {}</p>"#, shown, total)
    }
}

fn trigger_button(folder: Option<(&str, &str)>) -> String {
    let (id, name) = folder.unwrap_or(("", ""));
    format!(
        r#"<button class="btn" type="button" data-trigger data-folder-id="{}" data-folder-name="{}">Run analysis</button><span class="trigger-status" aria-live="polite"></span>"#,
        escape(id),
        escape(name)
    )
}

pub struct Listing<'a, T> {
    pub items: &'a [T],
    pub total: usize,
    pub query: &'a str,
    pub sort: SortKey,
}

pub fn archive_page(user: &SessionUser, listing: Listing<'_, Folder>) -> String {
    let actions = format!(
        r#"<a class="btn" href="/upload">New comparison</a>{}"#,
        trigger_button(None)
    );
    let mut body = page_header("P&ID Archive", None, &actions);
    body.push_str(&listing_controls("/", listing.query, listing.sort));

    if listing.total == 0 {
        body.push_str(&empty_card("No plants found."));
    } else {
        body.push_str(&summary(listing.items.len(), listing.total));
        body.push_str(r#"<div class="grid">"#);
        for folder in listing.items {
            let (badge, label) = if folder.is_critical() {
                ("status-critical", "critical")
            } else {
                ("status-safe", "safe")
            };
            let _ = write!(
                body,
                r#"<a class="card-link" href="/plant/{}"><div class="card"><div class="flex-between"><span class="badge {}">{}</span><span class="muted">{}</span></div><h3>{}</h3></div></a>"#,
                escape(&folder.id),
                badge,
                label,
                format_date(folder.created_time),
                escape(strip_extension(&folder.name)),
            );
        }
        body.push_str("</div>");
    }
    layout("Archive", Some(user), &body)
}

pub fn plant_page(user: &SessionUser, plant_id: &str, listing: Listing<'_, Folder>) -> String {
    let mut body = page_header(
        "Select Document System",
        Some(("/", "Archive")),
        &trigger_button(Some((plant_id, ""))),
    );
    body.push_str(&listing_controls(
        &format!("/plant/{}", plant_id),
        listing.query,
        listing.sort,
    ));

    if listing.total == 0 {
        body.push_str(&empty_card("No document folders found."));
    } else {
        body.push_str(&summary(listing.items.len(), listing.total));
        body.push_str(r#"<div class="grid">"#);
        for folder in listing.items {
            let _ = write!(
                body,
                r#"<a class="card-link" href="/system/{}"><div class="card"><h3>{}</h3><p class="muted">{}</p><div class="muted">View comparisons &rarr;</div></div></a>"#,
                escape(&folder.id),
                escape(&folder.name),
                format_date(folder.created_time),
            );
        }
        body.push_str("</div>");
    }
    layout("Systems", Some(user), &body)
}

fn comparison_card(comparison: &Comparison) -> String {
    let rev_a = comparison.rev_a.as_deref().unwrap_or("?");
    let rev_b = comparison.rev_b.as_deref().unwrap_or("?");
    let report = if comparison.report.is_some() {
        r#"<span class="badge status-safe">report</span>"#
    } else {
        ""
    };
    let inner = format!(
        r#"<div class="card"><div class="flex-between"><h3>{} &harr; {}</h3>{}</div><div class="strong">{}</div><div class="muted">{}</div><div class="muted">{}</div></div>"#,
        escape(rev_a),
        escape(rev_b),
        report,
        escape(&comparison.name),
        format_date(comparison.created_time),
        if comparison.is_ready() {
            "Ready to view"
        } else {
            "Missing PDFs"
        },
    );
    if comparison.is_ready() {
        format!(
            r#"<a class="card-link" href="/comparison/{}">{}</a>"#,
            escape(&comparison.id),
            inner
        )
    } else {
        format!(r#"<div class="card-link disabled" aria-disabled="true">{}</div>"#, inner)
    }
}

pub fn system_page(user: &SessionUser, system_id: &str, listing: Listing<'_, Comparison>) -> String {
    let mut body = page_header(
        "Select Comparison",
        Some(("/", "Back to root")),
        &trigger_button(Some((system_id, ""))),
    );
    body.push_str(&listing_controls(
        &format!("/system/{}", system_id),
        listing.query,
        listing.sort,
    ));

    if listing.total == 0 {
        body.push_str(&empty_card("No valid comparisons found in this system."));
    } else {
        body.push_str(&summary(listing.items.len(), listing.total));
        body.push_str(r#"<div class="grid">"#);
        for comparison in listing.items {
            body.push_str(&comparison_card(comparison));
        }
        body.push_str("</div>");
    }
    layout("Comparisons", Some(user), &body)
}

pub struct ComparisonView<'a> {
    pub folder_id: &'a str,
    pub pdfs: &'a [FileEntry],
    pub selected: usize,
    pub report: Option<&'a Extraction>,
}

pub fn comparison_page(user: &SessionUser, view: ComparisonView<'_>) -> String {
    let mut body = page_header("Comparison Review", Some(("/", "Archive")), "");
    body.push_str(r#"<div class="split">"#);

    body.push_str(r#"<section class="pane"><div class="pane-title">Audit report</div>"#);
    match view.report {
        Some(report) => {
            if report.is_fallback() {
                body.push_str(
                    r#"<div class="notice">The report could not be parsed and is shown as received.</div>"#,
                );
            }
            // No allow-same-origin: report scripts cannot reach the dashboard origin.
            let _ = write!(
                body,
                r#"<iframe class="report" title="Audit report" sandbox="allow-scripts" srcdoc="{}"></iframe>"#,
                escape(report.html())
            );
        }
        None => body.push_str(r#"<div class="placeholder">No report in this folder.</div>"#),
    }
    body.push_str("</section>");

    body.push_str(r#"<section class="pane"><nav class="pane-title tabs">"#);
    for (index, pdf) in view.pdfs.iter().enumerate() {
        let class = if index == view.selected { "tab active" } else { "tab" };
        let _ = write!(
            body,
            r#"<a class="{}" href="/comparison/{}?pdf={}">{}</a>"#,
            class,
            escape(view.folder_id),
            index,
            escape(&pdf.name)
        );
    }
    body.push_str("</nav>");
    match view.pdfs.get(view.selected) {
        Some(pdf) => {
            let _ = write!(
                body,
                r#"<iframe class="pdf" title="PDF viewer" src="/api/file/{}"></iframe>"#,
                escape(&pdf.id)
            );
        }
        None => body.push_str(r#"<div class="placeholder">No PDF selected</div>"#),
    }
    body.push_str("</section></div>");

    layout("Comparison", Some(user), &body)
}

pub fn upload_page(user: &SessionUser) -> String {
    let body = format!(
        r#"{}
<div class="card upload-card">
<form id="upload-form" method="post" action="/api/upload" enctype="multipart/form-data">
<p>Select the old and the new revision of the drawing (exactly two PDF files).</p>
<input type="file" name="files" accept="application/pdf,.pdf" multiple required>
<button class="btn" type="submit">Upload and analyse</button>
</form>
<div id="upload-status" class="muted" aria-live="polite"></div>
<div class="progress" hidden><div class="progress-bar" style="width: 0%"></div></div>
</div>"#,
        page_header("New comparison", Some(("/", "Archive")), "")
    );
    layout("Upload", Some(user), &body)
}

/// Render a page that failed to load its data. The details go to the log,
/// the browser only gets a generic banner.
pub fn failure_page(title: &str, user: &SessionUser, message: &str, err: HttpAppError) -> Response {
    let app_error = &err.0;
    log_error(app_error);
    let status = match app_error {
        AppError::InvalidInput(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    let body = format!(
        r#"{}{}<a class="btn btn-secondary" href="/">Back to archive</a>"#,
        page_header(title, None, ""),
        error_banner(message)
    );
    (status, Html(layout(title, Some(user), &body))).into_response()
}
