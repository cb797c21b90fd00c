//! Page shell shared by every page: head, navigation bar, main container.

use crate::registry::{Page, PageRegistry};

pub const SITE_TITLE: &str = "India Air Quality Analysis";

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Navigation bar listing registered pages in registration order.
pub fn nav_html(registry: &PageRegistry, active: Page) -> String {
    let links: String = registry
        .pages()
        .into_iter()
        .map(|p| {
            format!(
                r#"<a href="/{}" class="nav-link{}">{}</a>"#,
                p.slug(),
                if p == active { " active" } else { "" },
                html_escape(p.title())
            )
        })
        .collect();
    format!(
        r#"<nav class="sidebar">
    <div class="sidebar-title">{}</div>
    <div class="nav-links">{}</div>
</nav>"#,
        SITE_TITLE, links
    )
}

pub fn page_shell(registry: &PageRegistry, active: Page, subtitle: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} — {site}</title>
    <link rel="stylesheet" href="/static/css/main.css">
</head>
<body>
<div class="app-container">
{nav}
<main class="main-content">
    <div class="page-header">
        <h1 class="page-title">{title}</h1>
        <p class="text-muted">{subtitle}</p>
    </div>
{body}
</main>
</div>
</body>
</html>"#,
        title = html_escape(active.title()),
        site = SITE_TITLE,
        nav = nav_html(registry, active),
        subtitle = html_escape(subtitle),
        body = body,
    )
}

pub fn card(title: &str, inner: &str) -> String {
    format!(
        r#"<div class="card"><div class="card-header">{}</div><div class="card-body">{}</div></div>"#,
        html_escape(title),
        inner
    )
}

pub fn warning(msg: &str) -> String {
    format!(r#"<div class="alert alert-warning">{}</div>"#, html_escape(msg))
}

pub fn error_card(msg: &str) -> String {
    format!(r#"<div class="alert alert-error">{}</div>"#, html_escape(msg))
}

pub fn placeholder(msg: &str) -> String {
    format!(r#"<p class="placeholder text-muted">{}</p>"#, html_escape(msg))
}

pub fn metric(label: &str, value: impl std::fmt::Display) -> String {
    format!(
        r#"<div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">{}</div></div>"#,
        value,
        html_escape(label)
    )
}

/// Plain HTML table; cells are escaped here.
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let head: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    let body: String = rows
        .iter()
        .map(|r| {
            let cells: String = r.iter().map(|c| format!("<td>{}</td>", html_escape(c))).collect();
            format!("<tr>{}</tr>", cells)
        })
        .collect();
    format!(
        r#"<div class="table-container"><table class="table"><thead><tr>{}</tr></thead><tbody>{}</tbody></table></div>"#,
        head, body
    )
}
