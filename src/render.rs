//! HTML rendering of the whole notebook.
//!
//! The notebook is a single self-contained document laid out for print:
//!
//! ```text
//! ┌ title page      logo + title
//! ├ contents        fixed prefix + one item per month, one child per entry
//! ├ home            sections lifted from the project's index.html
//! └ months          one section per month, one article per entry
//! ```
//!
//! A `<base href>` pointing from the output directory back at the project
//! root keeps every embedded href root-relative, so the document opens
//! correctly from wherever it was written.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Element HTML produced by the rich-text renderer and the home extractor is
//! already escaped and is inserted with `PreEscaped`; everything else is
//! escaped by maud.

use crate::config::{ThemeConfig, generate_theme_css};
use crate::elements::{ElementView, ImageItem, PdfItem, ScriptItem, VideoItem};
use crate::entry::Entry;
use crate::notebook::{Month, TocNode};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS_STATIC: &str = include_str!("../static/notebook.css");

/// Everything the document template needs.
pub struct NotebookDocument<'a> {
    pub title: &'a str,
    pub base_href: &'a str,
    pub logo_href: &'a str,
    pub home_html: &'a str,
    pub months: &'a [Month],
    pub toc: &'a [TocNode],
    pub theme: &'a ThemeConfig,
}

/// Render the full notebook to an HTML string.
pub fn render_notebook(doc: &NotebookDocument<'_>) -> String {
    let css = format!("{}\n\n{}", generate_theme_css(doc.theme), CSS_STATIC);
    let content = html! {
        (title_page(doc.title, doc.logo_href))
        (table_of_contents(doc.toc))
        section.page.home id="home" {
            (PreEscaped(doc.home_html))
        }
        @for month in doc.months {
            (render_month(month))
        }
    };
    base_document(doc.title, doc.base_href, &css, content).into_string()
}

// ============================================================================
// Document frame
// ============================================================================

fn base_document(title: &str, base_href: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                base href=(base_href);
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

fn title_page(title: &str, logo_href: &str) -> Markup {
    html! {
        section.page.title-page id="title-page" {
            @if !logo_href.is_empty() {
                img.logo src=(logo_href) alt="Logo";
            }
            h1 { (title) }
        }
    }
}

fn table_of_contents(toc: &[TocNode]) -> Markup {
    html! {
        section.page.toc id="table-of-contents" {
            h2 { "Table of Contents" }
            ol {
                @for node in toc {
                    li class=[(!node.children.is_empty()).then_some("toc-month")] {
                        a href={ "#" (node.anchor) } { (node.title) }
                        @if !node.children.is_empty() {
                            ol {
                                @for child in &node.children {
                                    li { a href={ "#" (child.anchor) } { (child.title) } }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Months and entries
// ============================================================================

fn render_month(month: &Month) -> Markup {
    html! {
        section.month id=(month.anchor) {
            h2.month-header { (month.name) }
            @for entry in &month.entries {
                (render_entry(entry))
            }
        }
    }
}

fn render_entry(entry: &Entry) -> Markup {
    let meta: Vec<&str> = [entry.date.as_str(), entry.entry_type.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    html! {
        article.entry id=(entry.anchor) {
            header.entry-header {
                h3 { (entry.title) }
                @if !meta.is_empty() {
                    p.entry-meta { (meta.join(" · ")) }
                }
            }
            @if !entry.brief.is_empty() {
                ul.entry-brief {
                    @for line in &entry.brief {
                        li { (line) }
                    }
                }
            }
            @for element in &entry.elements {
                (render_element(element))
            }
        }
    }
}

/// Render one element with the template its view selects.
pub fn render_element(element: &ElementView) -> Markup {
    let body = match element {
        ElementView::Text { html, .. } => html! { (PreEscaped(html)) },
        ElementView::Images { items, .. } => render_images(items),
        ElementView::Script { items, .. } => render_scripts(items),
        ElementView::Pdf { items, .. } => render_pdfs(items),
        ElementView::Video { items, .. } => render_videos(items),
        ElementView::Unknown { .. } => html! {
            p.unknown-element { "Unsupported element" }
        },
    };
    html! {
        section class={ "element element-" (element.template()) } {
            h4 { (element.title()) }
            (body)
        }
    }
}

fn render_images(items: &[ImageItem]) -> Markup {
    html! {
        div.image-grid {
            @for item in items {
                figure {
                    img src=(item.src) alt=(item.alt);
                    figcaption {
                        strong { (item.label) }
                        @if !item.description.is_empty() {
                            (PreEscaped(&item.description))
                        }
                    }
                }
            }
        }
    }
}

fn render_scripts(items: &[ScriptItem]) -> Markup {
    html! {
        @for item in items {
            div.script-item {
                div.script-label { (item.label) }
                pre {
                    code class=[(!item.language.is_empty()).then(|| format!("language-{}", item.language))] {
                        (item.code)
                    }
                }
            }
        }
    }
}

fn render_pdfs(items: &[PdfItem]) -> Markup {
    html! {
        ul.pdf-list {
            @for item in items {
                li {
                    a href=(item.src) { (item.label) }
                    @if !item.filename.is_empty() {
                        " " span.pdf-filename { "(" (item.filename) ")" }
                    }
                }
            }
        }
    }
}

fn render_videos(items: &[VideoItem]) -> Markup {
    html! {
        ul.video-list {
            @for item in items {
                li {
                    a href=(item.src) { (item.label) }
                    video src=(item.src) controls preload="metadata" {}
                }
            }
        }
    }
}
