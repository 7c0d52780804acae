//! Element processing: raw page elements → renderable view models.
//!
//! Each page carries an ordered `elements` array. An element's `type` picks
//! one of a fixed set of kinds; the kind decides how the element's fields and
//! items are read and which template renders it.
//!
//! | `type` | View | Kept when empty |
//! |--------|------|-----------------|
//! | `synopsis`, `designbrief`, `notes` | [`ElementView::Text`] | yes |
//! | `image`, `images` | [`ElementView::Images`] | no |
//! | `script` | [`ElementView::Script`] | yes |
//! | `pdf` | [`ElementView::Pdf`] | no |
//! | `video` | [`ElementView::Video`] | no |
//! | anything else | [`ElementView::Unknown`] | yes |
//!
//! `type` matching ignores case and spaces (`"Design Brief"` is
//! `designbrief`). An element with no `type` at all is dropped.
//!
//! ## Items
//!
//! Multi-item kinds read an `items` array. Without one, the element's own
//! `src`/`label` form a single item, so these are equivalent:
//!
//! ```json
//! {"type": "images", "items": [{"src": "resources/a.png", "label": "Drive"}]}
//! {"type": "images", "src": "resources/a.png", "label": "Drive"}
//! ```

use crate::assets::AssetManager;
use crate::imaging::ImageBackend;
use crate::naming::{file_name, first_non_empty, first_text, is_truthy, opt_text};
use crate::resolve::{PageContext, ResolvedSrc, Resolver};
use crate::rich_text::{rich_text, rich_text_value};
use serde_json::{Map, Value};
use std::fs;

/// The known element kinds, parsed from an element's `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Synopsis,
    DesignBrief,
    Notes,
    Images,
    Script,
    Pdf,
    Video,
    Unrecognized,
}

impl ElementKind {
    /// `None` for a missing or empty type; [`ElementKind::Unrecognized`] for
    /// any other type this exporter has no template for.
    pub fn parse(value: Option<&Value>) -> Option<Self> {
        let normalized: String = opt_text(value)
            .to_lowercase()
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        let kind = match normalized.as_str() {
            "" => return None,
            "synopsis" => Self::Synopsis,
            "designbrief" => Self::DesignBrief,
            "notes" => Self::Notes,
            "image" | "images" => Self::Images,
            "script" => Self::Script,
            "pdf" => Self::Pdf,
            "video" => Self::Video,
            _ => Self::Unrecognized,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub label: String,
    pub alt: String,
    pub src: String,
    /// Rendered HTML, empty when the item has no description.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptItem {
    pub label: String,
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfItem {
    pub label: String,
    pub filename: String,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoItem {
    pub label: String,
    pub src: String,
}

/// A processed element, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementView {
    Text { title: String, html: String },
    Images { title: String, items: Vec<ImageItem> },
    Script { title: String, items: Vec<ScriptItem> },
    Pdf { title: String, items: Vec<PdfItem> },
    Video { title: String, items: Vec<VideoItem> },
    Unknown { title: String },
}

impl ElementView {
    /// Name of the template that renders this view.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Images { .. } => "images",
            Self::Script { .. } => "script",
            Self::Pdf { .. } => "pdf",
            Self::Video { .. } => "video",
            Self::Unknown { .. } => "unknown",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Text { title, .. }
            | Self::Images { title, .. }
            | Self::Script { title, .. }
            | Self::Pdf { title, .. }
            | Self::Video { title, .. }
            | Self::Unknown { title } => title,
        }
    }
}

/// The page an element belongs to, plus what's needed to resolve its paths.
pub struct PageScope<'a> {
    pub page: &'a Map<String, Value>,
    pub ctx: &'a PageContext,
    pub resolver: &'a Resolver,
}

impl PageScope<'_> {
    fn resolve(&self, src: Option<&Value>) -> ResolvedSrc {
        self.resolver.resolve_src(src, self.page, self.ctx)
    }
}

/// Known script extensions, checked against the end of the lowercased path.
const LANGUAGES: &[(&str, &str)] = &[
    (".py", "python"),
    (".js", "javascript"),
    (".mjs", "javascript"),
    (".cjs", "javascript"),
    (".ts", "typescript"),
    (".cpp", "cpp"),
    (".cc", "cpp"),
    (".cxx", "cpp"),
    (".c", "c"),
    (".java", "java"),
    (".json", "json"),
    (".md", "markdown"),
    (".html", "html"),
    (".css", "css"),
];

/// Display language for a script path, or `""` when the extension is unknown.
pub fn guess_lang(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(ext, _)| lower.ends_with(ext))
        .map(|(_, lang)| *lang)
        .unwrap_or("")
}

/// The element's `items` (objects only), or one synthetic item from its own
/// `src`/`label`, or nothing.
pub fn normalize_items(el: &Map<String, Value>) -> Vec<Map<String, Value>> {
    if let Some(Value::Array(items)) = el.get("items") {
        return items.iter().filter_map(|i| i.as_object().cloned()).collect();
    }
    match el.get("src") {
        Some(src) if is_truthy(src) => {
            let mut item = Map::new();
            item.insert("src".into(), src.clone());
            item.insert("label".into(), el.get("label").cloned().unwrap_or(Value::Null));
            vec![item]
        }
        _ => Vec::new(),
    }
}

fn text_or(values: &[Option<&Value>], default: &str) -> String {
    let text = first_text(values.iter().copied());
    if text.is_empty() { default.to_string() } else { text }
}

/// Turn one raw element into a view, or `None` when it should be dropped.
pub fn process_element<B: ImageBackend>(
    el: &Value,
    scope: &PageScope<'_>,
    assets: &mut AssetManager<B>,
) -> Option<ElementView> {
    let el = el.as_object()?;
    let kind = ElementKind::parse(el.get("type"))?;
    match kind {
        ElementKind::Synopsis => Some(synopsis(el)),
        ElementKind::DesignBrief => Some(design_brief(el)),
        ElementKind::Notes => Some(notes(el)),
        ElementKind::Images => images(el, scope, assets),
        ElementKind::Script => Some(script(el, scope)),
        ElementKind::Pdf => pdf(el, scope),
        ElementKind::Video => video(el, scope),
        ElementKind::Unrecognized => Some(ElementView::Unknown {
            title: text_or(&[el.get("title"), el.get("label")], "Unknown Element"),
        }),
    }
}

fn synopsis(el: &Map<String, Value>) -> ElementView {
    ElementView::Text {
        title: text_or(&[el.get("title")], "Synopsis"),
        html: rich_text(&first_text([el.get("content"), el.get("text")])),
    }
}

fn design_brief(el: &Map<String, Value>) -> ElementView {
    let html = match el.get("items") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| rich_text_value(Some(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => rich_text_value(el.get("content")),
    };
    ElementView::Text {
        title: text_or(&[el.get("title")], "Design Brief"),
        html,
    }
}

fn notes(el: &Map<String, Value>) -> ElementView {
    ElementView::Text {
        title: text_or(&[el.get("title"), el.get("label")], "Notes"),
        html: rich_text_value(el.get("content")),
    }
}

fn images<B: ImageBackend>(
    el: &Map<String, Value>,
    scope: &PageScope<'_>,
    assets: &mut AssetManager<B>,
) -> Option<ElementView> {
    let mut items = Vec::new();
    for item in normalize_items(el) {
        let resolved = scope.resolve(item.get("src"));
        if resolved.is_empty() {
            continue;
        }
        if let Some(path) = resolved.fs_path.as_deref()
            && !path.exists()
        {
            log::debug!("Dropping missing image {}", path.display());
            continue;
        }
        let src = match assets.prepare_image(&resolved) {
            Ok(href) if !href.is_empty() => href,
            Ok(_) => continue,
            Err(err) => {
                log::warn!("Dropping image {}: {}", resolved.href, err);
                continue;
            }
        };
        let alt = match first_text([item.get("alt"), item.get("label"), scope.page.get("title")]) {
            alt if alt.is_empty() => scope.ctx.id.clone(),
            alt => alt,
        };
        items.push(ImageItem {
            label: text_or(&[item.get("label")], "Image"),
            alt,
            src,
            description: rich_text_value(item.get("description")),
        });
    }
    if items.is_empty() {
        return None;
    }
    Some(ElementView::Images {
        title: text_or(&[el.get("title"), el.get("label")], "Images"),
        items,
    })
}

fn script(el: &Map<String, Value>, scope: &PageScope<'_>) -> ElementView {
    let items = normalize_items(el)
        .into_iter()
        .map(|item| {
            let src_text = opt_text(item.get("src"));
            let language = match opt_text(item.get("language")) {
                lang if lang.is_empty() => guess_lang(&src_text).to_string(),
                lang => lang,
            };
            let code = match item.get("code") {
                Some(Value::String(code)) => code.clone(),
                Some(code) if !code.is_null() => code.to_string(),
                _ => read_script(&scope.resolve(item.get("src")))
                    .unwrap_or_else(|| format!("// Missing script: {src_text}")),
            };
            let label = first_text([item.get("label")]);
            let label = first_non_empty([label.as_str(), language.as_str(), "Script"])
                .to_string();
            ScriptItem {
                label,
                language,
                code,
            }
        })
        .collect();
    ElementView::Script {
        title: text_or(&[el.get("title"), el.get("label")], "Script"),
        items,
    }
}

fn read_script(resolved: &ResolvedSrc) -> Option<String> {
    let path = resolved.fs_path.as_deref()?;
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            log::debug!("Script {} unreadable: {}", path.display(), err);
            None
        }
    }
}

fn pdf(el: &Map<String, Value>, scope: &PageScope<'_>) -> Option<ElementView> {
    let items: Vec<_> = normalize_items(el)
        .into_iter()
        .filter_map(|item| {
            let resolved = scope.resolve(item.get("src"));
            if resolved.is_empty() {
                return None;
            }
            Some(PdfItem {
                label: text_or(&[item.get("label")], "PDF"),
                filename: file_name(&opt_text(item.get("src"))).to_string(),
                src: resolved.href,
            })
        })
        .collect();
    (!items.is_empty()).then(|| ElementView::Pdf {
        title: text_or(&[el.get("title"), el.get("label")], "PDF"),
        items,
    })
}

fn video(el: &Map<String, Value>, scope: &PageScope<'_>) -> Option<ElementView> {
    let items: Vec<_> = normalize_items(el)
        .into_iter()
        .filter_map(|item| {
            let resolved = scope.resolve(item.get("src"));
            if resolved.is_empty() {
                return None;
            }
            Some(VideoItem {
                label: text_or(&[item.get("label")], "Video"),
                src: resolved.href,
            })
        })
        .collect();
    (!items.is_empty()).then(|| ElementView::Video {
        title: text_or(&[el.get("title"), el.get("label")], "Video"),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetSettings;
    use crate::imaging::backend::tests::MockBackend;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Harness {
        _tmp: TempDir,
        root: PathBuf,
        resolver: Resolver,
        assets: AssetManager<MockBackend>,
        page: Map<String, Value>,
        ctx: PageContext,
    }

    impl Harness {
        fn new(page: Value) -> Self {
            let tmp = TempDir::new().unwrap();
            let root = fs::canonicalize(tmp.path()).unwrap();
            fs::create_dir_all(root.join("resources/August")).unwrap();
            let assets = AssetManager::new(
                &root,
                &root.join("compilation/output"),
                MockBackend::new(),
                AssetSettings::default(),
            )
            .unwrap();
            Self {
                resolver: Resolver::new(&root),
                root,
                _tmp: tmp,
                assets,
                page: page.as_object().cloned().unwrap(),
                ctx: PageContext::new("August", "drive-v1"),
            }
        }

        fn process(&mut self, el: Value) -> Option<ElementView> {
            let scope = PageScope {
                page: &self.page,
                ctx: &self.ctx,
                resolver: &self.resolver,
            };
            process_element(&el, &scope, &mut self.assets)
        }
    }

    // =========================================================================
    // Kind parsing
    // =========================================================================

    #[test]
    fn kind_parse_ignores_case_and_spaces() {
        assert_eq!(
            ElementKind::parse(Some(&json!("Design Brief"))),
            Some(ElementKind::DesignBrief)
        );
        assert_eq!(ElementKind::parse(Some(&json!("IMAGE"))), Some(ElementKind::Images));
        assert_eq!(ElementKind::parse(Some(&json!("images"))), Some(ElementKind::Images));
    }

    #[test]
    fn kind_parse_absent_vs_unrecognized() {
        assert_eq!(ElementKind::parse(None), None);
        assert_eq!(ElementKind::parse(Some(&json!(""))), None);
        assert_eq!(ElementKind::parse(Some(&json!(null))), None);
        assert_eq!(
            ElementKind::parse(Some(&json!("gantt"))),
            Some(ElementKind::Unrecognized)
        );
    }

    #[test]
    fn guess_lang_table() {
        assert_eq!(guess_lang("resources/main.py"), "python");
        assert_eq!(guess_lang("a/B.CPP"), "cpp");
        assert_eq!(guess_lang("x.cjs"), "javascript");
        assert_eq!(guess_lang("x.c"), "c");
        assert_eq!(guess_lang("x.rs"), "");
        assert_eq!(guess_lang(""), "");
    }

    #[test]
    fn normalize_items_prefers_items_array() {
        let el = json!({"items": [{"src": "a"}, "bogus", {"src": "b"}], "src": "c"});
        let items = normalize_items(el.as_object().unwrap());
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["src"], json!("b"));
    }

    #[test]
    fn normalize_items_synthesizes_from_src() {
        let el = json!({"src": "a.png", "label": "A"});
        let items = normalize_items(el.as_object().unwrap());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["label"], json!("A"));

        let el = json!({"label": "no src"});
        assert!(normalize_items(el.as_object().unwrap()).is_empty());
    }

    // =========================================================================
    // Text-like kinds
    // =========================================================================

    #[test]
    fn synopsis_renders_rich_text() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "synopsis", "content": "Built **v1** drivetrain.\n\nNotes here."}))
            .unwrap();
        assert_eq!(
            view,
            ElementView::Text {
                title: "Synopsis".into(),
                html: "<p>Built <strong>v1</strong> drivetrain.</p>\n<p>Notes here.</p>".into(),
            }
        );
        assert_eq!(view.template(), "text");
    }

    #[test]
    fn synopsis_falls_back_to_text_field() {
        let mut h = Harness::new(json!({}));
        let view = h.process(json!({"type": "synopsis", "text": "hi"})).unwrap();
        assert!(matches!(view, ElementView::Text { html, .. } if html == "<p>hi</p>"));
    }

    #[test]
    fn empty_text_elements_are_kept() {
        let mut h = Harness::new(json!({}));
        for kind in ["synopsis", "designbrief", "notes"] {
            let view = h.process(json!({"type": kind})).unwrap();
            assert!(matches!(view, ElementView::Text { html, .. } if html.is_empty()));
        }
    }

    #[test]
    fn design_brief_joins_items() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "Design Brief", "items": ["one", "*two*"]}))
            .unwrap();
        assert_eq!(
            view,
            ElementView::Text {
                title: "Design Brief".into(),
                html: "<p>one</p>\n<p><em>two</em></p>".into(),
            }
        );
    }

    #[test]
    fn notes_title_uses_label() {
        let mut h = Harness::new(json!({}));
        let view = h.process(json!({"type": "notes", "label": "Pit notes"})).unwrap();
        assert_eq!(view.title(), "Pit notes");
    }

    #[test]
    fn unrecognized_kind_keeps_title_only() {
        let mut h = Harness::new(json!({}));
        assert_eq!(
            h.process(json!({"type": "gantt"})).unwrap(),
            ElementView::Unknown {
                title: "Unknown Element".into()
            }
        );
        assert_eq!(h.process(json!({"title": "no type"})), None);
        assert_eq!(h.process(json!("not an object")), None);
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn image_item_goes_through_assets() {
        let mut h = Harness::new(json!({"title": "Drivetrain V1"}));
        fs::write(h.root.join("resources/August/drive.png"), b"png").unwrap();

        let view = h
            .process(json!({"type": "images", "items": [
                {"src": "resources/{class}/drive.png", "description": "Top **view**"}
            ]}))
            .unwrap();

        let ElementView::Images { title, items } = view else {
            panic!("expected images");
        };
        assert_eq!(title, "Images");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].src, "compilation/output/assets/resources/August/drive.jpg");
        assert_eq!(items[0].label, "Image");
        assert_eq!(items[0].alt, "Drivetrain V1");
        assert_eq!(items[0].description, "<p>Top <strong>view</strong></p>");
    }

    #[test]
    fn image_alt_falls_back_to_id() {
        let mut h = Harness::new(json!({}));
        fs::write(h.root.join("resources/August/drive.png"), b"png").unwrap();
        let view = h
            .process(json!({"type": "image", "src": "resources/August/drive.png"}))
            .unwrap();
        let ElementView::Images { items, .. } = view else {
            panic!("expected images");
        };
        assert_eq!(items[0].alt, "drive-v1");
    }

    #[test]
    fn missing_image_drops_element() {
        let mut h = Harness::new(json!({}));
        let view = h.process(json!({"type": "images", "items": [
            {"src": "resources/August/nope.png"}
        ]}));
        assert_eq!(view, None);
    }

    #[test]
    fn external_image_is_kept_verbatim() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "images", "src": "https://example.com/a.png"}))
            .unwrap();
        let ElementView::Images { items, .. } = view else {
            panic!("expected images");
        };
        assert_eq!(items[0].src, "https://example.com/a.png");
    }

    #[test]
    fn escaping_image_is_never_copied() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "images", "src": "../../etc/passwd"}))
            .unwrap();
        let ElementView::Images { items, .. } = view else {
            panic!("expected images");
        };
        assert_eq!(items[0].src, "../../etc/passwd");
        assert_eq!(h.assets.stats().total(), 0);
    }

    // =========================================================================
    // Scripts
    // =========================================================================

    #[test]
    fn missing_script_yields_placeholder() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "script", "src": "resources/August/missing.py"}))
            .unwrap();
        assert_eq!(
            view,
            ElementView::Script {
                title: "Script".into(),
                items: vec![ScriptItem {
                    label: "python".into(),
                    language: "python".into(),
                    code: "// Missing script: resources/August/missing.py".into(),
                }],
            }
        );
    }

    #[test]
    fn script_reads_source_file() {
        let mut h = Harness::new(json!({"title": "Drivetrain V1"}));
        let dir = h.root.join("resources/August/Entry/Drivetrain V1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.py"), "print('drive')\n").unwrap();

        let view = h
            .process(json!({"type": "script", "items": [
                {"src": "resources/{class}/Entry/{title}/main.py", "label": "Drive code"}
            ]}))
            .unwrap();
        let ElementView::Script { items, .. } = view else {
            panic!("expected script");
        };
        assert_eq!(items[0].code, "print('drive')\n");
        assert_eq!(items[0].label, "Drive code");
    }

    #[test]
    fn inline_code_wins_over_src() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "script", "items": [
                {"src": "nope.js", "code": 42, "language": "text"}
            ]}))
            .unwrap();
        let ElementView::Script { items, .. } = view else {
            panic!("expected script");
        };
        assert_eq!(items[0].code, "42");
        assert_eq!(items[0].language, "text");
    }

    #[test]
    fn script_without_items_is_kept() {
        let mut h = Harness::new(json!({}));
        let view = h.process(json!({"type": "script"})).unwrap();
        assert_eq!(
            view,
            ElementView::Script {
                title: "Script".into(),
                items: vec![],
            }
        );
    }

    #[test]
    fn unmapped_script_extension_has_empty_language() {
        let mut h = Harness::new(json!({}));
        let view = h.process(json!({"type": "script", "src": "drive.rs"})).unwrap();
        let ElementView::Script { items, .. } = view else {
            panic!("expected script");
        };
        assert_eq!(items[0].language, "");
        assert_eq!(items[0].label, "Script");
    }

    // =========================================================================
    // PDF and video
    // =========================================================================

    #[test]
    fn pdf_keeps_original_filename() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "pdf", "src": "resources/{class}/CAD Drawing.pdf"}))
            .unwrap();
        assert_eq!(
            view,
            ElementView::Pdf {
                title: "PDF".into(),
                items: vec![PdfItem {
                    label: "PDF".into(),
                    filename: "CAD Drawing.pdf".into(),
                    src: "resources/August/CAD%20Drawing.pdf".into(),
                }],
            }
        );
    }

    #[test]
    fn empty_pdf_and_video_are_dropped() {
        let mut h = Harness::new(json!({}));
        assert_eq!(h.process(json!({"type": "pdf"})), None);
        assert_eq!(h.process(json!({"type": "video", "items": [{"label": "x"}]})), None);
    }

    #[test]
    fn video_item_defaults() {
        let mut h = Harness::new(json!({}));
        let view = h
            .process(json!({"type": "video", "title": "Match", "src": "https://youtu.be/x"}))
            .unwrap();
        assert_eq!(
            view,
            ElementView::Video {
                title: "Match".into(),
                items: vec![VideoItem {
                    label: "Video".into(),
                    src: "https://youtu.be/x".into(),
                }],
            }
        );
    }
}
