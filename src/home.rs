//! Home-page section extraction.
//!
//! The project's static `index.html` doubles as the notebook's "home" page:
//! selected sections (by default `section#about` and `section#links`) are
//! lifted out of it verbatim and placed after the table of contents.
//!
//! Local images inside those sections go through the [`AssetManager`] so
//! they end up in the same `assets/` tree as page images; external images
//! are left alone. Paths in the home page are relative to the page itself,
//! not the project root, and may carry `./` or `/` prefixes.
//!
//! Selectors are deliberately tiny: a tag name, `#id`, `.class`, or a
//! compound of them (`section#about`, `div.card.wide`). No combinators.

use crate::assets::{AssetError, AssetManager};
use crate::imaging::ImageBackend;
use crate::resolve::{ResolvedSrc, Resolver, encode_local_href, is_http, relative_path};
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomeError {
    #[error("failed to read home page {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize home section: {0}")]
    Serialize(io::Error),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// A compound simple selector: optional tag, optional id, any classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl SectionSelector {
    /// Parse `tag`, `#id`, `.class` and compounds such as `section#about.wide`.
    /// Returns `None` for anything else, including combinators and spaces.
    pub fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }

        let tag_end = selector.find(['#', '.']).unwrap_or(selector.len());
        let tag = &selector[..tag_end];
        if !tag.chars().all(is_ident_char) {
            return None;
        }

        let mut parsed = Self {
            tag: (!tag.is_empty()).then(|| tag.to_ascii_lowercase()),
            ..Self::default()
        };

        let mut rest = &selector[tag_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return None;
            }
            match marker {
                '#' if parsed.id.is_none() => parsed.id = Some(name.to_string()),
                '.' => parsed.classes.push(name.to_string()),
                _ => return None,
            }
            rest = &body[end..];
        }
        Some(parsed)
    }

    fn matches(&self, handle: &Handle) -> bool {
        let NodeData::Element { ref name, .. } = handle.data else {
            return false;
        };
        if let Some(tag) = &self.tag
            && !name.local.as_ref().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && attribute(handle, "id").as_deref() != Some(id.as_str())
        {
            return false;
        }
        let class_attr = attribute(handle, "class").unwrap_or_default();
        self.classes
            .iter()
            .all(|class| class_attr.split_whitespace().any(|c| c == class))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn attribute(handle: &Handle, attr_name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        return attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == attr_name)
            .map(|attr| attr.value.to_string());
    }
    None
}

fn set_attribute(handle: &Handle, attr_name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = handle.data
        && let Some(attr) = attrs
            .borrow_mut()
            .iter_mut()
            .find(|attr| attr.name.local.as_ref() == attr_name)
    {
        attr.value = value.into();
    }
}

/// First node in document order matching `selector`.
fn select_first(handle: &Handle, selector: &SectionSelector) -> Option<Handle> {
    if selector.matches(handle) {
        return Some(handle.clone());
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| select_first(child, selector))
}

/// Every `<img src>` below `handle`, in document order.
fn collect_images(handle: &Handle, found: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { ref name, .. } = child.data
            && name.local.as_ref() == "img"
            && attribute(child, "src").is_some()
        {
            found.push(child.clone());
        }
        collect_images(child, found);
    }
}

fn serialize_node(handle: &Handle) -> Result<String, HomeError> {
    let mut bytes = Vec::new();
    let serializable: SerializableHandle = handle.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    serialize(&mut bytes, &serializable, opts).map_err(HomeError::Serialize)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse every configured selector, skipping (and warning about) bad ones.
pub fn parse_selectors(selectors: &[String]) -> Vec<SectionSelector> {
    selectors
        .iter()
        .filter_map(|s| {
            let parsed = SectionSelector::parse(s);
            if parsed.is_none() {
                log::warn!("Ignoring unsupported home section selector '{s}'");
            }
            parsed
        })
        .collect()
}

/// Pull the selected sections out of `index_path`, rewriting local images.
///
/// Sections are returned serialized and joined with `"\n"`, in selector
/// order. A selector that matches nothing is skipped. A missing home page
/// yields an empty string.
pub fn extract_home_content<B: ImageBackend>(
    index_path: &Path,
    selectors: &[SectionSelector],
    resolver: &Resolver,
    assets: &mut AssetManager<B>,
) -> Result<String, HomeError> {
    if !index_path.exists() {
        log::warn!("Home page {} not found; home section left empty", index_path.display());
        return Ok(String::new());
    }
    let html = fs::read_to_string(index_path).map_err(|source| HomeError::Read {
        path: index_path.to_path_buf(),
        source,
    })?;
    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());

    let base_dir = index_path.parent().unwrap_or(resolver.root());
    let mut sections = Vec::new();
    for selector in selectors {
        let Some(node) = select_first(&dom.document, selector) else {
            log::debug!("Home section {selector:?} not found");
            continue;
        };
        let mut images = Vec::new();
        collect_images(&node, &mut images);
        for img in images {
            rewrite_image(&img, base_dir, resolver, assets)?;
        }
        sections.push(serialize_node(&node)?);
    }
    Ok(sections.join("\n"))
}

fn rewrite_image<B: ImageBackend>(
    img: &Handle,
    base_dir: &Path,
    resolver: &Resolver,
    assets: &mut AssetManager<B>,
) -> Result<(), HomeError> {
    let Some(src) = attribute(img, "src") else {
        return Ok(());
    };
    if src.is_empty() || is_http(&src) {
        return Ok(());
    }
    let trimmed = src.trim_start_matches(['.', '/']);
    let Some(fs_path) = resolver
        .contain(&base_dir.join(trimmed))
        .filter(|p| p.exists())
    else {
        return Ok(());
    };

    let resolved = ResolvedSrc {
        href: encode_local_href(&relative_path(resolver.root(), &fs_path)),
        fs_path: Some(fs_path),
    };
    let href = assets.prepare_image(&resolved)?;
    if !href.is_empty() {
        set_attribute(img, "src", &href);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetSettings;
    use crate::imaging::backend::tests::MockBackend;
    use tempfile::TempDir;

    // =========================================================================
    // Selector parsing
    // =========================================================================

    #[test]
    fn parse_tag_and_id() {
        let sel = SectionSelector::parse("section#about").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("section"));
        assert_eq!(sel.id.as_deref(), Some("about"));
        assert!(sel.classes.is_empty());
    }

    #[test]
    fn parse_id_only_and_classes() {
        assert_eq!(
            SectionSelector::parse("#links").unwrap(),
            SectionSelector {
                tag: None,
                id: Some("links".into()),
                classes: vec![],
            }
        );
        let sel = SectionSelector::parse("div.card.wide").unwrap();
        assert_eq!(sel.classes, vec!["card", "wide"]);
    }

    #[test]
    fn parse_rejects_combinators_and_garbage() {
        assert!(SectionSelector::parse("section > p").is_none());
        assert!(SectionSelector::parse("section p").is_none());
        assert!(SectionSelector::parse("").is_none());
        assert!(SectionSelector::parse("#").is_none());
        assert!(SectionSelector::parse("a#b#c").is_none());
        assert!(SectionSelector::parse("img[src]").is_none());
    }

    #[test]
    fn parse_selectors_drops_unsupported() {
        let parsed = parse_selectors(&["section#about".into(), "a > b".into()]);
        assert_eq!(parsed.len(), 1);
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    struct Site {
        _tmp: TempDir,
        root: PathBuf,
    }

    fn site(index_html: &str) -> Site {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        fs::write(root.join("index.html"), index_html).unwrap();
        fs::create_dir_all(root.join("resources/home")).unwrap();
        Site { _tmp: tmp, root }
    }

    fn extract(site: &Site, selectors: &[&str]) -> (String, AssetManager<MockBackend>) {
        let resolver = Resolver::new(&site.root);
        let mut assets = AssetManager::new(
            &site.root,
            &site.root.join("compilation/output"),
            MockBackend::new(),
            AssetSettings::default(),
        )
        .unwrap();
        let selectors: Vec<_> = selectors
            .iter()
            .map(|s| SectionSelector::parse(s).unwrap())
            .collect();
        let html = extract_home_content(
            &site.root.join("index.html"),
            &selectors,
            &resolver,
            &mut assets,
        )
        .unwrap();
        (html, assets)
    }

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<nav>skip me</nav>
<section id="links"><a href="https://example.com">Site</a></section>
<section id="about" class="intro">
  <h2>About</h2>
  <img src="./resources/home/team.png" alt="Team">
  <img src="https://cdn.example.com/logo.png" alt="Remote">
  <img src="/resources/home/missing.png" alt="Missing">
</section>
</body></html>"#;

    #[test]
    fn sections_follow_selector_order() {
        let site = site(PAGE);
        let (html, _) = extract(&site, &["section#about", "section#links"]);
        let about = html.find("<section id=\"about\"").unwrap();
        let links = html.find("<section id=\"links\"").unwrap();
        assert!(about < links);
        assert!(!html.contains("skip me"));
    }

    #[test]
    fn local_images_are_rewritten_external_untouched() {
        let site = site(PAGE);
        fs::write(site.root.join("resources/home/team.png"), b"png").unwrap();

        let (html, assets) = extract(&site, &["section#about"]);

        assert!(html.contains(r#"src="compilation/output/assets/resources/home/team.jpg""#));
        assert!(html.contains(r#"src="https://cdn.example.com/logo.png""#));
        assert!(html.contains(r#"src="/resources/home/missing.png""#));
        assert_eq!(assets.backend().downscale_count(), 1);
    }

    #[test]
    fn missing_section_is_omitted() {
        let site = site(PAGE);
        let (html, _) = extract(&site, &["section#sponsors", "section#links"]);
        assert!(html.starts_with("<section id=\"links\""));
        assert!(!html.contains('\n'));
    }

    #[test]
    fn class_selector_matches_any_listed_class() {
        let site = site(PAGE);
        let (html, _) = extract(&site, &[".intro"]);
        assert!(html.starts_with("<section id=\"about\""));
    }

    #[test]
    fn leading_dots_and_slashes_resolve_from_the_home_page_directory() {
        let site = site(
            r#"<section id="about"><img src="../../resources/home/team.png"></section>"#,
        );
        fs::write(site.root.join("resources/home/team.png"), b"png").unwrap();

        let (html, assets) = extract(&site, &["section#about"]);

        assert!(html.contains(r#"src="compilation/output/assets/resources/home/team.jpg""#));
        assert_eq!(assets.backend().downscale_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_the_root_is_untouched() {
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("outside.png");
        fs::write(&target, b"png").unwrap();
        let site = site(r#"<section id="about"><img src="resources/home/escape.png"></section>"#);
        std::os::unix::fs::symlink(&target, site.root.join("resources/home/escape.png")).unwrap();

        let (html, assets) = extract(&site, &["section#about"]);

        assert!(html.contains(r#"src="resources/home/escape.png""#));
        assert_eq!(assets.stats().total(), 0);
        assert_eq!(assets.backend().downscale_count(), 0);
        assert!(!site.root.join("compilation/output/assets").join("resources/home/escape.jpg").exists());
    }

    #[test]
    fn missing_home_page_is_empty() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        let resolver = Resolver::new(&root);
        let mut assets = AssetManager::new(
            &root,
            &root.join("out"),
            MockBackend::new(),
            AssetSettings::default(),
        )
        .unwrap();
        let html = extract_home_content(
            &root.join("index.html"),
            &[SectionSelector::parse("section#about").unwrap()],
            &resolver,
            &mut assets,
        )
        .unwrap();
        assert_eq!(html, "");
    }
}
