//! Legacy LG developer docs (Provider A).
//!
//! Page shape: `.page-title` holds the service title, a `.TED_H2`
//! heading carries the `luna:` uri, endpoints are the first cells of the
//! `.tbListCol` listing tables (the cell's `a` href fragment is the
//! in-page locator), and each endpoint's `#id` block labels its tables
//! with `h4.TED_H4` headings. Nested objects are linked from the name
//! cell by a `$`-prefixed anchor text that matches a `[name=...]` anchor
//! elsewhere on the page.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{
    cell_text, element_by_id, extract_endpoint, following_elements, resolve_locator, text_of,
    Dialect, ExtractCtx, ExtractError, Section,
};
use crate::model::{Group, Service};
use crate::strings;

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static PAGE_TITLE: Lazy<Selector> = Lazy::new(|| sel(".page-title"));
static URI_HEADING: Lazy<Selector> = Lazy::new(|| sel(".TED_H2"));
static ENDPOINT_CELLS: Lazy<Selector> =
    Lazy::new(|| sel(".DIV_contentarea > table.tbListCol tr:nth-child(2) > td:first-of-type"));
static LINK: Lazy<Selector> = Lazy::new(|| sel("a"));
static SECTION_H4: Lazy<Selector> = Lazy::new(|| sel("h4.TED_H4"));
static NAME_LINK: Lazy<Selector> = Lazy::new(|| sel("td:nth-child(1) a"));
static NAMED_ANCHOR: Lazy<Selector> = Lazy::new(|| sel("[name]"));

static LUNA_URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(luna:\S+)").expect("static regex"));

pub struct Lg;

pub fn extract(doc: &Html, url: &str) -> Result<Service, ExtractError> {
    let title = doc
        .select(&PAGE_TITLE)
        .next()
        .map(|e| text_of(e).trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractError::MissingTitle { url: url.to_string() })?;

    let uri = doc
        .select(&URI_HEADING)
        .next()
        .and_then(|e| {
            let text = text_of(e);
            LUNA_URI.captures(&text).map(|c| c[1].to_string())
        })
        .ok_or_else(|| ExtractError::MissingUri { url: url.to_string() })?;

    let mut entries: Vec<(String, String)> = Vec::new();
    for cell in doc.select(&ENDPOINT_CELLS) {
        let name = strings::strip_ws(&text_of(cell));
        if name.is_empty() {
            continue;
        }
        // the cell's anchor points into the page; the fragment is the locator
        let raw = cell
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| href.split_once('#').map(|(_, frag)| frag.to_string()))
            .unwrap_or_else(|| name.clone());
        let locator = resolve_locator(doc, &raw, &title, &name)?;
        entries.push((name, locator));
    }
    if entries.is_empty() {
        return Err(ExtractError::NoEndpoints { url: url.to_string() });
    }

    let mut ctx = ExtractCtx::new(doc, url, title.clone());
    let mut endpoints = Vec::with_capacity(entries.len());
    for (name, locator) in &entries {
        endpoints.push(extract_endpoint(&mut ctx, &Lg, name, locator)?);
    }

    Ok(Service { uri, title, group: Group::Lg, endpoints })
}

impl Dialect for Lg {
    fn section_table<'a>(&self, doc: &'a Html, locator: &str, section: &str) -> Section<'a> {
        let Some(block) = element_by_id(doc, locator) else {
            return Section::Absent;
        };
        let Some(label) = block
            .select(&SECTION_H4)
            .find(|h| text_of(*h).trim().eq_ignore_ascii_case(section))
        else {
            return Section::Absent;
        };
        match following_elements(label).find(|e| e.value().name() == "table") {
            Some(t) => Section::Table(t),
            None => Section::MissingTable,
        }
    }

    fn nested_object<'a>(
        &self,
        doc: &'a Html,
        row: ElementRef<'a>,
        _parent_name: &str,
    ) -> Option<(String, ElementRef<'a>)> {
        // name cell holds "$linkName"; the definition sits after the
        // matching <a name="linkName"> anchor
        let link_el = row.select(&NAME_LINK).next()?;
        let link = strings::strip_ws(&text_of(link_el).replace('$', ""));
        if link.is_empty() {
            return None;
        }
        let anchor = doc
            .select(&NAMED_ANCHOR)
            .find(|e| e.value().attr("name") == Some(link.as_str()))?;
        let holder = ElementRef::wrap(anchor.parent()?)?;
        let table = following_elements(holder).find(|e| e.value().name() == "table")?;

        let name = strings::pascal_case(&strings::strip_ws(&cell_text(row, 0)));
        if name.is_empty() {
            return None;
        }
        Some((name, table))
    }
}
