//! webOS Open Source Edition docs (Provider B).
//!
//! Page shape: `h1.title` holds the full service name
//! (`com.webos.service.audio`); endpoints are `h3` headings between
//! `h2#methods` and the next `h2`, each followed by a `div` block whose
//! `h4` headings label the section tables (wrapped in `.table-container`).
//! Nested objects are linked from the type cell by href.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{
    element_by_id, extract_endpoint, following_elements, resolve_locator, text_of, Dialect,
    ExtractCtx, ExtractError, Section,
};
use crate::model::{Group, Service};
use crate::strings;

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static H1_TITLE: Lazy<Selector> = Lazy::new(|| sel("h1.title"));
static H2_METHODS: Lazy<Selector> = Lazy::new(|| sel("h2#methods"));
static H4: Lazy<Selector> = Lazy::new(|| sel("h4"));
static TABLE: Lazy<Selector> = Lazy::new(|| sel("table"));
static TYPE_LINK: Lazy<Selector> = Lazy::new(|| sel("td:nth-child(3) a"));

pub struct Ose;

pub fn extract(doc: &Html, url: &str) -> Result<Service, ExtractError> {
    // com.webos.service.audio → title "audio", uri "luna://com.webos.service.audio"
    let full_title = doc
        .select(&H1_TITLE)
        .next()
        .map(|e| text_of(e).trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractError::MissingTitle { url: url.to_string() })?;
    let title = full_title
        .rsplit('.')
        .next()
        .unwrap_or(full_title.as_str())
        .to_string();
    let uri = format!("luna://{full_title}");

    let methods = doc
        .select(&H2_METHODS)
        .next()
        .ok_or_else(|| ExtractError::NoEndpoints { url: url.to_string() })?;

    // h3 siblings up to the next h2 are the endpoint headings
    let mut entries: Vec<(String, String)> = Vec::new();
    for el in following_elements(methods) {
        match el.value().name() {
            "h2" => break,
            "h3" => {
                let name = strings::strip_ws(&text_of(el));
                let raw = el
                    .value()
                    .attr("id")
                    .map(str::to_string)
                    .unwrap_or_else(|| name.clone());
                let locator = resolve_locator(doc, &raw, &title, &name)?;
                entries.push((name, locator));
            }
            _ => {}
        }
    }
    if entries.is_empty() {
        return Err(ExtractError::NoEndpoints { url: url.to_string() });
    }

    let mut ctx = ExtractCtx::new(doc, url, title.clone());
    let mut endpoints = Vec::with_capacity(entries.len());
    for (name, locator) in &entries {
        endpoints.push(extract_endpoint(&mut ctx, &Ose, name, locator)?);
    }

    Ok(Service { uri, title, group: Group::Ose, endpoints })
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|c| c.split_whitespace().any(|t| t == class))
}

impl Dialect for Ose {
    fn section_table<'a>(&self, doc: &'a Html, locator: &str, section: &str) -> Section<'a> {
        let Some(heading) = element_by_id(doc, locator) else {
            return Section::Absent;
        };
        // detail block = the div immediately after the endpoint heading
        let Some(block) = following_elements(heading)
            .next()
            .filter(|e| e.value().name() == "div")
        else {
            return Section::Absent;
        };
        let Some(label) = block
            .select(&H4)
            .find(|h| text_of(*h).trim().eq_ignore_ascii_case(section))
        else {
            return Section::Absent;
        };
        // table lives in the .table-container right after the label
        let table = following_elements(label)
            .next()
            .filter(|e| has_class(*e, "table-container"))
            .and_then(|container| container.select(&TABLE).next());
        match table {
            Some(t) => Section::Table(t),
            None => Section::MissingTable,
        }
    }

    fn nested_object<'a>(
        &self,
        doc: &'a Html,
        row: ElementRef<'a>,
        parent_name: &str,
    ) -> Option<(String, ElementRef<'a>)> {
        let link = row.select(&TYPE_LINK).next()?;
        let mut href = link.value().attr("href")?.to_string();

        // The audio page reuses the #audiolist anchor for a second,
        // different table; the real one carries the -1 suffix.
        if parent_name == "AudioList" && href == "#audiolist" {
            href = "#audiolist-1".to_string();
        }

        let target = strings::strip_ws(&href.replace('$', ""));
        let target = target.strip_prefix('#')?;
        let anchor = element_by_id(doc, target)?;

        // nextUntil(h3): the nested table's container sits between the
        // anchor heading and the next endpoint
        let container = following_elements(anchor)
            .take_while(|e| e.value().name() != "h3")
            .find(|e| has_class(*e, "table-container"))?;
        let table = container.select(&TABLE).next()?;

        let name = strings::pascal_case(&strings::strip_ws(&text_of(anchor)));
        if name.is_empty() {
            return None;
        }
        Some((name, table))
    }

    fn strips_subtype(&self) -> bool {
        true
    }
}
