//! Schema extraction engine (shared core).
//!
//! Walk one parsed documentation page and build a fully-resolved
//! [`Service`]. The two documentation dialects (legacy LG developer docs
//! and webOS OSE docs) differ only in how they navigate the page; the
//! recursive object-shape resolution, the type classification, the
//! locator fallback and the per-run dedup cache live here and are shared
//! via the [`Dialect`] trait.
//!
//! Failure policy is deliberately asymmetric: top-level anchors (title,
//! endpoint list, a table under a section heading we did find) are strict
//! and abort the document; nested-object links degrade to `any`.
pub mod lg;
pub mod ose;

use std::sync::Arc;

use colored::Colorize;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::model::{
    Endpoint, EndpointError, Group, LiteralType, Property, ScalarType, Service, Type,
};
use crate::strings;

// ------------------------------ Errors ------------------------------------ //

/// Fatal-per-document extraction failures. Anything not listed here
/// degrades (missing optional section, unresolvable nested link) instead
/// of failing.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not find the service title at {url}")]
    MissingTitle { url: String },

    #[error("could not find the service uri at {url}")]
    MissingUri { url: String },

    #[error("no endpoint entries found at {url}")]
    NoEndpoints { url: String },

    #[error("could not resolve locator of {service} endpoint {endpoint}")]
    UnresolvedLocator { service: String, endpoint: String },

    #[error("{service} endpoint {endpoint} has a {section} heading but no table follows it")]
    MissingSectionTable {
        service: String,
        endpoint: String,
        section: String,
    },
}

// ----------------------------- Dialect hooks ------------------------------ //

/// Outcome of looking up one labeled subsection of an endpoint block.
pub enum Section<'a> {
    /// No heading with that label: the section is optional, caller degrades.
    Absent,
    /// Heading found and a table follows it.
    Table(ElementRef<'a>),
    /// Heading found but no table follows: contract violation, fatal.
    MissingTable,
}

/// Per-provider navigation rules. Everything else about extraction is
/// identical between the two documentation dialects.
pub trait Dialect {
    /// Locate the table of a labeled subsection ("Parameters",
    /// "Call Returns", ...) inside the endpoint block `locator` points at.
    /// The label match is case-insensitive.
    fn section_table<'a>(&self, doc: &'a Html, locator: &str, section: &str) -> Section<'a>;

    /// Resolve a property row whose type column says "object" to the
    /// nested definition: (derived pascal-cased name, its table).
    /// `None` means the link convention did not pan out; the caller
    /// falls back to `any`.
    fn nested_object<'a>(
        &self,
        doc: &'a Html,
        row: ElementRef<'a>,
        parent_name: &str,
    ) -> Option<(String, ElementRef<'a>)>;

    /// Whether the dialect writes parenthesized sub-type annotations
    /// ("Array (String)") that must be stripped before classification.
    fn strips_subtype(&self) -> bool {
        false
    }
}

/// Dispatch to the right dialect for an already-parsed page.
pub fn extract(group: Group, doc: &Html, url: &str) -> Result<Service, ExtractError> {
    match group {
        Group::Lg => lg::extract(doc, url),
        Group::Ose => ose::extract(doc, url),
    }
}

// ----------------------------- Run context -------------------------------- //

/// State for one extraction run over one document. Discarded when the
/// run finishes; nothing leaks across documents.
pub struct ExtractCtx<'a> {
    pub doc: &'a Html,
    pub url: &'a str,
    pub title: String,
    /// Dedup cache keyed by derived name. First extraction wins; a later
    /// table deriving the same name gets the cached value back, even if
    /// its contents differ (accepted risk, see DESIGN.md).
    literals: IndexMap<String, Arc<LiteralType>>,
}

impl<'a> ExtractCtx<'a> {
    pub fn new(doc: &'a Html, url: &'a str, title: String) -> Self {
        Self {
            doc,
            url,
            title,
            literals: IndexMap::new(),
        }
    }
}

// --------------------------- Shared selectors ------------------------------ //

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static ANY_ID: Lazy<Selector> = Lazy::new(|| sel("[id]"));
static TR: Lazy<Selector> = Lazy::new(|| sel("tr"));
static TD: Lazy<Selector> = Lazy::new(|| sel("td"));

/// Look an element up by its literal `id` attribute. CSS `#...` parsing
/// chokes on the dots and slashes these docs put into anchors, so this
/// scans `[id]` instead.
pub fn element_by_id<'a>(doc: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    doc.select(&ANY_ID).find(|e| e.value().attr("id") == Some(id))
}

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Following siblings of `el` that are elements, in document order.
pub fn following_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

fn cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.select(&TD).collect()
}

pub(crate) fn cell_text(row: ElementRef<'_>, idx: usize) -> String {
    cells(row).get(idx).map(|c| text_of(*c)).unwrap_or_default()
}

/// Data rows of a table (everything after the header row). Nested tables
/// are not expected inside these docs' shape tables.
pub fn data_rows<'a>(table: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    table.select(&TR).skip(1)
}

// --------------------------- Locator fallback ------------------------------ //

/// Resolve an endpoint's in-page locator. If the literal id does not
/// exist, retry lower-cased (the docs' heading ids are inconsistently
/// cased); if that fails too, fail fast — silently mis-resolving would
/// corrupt every derived name downstream.
pub fn resolve_locator(
    doc: &Html,
    raw: &str,
    service: &str,
    endpoint: &str,
) -> Result<String, ExtractError> {
    if element_by_id(doc, raw).is_some() {
        return Ok(raw.to_string());
    }
    eprintln!(
        "{} locator of {service} endpoint {endpoint} is wrong, retrying lower-cased",
        "warn:".yellow().bold()
    );
    let lower = raw.to_lowercase();
    if element_by_id(doc, &lower).is_some() {
        return Ok(lower);
    }
    Err(ExtractError::UnresolvedLocator {
        service: service.to_string(),
        endpoint: endpoint.to_string(),
    })
}

// ----------------------------- Endpoints ----------------------------------- //

/// Build one endpoint from its resolved locator: up to four labeled
/// subsections, each optional except that a found heading must own a table.
pub fn extract_endpoint<D: Dialect>(
    ctx: &mut ExtractCtx<'_>,
    dialect: &D,
    name: &str,
    locator: &str,
) -> Result<Endpoint, ExtractError> {
    let parameters = match find_section(ctx, dialect, name, locator, "Parameters")? {
        Some(table) => {
            let derived = strings::pascal_case(name) + "Parameters";
            Type::Literal(object_literal_from_table(ctx, dialect, derived, table))
        }
        None => Type::Scalar(ScalarType::Never),
    };

    let call_return = find_section(ctx, dialect, name, locator, "Call Returns")?
        .map(|table| {
            let derived = strings::pascal_case(name) + "CallReturn";
            object_literal_from_table(ctx, dialect, derived, table)
        });

    let subscription_return = find_section(ctx, dialect, name, locator, "Subscription Returns")?
        .map(|table| {
            let derived = strings::pascal_case(name) + "Subscription";
            object_literal_from_table(ctx, dialect, derived, table)
        });

    let errors = find_section(ctx, dialect, name, locator, "error reference")?
        .map(errors_from_table);

    Ok(Endpoint {
        name: name.to_string(),
        parameters,
        call_return,
        subscription_return,
        errors,
    })
}

fn find_section<'a, D: Dialect>(
    ctx: &ExtractCtx<'a>,
    dialect: &D,
    endpoint: &str,
    locator: &str,
    section: &str,
) -> Result<Option<ElementRef<'a>>, ExtractError> {
    match dialect.section_table(ctx.doc, locator, section) {
        Section::Absent => Ok(None),
        Section::Table(t) => Ok(Some(t)),
        Section::MissingTable => Err(ExtractError::MissingSectionTable {
            service: ctx.title.clone(),
            endpoint: endpoint.to_string(),
            section: section.to_string(),
        }),
    }
}

/// One `EndpointError` per non-header row: col 1 = code, col 2 = message.
pub fn errors_from_table(table: ElementRef<'_>) -> Vec<EndpointError> {
    data_rows(table)
        .map(|tr| EndpointError {
            code: strings::strip_ws(&cell_text(tr, 0)),
            message: cell_text(tr, 1).trim().to_string(),
        })
        .collect()
}

// ------------------------ Object-shape resolution --------------------------- //

/// Build (or fetch from the run cache) the object literal a shape table
/// describes. Dedup is by derived name, not structure; recursion into
/// nested objects goes through the same cache, which is also what
/// terminates longer reference cycles.
pub fn object_literal_from_table<'a, D: Dialect>(
    ctx: &mut ExtractCtx<'a>,
    dialect: &D,
    name: String,
    table: ElementRef<'a>,
) -> Arc<LiteralType> {
    if let Some(existing) = ctx.literals.get(&name) {
        return Arc::clone(existing);
    }

    let rows: Vec<ElementRef<'a>> = data_rows(table).collect();
    let mut properties = Vec::with_capacity(rows.len());
    for row in rows {
        properties.push(property_from_row(ctx, dialect, &name, row));
    }

    let literal = Arc::new(LiteralType { name: name.clone(), properties });
    ctx.literals.insert(name, Arc::clone(&literal));
    literal
}

fn property_from_row<'a, D: Dialect>(
    ctx: &mut ExtractCtx<'a>,
    dialect: &D,
    parent_name: &str,
    row: ElementRef<'a>,
) -> Property {
    let raw_type = strings::strip_ws(&cell_text(row, 2)).to_lowercase();
    let (ty, array) = classify(ctx, dialect, parent_name, row, &raw_type);

    Property {
        name: strings::strip_ws(&cell_text(row, 0)),
        docs: strings::doc_lines(&cell_text(row, 3)),
        ty,
        array,
        required: strings::strip_ws(&cell_text(row, 1)) == "Required",
    }
}

/// Classify a (lowercased, whitespace-stripped) type-column text.
///
/// "object..." goes through the dialect's link convention, best effort:
/// an unresolvable link is `any`, a link back to the literal being built
/// is the `parent` scalar (the only cycle-breaking rule). Everything
/// else: strip the "array" marker, strip a parenthesized sub-type when
/// the dialect writes one (the sub-type itself is discarded), then map
/// exact scalar names; unknown text is `any`.
fn classify<'a, D: Dialect>(
    ctx: &mut ExtractCtx<'a>,
    dialect: &D,
    parent_name: &str,
    row: ElementRef<'a>,
    raw: &str,
) -> (Type, bool) {
    let array = raw.contains("array");

    if raw.starts_with("object") {
        let ty = match dialect.nested_object(ctx.doc, row, parent_name) {
            Some((nested_name, _)) if nested_name == parent_name => {
                Type::Scalar(ScalarType::Parent)
            }
            Some((nested_name, table)) => {
                Type::Literal(object_literal_from_table(ctx, dialect, nested_name, table))
            }
            None => Type::Scalar(ScalarType::Any),
        };
        return (ty, array);
    }

    let mut t = raw.replace("array", "");
    if dialect.strips_subtype() {
        t = strip_subtype(&t);
    }
    let scalar = ScalarType::from_raw(&t).unwrap_or(ScalarType::Any);
    (Type::Scalar(scalar), array)
}

/// Drop a "(...)" annotation: "string(utf8)" → "string".
fn strip_subtype(t: &str) -> String {
    match (t.find('('), t.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            format!("{}{}", &t[..open], &t[close + 1..])
        }
        _ => t.to_string(),
    }
}

// -------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ose::Ose;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    fn first_table(doc: &Html) -> ElementRef<'_> {
        doc.select(&sel("table")).next().unwrap()
    }

    #[test]
    fn strip_subtype_only_inside_parens() {
        assert_eq!(strip_subtype("string(utf8)"), "string");
        assert_eq!(strip_subtype("string"), "string");
        assert_eq!(strip_subtype("(string"), "(string");
    }

    #[test]
    fn dedup_returns_identical_instance_even_for_different_tables() {
        let html = doc(
            "<table>\
               <tr><th>h</th></tr>\
               <tr><td>a</td><td>Required</td><td>String</td><td></td></tr>\
             </table>\
             <table>\
               <tr><th>h</th></tr>\
               <tr><td>completely</td><td>Required</td><td>Number</td><td></td></tr>\
             </table>",
        );
        let tables: Vec<_> = html.select(&sel("table")).collect();
        let mut ctx = ExtractCtx::new(&html, "test://", "audio".into());

        let first = object_literal_from_table(&mut ctx, &Ose, "GetStatusParameters".into(), tables[0]);
        let second = object_literal_from_table(&mut ctx, &Ose, "GetStatusParameters".into(), tables[1]);

        assert!(Arc::ptr_eq(&first, &second), "first extraction wins, by name");
        assert_eq!(second.properties[0].name, "a");
    }

    #[test]
    fn rows_classify_scalars_required_and_docs() {
        let html = doc(
            "<table>\
               <tr><th>Name</th><th>Required</th><th>Type</th><th>Description</th></tr>\
               <tr><td> x </td><td>Required</td><td>String</td><td>first\n\nsecond  </td></tr>\
               <tr><td>y</td><td>Optional</td><td>Number</td><td></td></tr>\
               <tr><td>z</td><td>required</td><td>Integer</td><td></td></tr>\
             </table>",
        );
        let mut ctx = ExtractCtx::new(&html, "test://", "audio".into());
        let lit = object_literal_from_table(&mut ctx, &Ose, "FooParameters".into(), first_table(&html));

        assert_eq!(lit.properties.len(), 3);
        let x = &lit.properties[0];
        assert_eq!(x.name, "x");
        assert!(x.required);
        assert!(matches!(x.ty, Type::Scalar(ScalarType::String)));
        assert_eq!(x.docs, vec!["first", "second"]);

        let y = &lit.properties[1];
        assert!(!y.required, "anything but the literal \"Required\" is optional");
        assert!(matches!(y.ty, Type::Scalar(ScalarType::Number)));

        let z = &lit.properties[2];
        assert!(!z.required, "match is case-sensitive");
        assert!(matches!(z.ty, Type::Scalar(ScalarType::Any)), "unknown type text falls back to any");
    }

    #[test]
    fn array_marker_is_stripped_and_flagged() {
        let html = doc(
            "<table>\
               <tr><th>h</th></tr>\
               <tr><td>tags</td><td>Required</td><td>String array</td><td></td></tr>\
               <tr><td>ids</td><td>Required</td><td>Array (String)</td><td></td></tr>\
             </table>",
        );
        let mut ctx = ExtractCtx::new(&html, "test://", "audio".into());
        let lit = object_literal_from_table(&mut ctx, &Ose, "ListParameters".into(), first_table(&html));

        let tags = &lit.properties[0];
        assert!(tags.array);
        assert!(matches!(tags.ty, Type::Scalar(ScalarType::String)));

        // "Array (String)" strips to just the annotation; the sub-type is discarded
        let ids = &lit.properties[1];
        assert!(ids.array);
        assert!(matches!(ids.ty, Type::Scalar(ScalarType::Any)));
    }

    #[test]
    fn unresolvable_object_link_degrades_to_any() {
        let html = doc(
            "<table>\
               <tr><th>h</th></tr>\
               <tr><td>opts</td><td>Optional</td><td>Object</td><td></td></tr>\
             </table>",
        );
        let mut ctx = ExtractCtx::new(&html, "test://", "audio".into());
        let lit = object_literal_from_table(&mut ctx, &Ose, "SetParameters".into(), first_table(&html));
        assert!(matches!(lit.properties[0].ty, Type::Scalar(ScalarType::Any)));
        assert!(!lit.properties[0].array);
    }

    #[test]
    fn object_array_sets_both_object_and_array() {
        let html = doc(
            "<table>\
               <tr><th>h</th></tr>\
               <tr><td>items</td><td>Required</td><td>Object array</td><td></td></tr>\
             </table>",
        );
        let mut ctx = ExtractCtx::new(&html, "test://", "audio".into());
        let lit = object_literal_from_table(&mut ctx, &Ose, "GetListCallReturn".into(), first_table(&html));
        assert!(lit.properties[0].array);
        // no link in the cell, so the nested shape itself is any
        assert!(matches!(lit.properties[0].ty, Type::Scalar(ScalarType::Any)));
    }

    #[test]
    fn error_table_rows() {
        let html = doc(
            "<table>\
               <tr><th>Code</th><th>Message</th></tr>\
               <tr><td> 123 </td><td> Bad Input </td></tr>\
               <tr><td>-4</td><td>No such device</td></tr>\
             </table>",
        );
        let errors = errors_from_table(first_table(&html));
        assert_eq!(
            errors,
            vec![
                EndpointError { code: "123".into(), message: "Bad Input".into() },
                EndpointError { code: "-4".into(), message: "No such device".into() },
            ]
        );
    }

    #[test]
    fn locator_fallback_lowercases_then_fails() {
        let html = doc(r#"<h3 id="getstatus">getStatus</h3>"#);
        let resolved = resolve_locator(&html, "getStatus", "audio", "getStatus").unwrap();
        assert_eq!(resolved, "getstatus");

        let err = resolve_locator(&html, "setStatus", "audio", "setStatus").unwrap_err();
        assert!(matches!(err, ExtractError::UnresolvedLocator { .. }));
    }
}
