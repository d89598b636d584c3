//! HTML cleaning for extracted fragments.
//!
//! Matched elements are re-serialized through an allowlist instead of being
//! copied verbatim: active content is dropped together with its children,
//! structural or unknown wrappers are unwrapped, only presentational
//! attributes survive, and every link gets `rel="nofollow"`.

use quick_xml::escape::{escape, partial_escape};
use scraper::{ElementRef, Node};
use thiserror::Error;

use crate::util::{collapse_whitespace, strip_control_chars, strip_paragraph_wrapper};

#[derive(Debug, Error)]
pub enum SanitizeError {
    /// The matched element is itself a removed tag, so nothing safe remains.
    #[error("element <{0}> is not allowed in feed content")]
    Disallowed(String),
}

/// Removed together with everything inside them.
const REMOVED_TAGS: &[&str] = &[
    "applet", "base", "button", "embed", "frame", "frameset", "head", "iframe", "input", "link",
    "meta", "noscript", "object", "option", "param", "script", "select", "style", "template",
    "textarea", "title",
];

/// Kept with their attributes filtered. Anything not listed here (and not
/// removed) is unwrapped: the tag goes, its children stay.
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "article", "aside", "audio", "b", "bdi", "bdo",
    "big", "blockquote", "br", "caption", "center", "cite", "code", "col", "colgroup", "dd", "del",
    "details", "dfn", "div", "dl", "dt", "em", "figcaption", "figure", "font", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "i", "img", "ins", "kbd", "li", "main", "map", "mark",
    "nav", "ol", "p", "picture", "pre", "q", "s", "samp", "section", "small", "source", "span",
    "strike", "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead",
    "time", "tr", "track", "tt", "u", "ul", "var", "video", "wbr",
];

const VOID_TAGS: &[&str] = &["area", "br", "col", "hr", "img", "source", "track", "wbr"];

const SAFE_ATTRS: &[&str] = &[
    "abbr", "accept", "accept-charset", "accesskey", "action", "align", "alt", "axis", "border",
    "cellpadding", "cellspacing", "char", "charoff", "charset", "checked", "cite", "class", "clear", "color",
    "cols", "colspan", "compact", "coords", "datetime", "dir", "disabled", "enctype", "for",
    "frame", "headers", "height", "href", "hreflang", "hspace", "id", "ismap", "label", "lang",
    "longdesc", "maxlength", "media", "method", "multiple", "name", "nohref", "noshade", "nowrap",
    "prompt", "readonly", "rel", "rev", "rows", "rowspan", "rules", "scope", "selected", "shape",
    "size", "span", "src", "srcset", "start", "summary", "tabindex", "target", "title", "type",
    "usemap", "valign", "value", "vspace", "width",
];

const URL_ATTRS: &[&str] = &["href", "src", "cite", "longdesc", "usemap", "action", "srcset"];

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Serializes `element` as cleaned, whitespace-normalized HTML.
///
/// A single wrapping `<p>…</p>` is stripped so that one-paragraph fragments
/// read as plain inline content.
pub fn clean_element(element: ElementRef<'_>) -> Result<String, SanitizeError> {
    let name = element.value().name();
    if REMOVED_TAGS.contains(&name) {
        return Err(SanitizeError::Disallowed(name.to_owned()));
    }

    let mut out = String::new();
    write_element(element, &mut out);

    let collapsed = collapse_whitespace(&out);
    Ok(strip_paragraph_wrapper(&collapsed).trim().to_owned())
}

/// Normalizes a text or attribute value: control characters are dropped and
/// whitespace is collapsed. Escaping happens when the feed is rendered.
pub fn clean_text(text: &str) -> String {
    collapse_whitespace(&strip_control_chars(text)).into_owned()
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();

    if REMOVED_TAGS.contains(&name) {
        return;
    }

    if !ALLOWED_TAGS.contains(&name) {
        write_children(element, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    write_attributes(element, out);
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = strip_control_chars(text);
                out.push_str(&partial_escape(&*text));
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            // Comments, doctypes and processing instructions are dropped
            _ => {}
        }
    }
}

fn write_attributes(element: ElementRef<'_>, out: &mut String) {
    let is_link = element.value().name() == "a";
    let mut has_href = false;

    // Attribute storage order is not guaranteed; sort for stable output
    let mut attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    attrs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    for (name, value) in attrs {
        if !SAFE_ATTRS.contains(&name) {
            continue;
        }
        // Replaced below for links
        if is_link && name == "rel" {
            continue;
        }
        if URL_ATTRS.contains(&name) && is_unsafe_url(value) {
            continue;
        }
        if name == "href" {
            has_href = true;
        }
        push_attribute(out, name, value);
    }

    if is_link && has_href {
        push_attribute(out, "rel", "nofollow");
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    let value = strip_control_chars(value);
    out.push_str(&escape(&*value));
    out.push('"');
}

fn is_unsafe_url(value: &str) -> bool {
    // Browsers ignore embedded whitespace and control chars inside schemes
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}
