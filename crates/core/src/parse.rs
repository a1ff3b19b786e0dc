//! HTML parsing and DOM traversal.
//!
//! This module provides the [`Document`] and [`Element`] types. [`Element`]
//! exposes predicate-based queries (`find_first`, `find_all`, `closest`,
//! `next_element_sibling`) so the question parser's strategies never touch
//! the underlying tree directly.
//!
//! # Example
//!
//! ```rust
//! use quizsift_core::parse::Document;
//!
//! let html = r#"
//!     <dl>
//!         <dt>Question 1. Capital of France?</dt>
//!         <dd><ul><li>(a) Paris</li><li>(b) Rome</li></ul></dd>
//!     </dl>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let dl = doc.root().find_first(|el| el.tag_name() == "dl").unwrap();
//! assert_eq!(dl.find_all(|el| el.tag_name() == "li").len(), 2);
//! ```

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::{QuizError, Result};

/// Represents a parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::HtmlParseError`] for a blank document. Anything
    /// else parses; html5ever recovers from malformed markup.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quizsift_core::parse::Document;
    ///
    /// let doc = Document::parse("<html><body><h1>Title</h1></body></html>").unwrap();
    /// assert_eq!(doc.root().tag_name(), "html");
    /// assert!(Document::parse("  \n ").is_err());
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(QuizError::HtmlParseError("empty document".to_string()));
        }
        Ok(Self { html: Html::parse_document(html) })
    }

    /// Parses HTML after stripping scripts, styles and comments.
    pub fn parse_with_preprocessing(html: &str, config: &PreprocessConfig) -> Result<Self> {
        let cleaned = preprocess_html(html, config);
        Self::parse(&cleaned)
    }

    /// The root `<html>` element.
    pub fn root(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }
}

/// A single element of a parsed [`Document`].
///
/// Two `Element`s compare equal when they are the same node of the same tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Text content with every text node trimmed and joined by one space.
    ///
    /// Whitespace-only nodes are dropped, so `<b>Answer:</b>Paris` flattens
    /// to `Answer: Paris`.
    pub fn flattened_text(&self) -> String {
        self.element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name (e.g., "div", "li").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// True when the tag name is one of `names`.
    pub fn is_any(&self, names: &[&str]) -> bool {
        let tag = self.element.value().name();
        names.iter().any(|n| n.eq_ignore_ascii_case(tag))
    }

    /// True when the raw `class` attribute matches `pattern`.
    pub fn class_matches(&self, pattern: &Regex) -> bool {
        self.attr("class").is_some_and(|class| pattern.is_match(class))
    }

    /// Descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// Direct child elements.
    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// First descendant satisfying `pred`, in document order.
    pub fn find_first<P>(&self, mut pred: P) -> Option<Element<'a>>
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        self.descendants().find(|el| pred(el))
    }

    /// Every descendant satisfying `pred`, in document order.
    pub fn find_all<P>(&self, mut pred: P) -> Vec<Element<'a>>
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        self.descendants().filter(|el| pred(el)).collect()
    }

    /// The parent element, if any.
    pub fn parent_element(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(|element| Element { element })
    }

    /// Nearest ancestor (excluding `self`) satisfying `pred`.
    pub fn closest<P>(&self, mut pred: P) -> Option<Element<'a>>
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        self.element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
            .find(|el| pred(el))
    }

    /// The next sibling that is an element, skipping text and comments.
    pub fn next_element_sibling(&self) -> Option<Element<'a>> {
        self.element
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// Sibling elements following this one.
    pub fn following_siblings(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.element
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// True when `other` is strictly inside this element.
    pub fn contains(&self, other: &Element<'a>) -> bool {
        let id = self.element.id();
        other.element.ancestors().any(|node| node.id() == id)
    }
}
