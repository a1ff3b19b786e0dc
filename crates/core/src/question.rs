//! Quiz item extraction.
//!
//! Turning a page into quiz items is a chain of fallbacks at every level:
//! where the items live, where the question text sits inside an item, where
//! its options are and where the answer panel hides. Each level is an enum
//! of named strategies tried in a fixed order; the first strategy whose
//! result is usable wins and the rest are not consulted.
//!
//! # Example
//!
//! ```rust
//! use quizsift_core::question::{ParserConfig, QuestionParser};
//!
//! let html = r#"
//!     <dl>
//!         <dt>Question 1. Capital of France?</dt>
//!         <dd>
//!             <ul><li>(a) Paris</li><li>(b) Rome</li></ul>
//!             <button class="collapsible">Show</button>
//!             <div class="rg-c-content">Answer: Paris Explanation: Seat of government.</div>
//!         </dd>
//!     </dl>
//! "#;
//!
//! let parser = QuestionParser::new(ParserConfig::default());
//! let candidates = parser.parse(html).unwrap();
//! assert_eq!(candidates[0].question, "Capital of France?");
//! assert_eq!(candidates[0].answer.as_deref(), Some("Paris"));
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::parse::{Document, Element};
use crate::preprocess::PreprocessConfig;

static QUESTION_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)question").expect("valid regex"));

static OPTIONS_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(options|answers|choices)").expect("valid regex"));

static OPTION_ITEM_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(option|choice|answer)").expect("valid regex"));

static REVEAL_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(collapsible|toggle|reveal|show-?answer)").expect("valid regex"));

static ORDINAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:question|प्रश्न|q)\s*(?:no)?[.\s]*\d+\s*[.:)\-–।]*\s*").expect("valid regex")
});

/// `(a) text` or `(क) text`.
static LETTERED_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\(\s*([A-Za-z]|[ऀ-ॿ])\s*\)\s*(.*)$").expect("valid regex"));

static MARKER_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(answer|explanation|उत्तर|व्याख्या)").expect("valid regex"));

static ANSWER_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:answer|उत्तर)\s*[:：]\s*(.*?)(?:\s*(?:explanation|व्याख्या)\s*[:：]|$)").expect("valid regex")
});

static EXPLANATION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(?:explanation|व्याख्या)\s*[:：]\s*(.*)$").expect("valid regex"));

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const LISTS: &[&str] = &["ul", "ol"];
const STRUCTURAL_TAGS: &[&str] = &["div", "section", "article", "li", "form", "fieldset", "td"];

/// Configuration for question extraction
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Minimum number of options for a candidate to count as a quiz item (default: 2)
    pub min_options: usize,
    /// HTML cleanup applied before parsing
    pub preprocess: PreprocessConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { min_options: 2, preprocess: PreprocessConfig::default() }
    }
}

/// One quiz item as found in the page, before answer matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub question: String,
    pub options: Vec<String>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
}

/// Where the quiz items of a page live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStrategy {
    /// `<dl>` holding a `<dt>` term and a `<dd>` definition.
    DefinitionList,
    /// Any element whose class looks like "question".
    QuestionClass,
    /// Innermost structural elements that directly hold a list of two or more items.
    StructuralScan,
}

impl ContainerStrategy {
    pub const ORDER: [ContainerStrategy; 3] = [Self::DefinitionList, Self::QuestionClass, Self::StructuralScan];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DefinitionList => "definition-list",
            Self::QuestionClass => "question-class",
            Self::StructuralScan => "structural-scan",
        }
    }

    /// Candidate containers under `root`, in document order.
    pub fn discover<'a>(&self, root: &Element<'a>) -> Vec<Element<'a>> {
        match self {
            Self::DefinitionList => root.find_all(|el| {
                el.tag_name() == "dl"
                    && el.find_first(|c| c.tag_name() == "dt").is_some()
                    && el.find_first(|c| c.tag_name() == "dd").is_some()
            }),
            Self::QuestionClass => {
                let items = root.find_all(|el| el.class_matches(&QUESTION_CLASS) && looks_like_item(el));
                innermost(items)
            }
            Self::StructuralScan => {
                let items = root.find_all(|el| el.is_any(STRUCTURAL_TAGS) && has_direct_option_list(el));
                innermost(items)
            }
        }
    }
}

impl fmt::Display for ContainerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn looks_like_item(el: &Element<'_>) -> bool {
    el.find_first(|c| c.tag_name() == "li" || c.class_matches(&OPTION_ITEM_CLASS))
        .is_some()
}

fn has_direct_option_list(el: &Element<'_>) -> bool {
    el.children()
        .filter(|child| child.is_any(LISTS))
        .any(|list| list.children().filter(|li| li.tag_name() == "li").count() >= 2)
}

/// Drops every element that contains another element of the set.
fn innermost<'a>(elements: Vec<Element<'a>>) -> Vec<Element<'a>> {
    elements
        .iter()
        .filter(|outer| !elements.iter().any(|inner| outer.contains(inner)))
        .copied()
        .collect()
}

/// Where the question text sits inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionTextStrategy {
    /// The `<dt>` term.
    DefinitionTerm,
    /// The first heading.
    Heading,
    /// A paragraph whose class looks like "question".
    QuestionParagraph,
    /// The first paragraph outside any list.
    LeadingParagraph,
}

impl QuestionTextStrategy {
    pub const ORDER: [QuestionTextStrategy; 4] =
        [Self::DefinitionTerm, Self::Heading, Self::QuestionParagraph, Self::LeadingParagraph];

    /// Cleaned question text, or `None` when the node is missing or empty.
    pub fn apply(&self, container: &Element<'_>) -> Option<String> {
        let node = match self {
            Self::DefinitionTerm => container.find_first(|el| el.tag_name() == "dt"),
            Self::Heading => container.find_first(|el| el.is_any(HEADINGS)),
            Self::QuestionParagraph => {
                container.find_first(|el| el.tag_name() == "p" && el.class_matches(&QUESTION_CLASS))
            }
            Self::LeadingParagraph => container.find_first(|el| {
                el.tag_name() == "p" && el.closest(|a| a.tag_name() == "li" || a == container).as_ref() == Some(container)
            }),
        }?;

        let text = clean_question(&node.flattened_text());
        (!text.is_empty()).then_some(text)
    }
}

/// Strips a leading `Question N` marker, decodes leftover entities and trims.
pub fn clean_question(text: &str) -> String {
    let decoded = decode_entities(text.trim());
    ORDINAL_PREFIX.replace(decoded.trim(), "").trim().to_string()
}

/// Decodes HTML entities that survived one round of parsing
/// (double-encoded markup such as `&amp;quot;`).
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') || text.contains('<') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect()
}

/// Where the options of an item are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsContainerStrategy {
    /// The `<dd>` definition.
    DefinitionDescription,
    /// An element whose class looks like "options", "answers" or "choices".
    OptionsClass,
    /// The parent of the first list.
    NearestListParent,
}

impl OptionsContainerStrategy {
    pub const ORDER: [OptionsContainerStrategy; 3] =
        [Self::DefinitionDescription, Self::OptionsClass, Self::NearestListParent];

    pub fn apply<'a>(&self, container: &Element<'a>) -> Option<Element<'a>> {
        match self {
            Self::DefinitionDescription => container.find_first(|el| el.tag_name() == "dd"),
            Self::OptionsClass => container.find_first(|el| el.class_matches(&OPTIONS_CLASS)),
            Self::NearestListParent => container
                .find_first(|el| el.is_any(LISTS))
                .and_then(|list| list.parent_element()),
        }
    }
}

/// How option texts are read out of the options container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionStrategy {
    /// List items prefixed with `(a)` or `(क)`; the prefix is dropped.
    LetteredItems,
    /// Raw list item text.
    PlainItems,
    /// A run of sibling elements whose class looks like "option" or "answer".
    OptionSiblings,
}

impl OptionStrategy {
    pub const ORDER: [OptionStrategy; 3] = [Self::LetteredItems, Self::PlainItems, Self::OptionSiblings];

    pub fn apply(&self, scope: &Element<'_>) -> Vec<String> {
        match self {
            Self::LetteredItems => list_items(scope)
                .filter_map(|li| {
                    let text = li.flattened_text();
                    let caps = LETTERED_OPTION.captures(&text)?;
                    Some(caps[2].trim().to_string())
                })
                .filter(|t| !t.is_empty())
                .collect(),
            Self::PlainItems => list_items(scope)
                .map(|li| li.flattened_text())
                .filter(|t| !t.is_empty())
                .collect(),
            Self::OptionSiblings => {
                let Some(first) = scope.find_first(is_option_element) else {
                    return Vec::new();
                };
                std::iter::once(first)
                    .chain(first.following_siblings().filter(is_option_element))
                    .map(|el| strip_letter(&el.flattened_text()))
                    .filter(|t| !t.is_empty())
                    .collect()
            }
        }
    }
}

fn list_items<'a>(scope: &Element<'a>) -> impl Iterator<Item = Element<'a>> + 'a {
    scope.descendants().filter(|el| el.tag_name() == "li")
}

/// Option-like by class, but not an answer panel that happens to be named "answer".
fn is_option_element(el: &Element<'_>) -> bool {
    el.class_matches(&OPTION_ITEM_CLASS) && parse_labeled_fields(&el.flattened_text()) == (None, None)
}

fn strip_letter(text: &str) -> String {
    match LETTERED_OPTION.captures(text) {
        Some(caps) => caps[2].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Where the answer/explanation panel of an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationStrategy {
    /// The element right after a reveal trigger (button or collapsible
    /// toggle), as long as it carries a label.
    RevealSibling,
    /// A descendant carrying "Answer:" / "Explanation:" labels; the innermost
    /// one among those with the most labels.
    MarkerDescendant,
}

impl ExplanationStrategy {
    pub const ORDER: [ExplanationStrategy; 2] = [Self::RevealSibling, Self::MarkerDescendant];

    pub fn apply<'a>(&self, container: &Element<'a>) -> Option<Element<'a>> {
        match self {
            Self::RevealSibling => container
                .find_all(|el| el.tag_name() == "button" || el.class_matches(&REVEAL_CLASS))
                .into_iter()
                .filter_map(|trigger| trigger.next_element_sibling())
                .find(|panel| parse_labeled_fields(&panel.flattened_text()) != (None, None)),
            Self::MarkerDescendant => {
                let labeled: Vec<(Element<'a>, usize)> = container
                    .descendants()
                    .filter_map(|el| {
                        let text = el.flattened_text();
                        if !MARKER_KEYWORD.is_match(&text) {
                            return None;
                        }
                        let (answer, explanation) = parse_labeled_fields(&text);
                        let found = usize::from(answer.is_some()) + usize::from(explanation.is_some());
                        (found > 0).then_some((el, found))
                    })
                    .collect();

                // Prefer panels carrying both labels, then the innermost one.
                let best = labeled.iter().map(|(_, found)| *found).max()?;
                let panels = labeled.into_iter().filter(|(_, found)| *found == best).map(|(el, _)| el).collect();
                innermost(panels).into_iter().next()
            }
        }
    }
}

/// Splits panel text into `(answer, explanation)`.
///
/// The answer runs from its label to the explanation label (or the end);
/// the explanation runs from its label to the end. Empty values count as
/// absent.
pub fn parse_labeled_fields(text: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    let answer = ANSWER_FIELD.captures(text).and_then(|c| non_empty(&c[1]));
    let explanation = EXPLANATION_FIELD.captures(text).and_then(|c| non_empty(&c[1]));
    (answer, explanation)
}

/// Extracts [`RawCandidate`]s from HTML.
#[derive(Debug, Clone, Default)]
pub struct QuestionParser {
    config: ParserConfig,
}

impl QuestionParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Preprocesses and parses `html`, then extracts every quiz item.
    pub fn parse(&self, html: &str) -> Result<Vec<RawCandidate>> {
        let doc = Document::parse_with_preprocessing(html, &self.config.preprocess)?;
        Ok(self.parse_document(&doc))
    }

    /// Extracts every quiz item of an already parsed document.
    pub fn parse_document(&self, doc: &Document) -> Vec<RawCandidate> {
        let root = doc.root();
        let Some((strategy, containers)) = discover_containers(&root) else {
            tracing::debug!("no candidate containers found");
            return Vec::new();
        };

        tracing::debug!(strategy = %strategy, containers = containers.len(), "container strategy selected");

        containers
            .iter()
            .filter_map(|container| self.parse_container(container))
            .collect()
    }

    /// Extracts one item, or `None` when the container is malformed.
    pub fn parse_container(&self, container: &Element<'_>) -> Option<RawCandidate> {
        let Some(question) = QuestionTextStrategy::ORDER.iter().find_map(|s| s.apply(container)) else {
            tracing::debug!("skipping container without question text");
            return None;
        };

        let options = self.read_options(container);
        if options.len() < self.config.min_options {
            tracing::debug!(question = %question, options = options.len(), "skipping container with too few options");
            return None;
        }

        let (answer, explanation) = ExplanationStrategy::ORDER
            .iter()
            .filter_map(|s| s.apply(container))
            .map(|panel| parse_labeled_fields(&panel.flattened_text()))
            .find(|fields| *fields != (None, None))
            .unwrap_or((None, None));

        Some(RawCandidate { question, options, answer, explanation })
    }

    /// Tries every options scope in order, the container itself last, and
    /// keeps the first that yields enough options. Otherwise returns the
    /// largest short list found so the caller can report it.
    fn read_options(&self, container: &Element<'_>) -> Vec<String> {
        let min = self.config.min_options;
        let scopes = OptionsContainerStrategy::ORDER
            .iter()
            .filter_map(|s| s.apply(container))
            .chain(std::iter::once(*container));

        let mut best = Vec::new();
        for scope in scopes {
            let options: Vec<Vec<String>> = OptionStrategy::ORDER.iter().map(|s| s.apply(&scope)).collect();
            if let Some(found) = options.iter().find(|opts| opts.len() >= min.max(1)) {
                return found.clone();
            }
            if let Some(longest) = options.into_iter().max_by_key(Vec::len)
                && longest.len() > best.len()
            {
                best = longest;
            }
        }
        best
    }
}

/// Runs the container strategies in order and keeps the first non-empty result.
pub fn discover_containers<'a>(root: &Element<'a>) -> Option<(ContainerStrategy, Vec<Element<'a>>)> {
    ContainerStrategy::ORDER.iter().find_map(|strategy| {
        let found = strategy.discover(root);
        (!found.is_empty()).then_some((*strategy, found))
    })
}

/// Parses `html` with the default configuration.
pub fn parse_questions(html: &str) -> Result<Vec<RawCandidate>> {
    QuestionParser::default().parse(html)
}
