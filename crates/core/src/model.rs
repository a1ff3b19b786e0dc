//! Classified quiz records.

use serde::{Deserialize, Serialize};

use crate::formatters::text::{TextFormatter, join_blocks};
use crate::matcher::{AnswerMatch, match_answer};
use crate::question::RawCandidate;

/// One option of a question with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCandidate {
    /// Sequential label: `a`, `b`, ... `z`, `aa`, `ab`, ...
    pub label: String,
    pub text: String,
}

/// Label for the option at `index`.
pub fn option_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        n -= 1;
        label.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// Which export a question lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// A correct option was determined.
    Main,
    /// No option could be matched to the stated answer.
    Undetected,
}

/// A quiz item after answer matching.
///
/// `correct`, when set, always indexes into `options`; the only way to set it
/// is through [`ExtractedQuestion::set_correct`] or answer matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedQuestion {
    question: String,
    options: Vec<OptionCandidate>,
    correct: Option<usize>,
    explanation: Option<String>,
}

impl ExtractedQuestion {
    pub fn new<I, S>(question: impl Into<String>, options: I, explanation: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options
            .into_iter()
            .enumerate()
            .map(|(i, text)| OptionCandidate { label: option_label(i), text: text.into() })
            .collect();
        Self { question: question.into(), options, correct: None, explanation }
    }

    /// Matches the candidate's answer text against its options.
    pub fn from_candidate(candidate: RawCandidate) -> Self {
        let RawCandidate { question, options, answer, explanation } = candidate;
        let matched: Option<AnswerMatch> = match_answer(&options, answer.as_deref());
        let mut extracted = Self::new(question, options, explanation);
        extracted.correct = matched.map(|m| m.index);
        extracted
    }

    /// Marks option `index` as correct. Returns `false` (and changes nothing)
    /// when the index is out of range.
    pub fn set_correct(&mut self, index: usize) -> bool {
        if index < self.options.len() {
            self.correct = Some(index);
            true
        } else {
            false
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[OptionCandidate] {
        &self.options
    }

    pub fn correct(&self) -> Option<usize> {
        self.correct
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn bucket(&self) -> Bucket {
        if self.correct.is_some() { Bucket::Main } else { Bucket::Undetected }
    }
}

/// Rendered blocks split by bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    pub main: Vec<String>,
    pub undetected: Vec<String>,
}

impl ClassifiedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `question` and appends it to its bucket.
    pub fn push(&mut self, question: &ExtractedQuestion, formatter: &TextFormatter) -> Bucket {
        let block = formatter.format(question);
        let bucket = question.bucket();
        match bucket {
            Bucket::Main => self.main.push(block),
            Bucket::Undetected => self.undetected.push(block),
        }
        bucket
    }

    pub fn len(&self) -> usize {
        self.main.len() + self.undetected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The main export: blocks separated by one blank line.
    pub fn main_document(&self) -> String {
        join_blocks(&self.main)
    }

    /// The undetected export: blocks separated by one blank line.
    pub fn undetected_document(&self) -> String {
        join_blocks(&self.undetected)
    }
}

/// Classifies every candidate of a page with the given formatter.
pub fn classify<I>(candidates: I, formatter: &TextFormatter) -> (ClassifiedResult, Vec<ExtractedQuestion>)
where
    I: IntoIterator<Item = RawCandidate>,
{
    let mut result = ClassifiedResult::new();
    let questions: Vec<ExtractedQuestion> = candidates.into_iter().map(ExtractedQuestion::from_candidate).collect();
    for q in &questions {
        result.push(q, formatter);
    }
    (result, questions)
}
