use crate::model::ExtractedQuestion;

/// Configuration for plain text question blocks
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Render at most this many options (None = all). The correct option is
    /// always rendered, even past the cap.
    pub max_options: Option<usize>,

    /// Appended to the line of the correct option
    pub correct_marker: String,

    /// Prefix of the explanation line
    pub explanation_prefix: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { max_options: None, correct_marker: " *".to_string(), explanation_prefix: "Ex: ".to_string() }
    }
}

/// Plain text formatter for classified questions
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    /// Render one question as a text block
    pub fn format(&self, question: &ExtractedQuestion) -> String {
        format_question(question, &self.config)
    }

    /// Render questions and join them into one export document
    pub fn format_all<'a, I>(&self, questions: I) -> String
    where
        I: IntoIterator<Item = &'a ExtractedQuestion>,
    {
        let blocks: Vec<String> = questions.into_iter().map(|q| self.format(q)).collect();
        join_blocks(&blocks)
    }
}

/// Render a question block:
///
/// ```text
/// Capital of France?
/// (a) Paris *
/// (b) Rome
/// Ex: Seat of government.
/// ```
pub fn format_question(question: &ExtractedQuestion, config: &TextConfig) -> String {
    let cap = config.max_options.unwrap_or(usize::MAX);
    let correct = question.correct();

    let mut lines = Vec::with_capacity(question.options().len() + 2);
    lines.push(question.question().to_string());

    for (i, option) in question.options().iter().enumerate() {
        let is_correct = correct == Some(i);
        if i >= cap && !is_correct {
            continue;
        }

        let mut line = format!("({}) {}", option.label, option.text);
        if is_correct {
            line.push_str(&config.correct_marker);
        }
        lines.push(line);
    }

    if let Some(explanation) = question.explanation() {
        lines.push(format!("{}{}", config.explanation_prefix, explanation));
    }

    lines.join("\n")
}

/// Join blocks with exactly one blank line between them
pub fn join_blocks<S: AsRef<str>>(blocks: &[S]) -> String {
    blocks
        .iter()
        .map(|b| b.as_ref().trim_end_matches('\n'))
        .collect::<Vec<_>>()
        .join("\n\n")
}
