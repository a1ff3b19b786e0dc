/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script tags
    pub remove_scripts: bool,
    /// Whether to remove style tags
    pub remove_styles: bool,
    /// Whether to remove noscript and template tags
    pub remove_noscript: bool,
    /// Whether to remove iframe and svg tags
    pub remove_embeds: bool,
    /// Whether to remove HTML comments
    pub remove_comments: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_scripts: true, remove_styles: true, remove_noscript: true, remove_embeds: true, remove_comments: true }
    }
}

/// Preprocess HTML by removing elements that never carry quiz text.
///
/// Hidden elements are kept on purpose: answer panels are usually collapsed
/// with `display:none` until the reveal button is clicked.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut selectors: Vec<&str> = Vec::new();
    if config.remove_scripts {
        selectors.push("script");
    }
    if config.remove_styles {
        selectors.push("style");
    }
    if config.remove_noscript {
        selectors.extend(["noscript", "template"]);
    }
    if config.remove_embeds {
        selectors.extend(["iframe", "svg"]);
    }

    if selectors.is_empty() && !config.remove_comments {
        return html.to_string();
    }

    let mut output = String::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: selectors
                .iter()
                .map(|sel| {
                    lol_html::element!(sel, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            document_content_handlers: if config.remove_comments {
                vec![lol_html::doc_comments!(|c| {
                    c.remove();
                    Ok(())
                })]
            } else {
                Vec::new()
            },
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}
