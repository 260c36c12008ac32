//! HTML normalization and heading-aware sectioning.

use magnet_core::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").unwrap());

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*){2,}").unwrap());

/// Convert HTML to Markdown, dropping scripts, styles and page chrome.
pub fn normalize_html(html: &str) -> AppResult<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec![
            "script", "style", "noscript", "head", "nav", "iframe", "svg", "form",
        ])
        .build();

    let markdown = converter
        .convert(html)
        .map_err(|e| AppError::Splitter(format!("Failed to convert HTML: {}", e)))?;

    Ok(BLANK_RUN_RE.replace_all(&markdown, "\n\n").trim().to_string())
}

/// A run of body text under a chain of headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingSection {
    /// Enclosing headings, outermost first, as (level, text)
    pub headings: Vec<(usize, String)>,
    pub body: String,
}

impl HeadingSection {
    /// Markdown heading lines for this section followed by a blank line.
    pub fn heading_prefix(&self) -> String {
        if self.headings.is_empty() {
            return String::new();
        }

        let lines: Vec<String> = self
            .headings
            .iter()
            .map(|(level, text)| format!("{} {}", "#".repeat(*level), text))
            .collect();
        format!("{}\n\n", lines.join("\n"))
    }
}

/// Split Markdown at `#`..`######` headings.
///
/// Sections whose body is blank (a heading immediately followed by another
/// heading) are dropped. Headings inside fenced code blocks are body text.
pub fn split_by_headings(markdown: &str) -> Vec<HeadingSection> {
    let mut sections = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        let heading = if in_fence {
            None
        } else {
            HEADING_RE.captures(line)
        };

        match heading {
            Some(caps) => {
                flush(&mut sections, &stack, &mut body);
                let level = caps[1].len();
                stack.retain(|(l, _)| *l < level);
                stack.push((level, caps[2].to_string()));
            }
            None => body.push(line),
        }
    }
    flush(&mut sections, &stack, &mut body);

    sections
}

fn flush(sections: &mut Vec<HeadingSection>, stack: &[(usize, String)], body: &mut Vec<&str>) {
    let text = body.join("\n");
    body.clear();

    let text = text.trim();
    if text.is_empty() {
        return;
    }

    sections.push(HeadingSection {
        headings: stack.to_vec(),
        body: text.to_string(),
    });
}
