//! Best-effort Markdown normalization.
//!
//! Outside code blocks: trailing whitespace trimmed, `*`/`+` bullets rewritten
//! to `-`, headings surrounded by blank lines, blank-line runs collapsed.
//! Code blocks are located with pulldown-cmark and left untouched. The result
//! is re-parsed and rejected if the heading outline changed.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use std::ops::Range;

use crate::types::{GuideError, Result};

pub trait MarkdownFormatter: Send + Sync {
    fn format(&self, markdown: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkFormatter;

struct Outline {
    headings: Vec<HeadingLevel>,
    code_blocks: Vec<Range<usize>>,
}

fn outline(markdown: &str) -> Outline {
    let mut headings = Vec::new();
    let mut code_blocks = Vec::new();

    for (event, range) in Parser::new_ext(markdown, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => headings.push(level),
            Event::Start(Tag::CodeBlock(_)) => code_blocks.push(range),
            _ => {}
        }
    }

    Outline {
        headings,
        code_blocks,
    }
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].chars().next().is_none_or(|c| c == ' ')
}

fn is_thematic_break(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3 && marks.iter().all(|&c| c == marks[0]) && matches!(marks[0], '*' | '-' | '_')
}

fn normalize_bullet(line: &str) -> String {
    let indent = line.len() - line.trim_start().len();
    let body = &line[indent..];
    if is_thematic_break(body) {
        return line.to_string();
    }
    match body.strip_prefix("* ").or_else(|| body.strip_prefix("+ ")) {
        Some(rest) => format!("{}- {}", &line[..indent], rest),
        None => line.to_string(),
    }
}

impl MarkdownFormatter for CommonMarkFormatter {
    fn format(&self, markdown: &str) -> Result<String> {
        let before = outline(markdown);
        let mut lines: Vec<String> = Vec::new();
        let mut offset = 0;

        for raw in markdown.split_inclusive('\n') {
            let start = offset;
            offset += raw.len();
            let line = raw.trim_end_matches(['\n', '\r']);

            if before.code_blocks.iter().any(|r| r.contains(&start)) {
                lines.push(line.to_string());
                continue;
            }

            let line = normalize_bullet(line.trim_end());
            let blank = line.is_empty();
            let prev_blank = lines.last().is_none_or(|l| l.is_empty());

            if blank && prev_blank {
                continue;
            }
            if is_heading(&line) && !prev_blank {
                lines.push(String::new());
            } else if !blank && lines.last().is_some_and(|l| is_heading(l)) {
                lines.push(String::new());
            }
            lines.push(line);
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Ok(String::new());
        }

        let mut formatted = lines.join("\n");
        formatted.push('\n');

        if outline(&formatted).headings != before.headings {
            return Err(GuideError::Format(
                "normalization changed the heading outline".to_string(),
            ));
        }
        Ok(formatted)
    }
}
