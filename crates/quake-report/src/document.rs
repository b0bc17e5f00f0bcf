use std::fs;
use std::path::{Path, PathBuf};

use quake_core::errors::{ErrorInfo, QuakeError};

/// Ordered content block within the report body.
#[derive(Debug, Clone, PartialEq)]
enum Block {
    SubHeading {
        text: String,
        level: usize,
        note: String,
    },
    FigureGroup {
        title: String,
        level: usize,
        paths: Vec<PathBuf>,
    },
}

/// Assembles the evaluation report in declaration order.
///
/// The builder mirrors the notebook layout of the source workflow: a fixed
/// introduction block, named sub-headings, and named groups of rendered
/// figures. `finalize` prepends a table of contents and writes the document.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    title: String,
    introduction: Vec<(String, String)>,
    blocks: Vec<Block>,
}

impl ReportBuilder {
    /// Creates a builder for a report with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            introduction: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Sets the introduction as ordered key/value run metadata.
    pub fn add_introduction<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.introduction = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// Appends a named sub-heading with an optional note paragraph.
    pub fn add_sub_heading(
        &mut self,
        text: impl Into<String>,
        level: usize,
        note: impl Into<String>,
    ) -> &mut Self {
        self.blocks.push(Block::SubHeading {
            text: text.into(),
            level: level.max(1),
            note: note.into(),
        });
        self
    }

    /// Appends a named group of rendered figure references.
    pub fn add_result_figure(
        &mut self,
        title: impl Into<String>,
        level: usize,
        paths: Vec<PathBuf>,
    ) -> &mut Self {
        self.blocks.push(Block::FigureGroup {
            title: title.into(),
            level: level.max(1),
            paths,
        });
        self
    }

    /// Renders the document with a table of contents and writes it under
    /// `target_dir`. Returns the written path.
    pub fn finalize(&self, target_dir: &Path) -> Result<PathBuf, QuakeError> {
        fs::create_dir_all(target_dir).map_err(|err| {
            QuakeError::Report(
                ErrorInfo::new("quake_report.document_dir", err.to_string())
                    .with_context("path", target_dir.display().to_string()),
            )
        })?;
        let path = target_dir.join("report.md");
        fs::write(&path, self.render()).map_err(|err| {
            QuakeError::Report(
                ErrorInfo::new("quake_report.document_write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Ok(path)
    }

    /// Renders the full Markdown document as a string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));

        out.push_str("## Contents\n\n");
        for block in &self.blocks {
            let (text, level) = match block {
                Block::SubHeading { text, level, .. } => (text, level),
                Block::FigureGroup { title, level, .. } => (title, level),
            };
            let indent = "  ".repeat(level.saturating_sub(1));
            out.push_str(&format!("{indent}- [{text}](#{})\n", anchor(text)));
        }
        out.push('\n');

        if !self.introduction.is_empty() {
            out.push_str("| | |\n|---|---|\n");
            for (key, value) in &self.introduction {
                out.push_str(&format!("| {key} | {value} |\n"));
            }
            out.push('\n');
        }

        for block in &self.blocks {
            match block {
                Block::SubHeading { text, level, note } => {
                    out.push_str(&format!("{} {text}\n\n", heading_marker(*level)));
                    if !note.is_empty() {
                        out.push_str(&format!("{note}\n\n"));
                    }
                }
                Block::FigureGroup {
                    title,
                    level,
                    paths,
                } => {
                    out.push_str(&format!("{} {title}\n\n", heading_marker(*level)));
                    for path in paths {
                        out.push_str(&format!("![{title}]({})\n", path.display()));
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}

fn heading_marker(level: usize) -> String {
    "#".repeat(level.max(1) + 1)
}

fn anchor(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}
