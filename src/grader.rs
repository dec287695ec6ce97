//! Style grading of a script, scored out of 100.

use std::fmt::{self, Write as _};

use tracing::debug;

use crate::scanner::CommentStats;
use crate::usage::UsageCollector;

/// Numbers that never count as magic.
const WHITELIST: [f64; 2] = [0.0, 1.0];

const SECTION_MAX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    TooFew,
    TooMany,
    Good,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::TooFew => write!(f, "Too few comments"),
            Verdict::TooMany => write!(f, "Too many comments"),
            Verdict::Good => write!(f, "Good"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentAnalysis {
    pub comment_lines: usize,
    pub code_lines: usize,
    pub total_lines: usize,
    pub ratio: f64,
    pub verdict: Verdict,
}

impl CommentAnalysis {
    pub fn new(stats: &CommentStats) -> Self {
        let comment_lines = stats.comment_lines();
        let total = stats.total_lines.max(1);
        let ratio = comment_lines as f64 / total as f64;
        let verdict = if total >= 20 && ratio < 0.05 {
            Verdict::TooFew
        } else if ratio > 0.35 {
            Verdict::TooMany
        } else {
            Verdict::Good
        };
        Self {
            comment_lines,
            code_lines: stats.code_lines,
            total_lines: stats.total_lines,
            ratio,
            verdict,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnusedParam {
    pub function: String,
    pub param: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MagicNumber {
    pub lexeme: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeReport {
    pub if_count: usize,
    pub if_without_else: usize,
    pub magic_numbers: Vec<MagicNumber>,
    pub unused_locals: Vec<String>,
    pub unused_params: Vec<UnusedParam>,
    pub comments: CommentAnalysis,
}

pub struct Grader;

impl Grader {
    pub fn grade(comments: &CommentStats, usage: &UsageCollector) -> GradeReport {
        let mut unused_locals: Vec<String> = usage.writes.difference(&usage.reads).cloned().collect();
        unused_locals.sort();

        let unused_params = usage
            .functions
            .iter()
            .flat_map(|function| {
                function.unused_params().map(|param| UnusedParam {
                    function: function.name.clone(),
                    param: param.to_string(),
                })
            })
            .collect();

        let magic_numbers = usage
            .magic_numbers
            .iter()
            .filter(|m| !WHITELIST.contains(&m.value))
            .map(|m| MagicNumber {
                lexeme: m.value.to_string(),
                line: m.line,
            })
            .collect();

        let report = GradeReport {
            if_count: usage.if_count,
            if_without_else: usage.if_without_else,
            magic_numbers,
            unused_locals,
            unused_params,
            comments: CommentAnalysis::new(comments),
        };
        debug!(total = report.total(), "graded script");
        report
    }
}

impl GradeReport {
    pub fn if_score(&self) -> f64 {
        if self.if_count == 0 {
            return SECTION_MAX;
        }
        SECTION_MAX * (self.if_count - self.if_without_else) as f64 / self.if_count as f64
    }

    pub fn magic_score(&self) -> f64 {
        penalty_score(self.magic_numbers.len())
    }

    pub fn locals_score(&self) -> f64 {
        penalty_score(self.unused_locals.len())
    }

    pub fn params_score(&self) -> f64 {
        penalty_score(self.unused_params.len())
    }

    /// Best at exactly half comments, losing a point per percent away.
    pub fn comment_score(&self) -> f64 {
        (SECTION_MAX - (50.0 - self.comments.ratio * 100.0).abs()).max(0.0)
    }

    pub fn total(&self) -> f64 {
        self.if_score()
            + self.magic_score()
            + self.locals_score()
            + self.params_score()
            + self.comment_score()
    }

    pub fn summary_line(&self) -> String {
        format!("Total Grade: {}/100", format_score(self.total()))
    }

    /// Markdown report written to the review directory.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_report(&mut out);
        out
    }

    fn write_report(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "# Evala static grading")?;
        writeln!(out)?;

        section_header(out, self.if_score())?;
        writeln!(out, "If without else: {}", self.if_without_else)?;
        writeln!(out)?;

        section_header(out, self.magic_score())?;
        writeln!(out, "Magic numbers: {}", self.magic_numbers.len())?;
        for magic in &self.magic_numbers {
            writeln!(out, "  line {}: {}", magic.line, magic.lexeme)?;
        }
        writeln!(out)?;

        section_header(out, self.locals_score())?;
        writeln!(out, "Unused locals: {}", self.unused_locals.len())?;
        for name in &self.unused_locals {
            writeln!(out, "  {}", name)?;
        }
        writeln!(out)?;

        section_header(out, self.params_score())?;
        writeln!(out, "Unused parameters: {}", self.unused_params.len())?;
        for unused in &self.unused_params {
            writeln!(out, "  function {}: {}", unused.function, unused.param)?;
        }
        writeln!(out)?;

        section_header(out, self.comment_score())?;
        writeln!(out, "Comment density:")?;
        writeln!(out, "  total lines: {}", self.comments.total_lines)?;
        writeln!(out, "  code lines: {}", self.comments.code_lines)?;
        writeln!(out, "  comment lines: {}", self.comments.comment_lines)?;
        writeln!(out, "  ratio: {:.1}%", self.comments.ratio * 100.0)?;
        writeln!(out, "  verdict: {}", self.comments.verdict)?;
        writeln!(out)?;

        writeln!(out, "# {}", self.summary_line())
    }
}

fn penalty_score(count: usize) -> f64 {
    (SECTION_MAX - count as f64).max(0.0)
}

fn section_header(out: &mut String, score: f64) -> fmt::Result {
    writeln!(out, "// {}/20", format_score(score))
}

/// At most two decimals, no trailing zeros.
fn format_score(score: f64) -> String {
    let fixed = format!("{:.2}", score);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}
