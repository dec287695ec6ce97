use std::io::Write;
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use evala::EvalaError;

/// ariadne counts columns in chars, spans are in bytes.
fn char_span(source: &str, bytes: Range<usize>) -> Range<usize> {
    let end = bytes.end.min(source.len());
    let start = bytes.start.min(end);
    let chars_before = |offset: usize| {
        source
            .get(..offset)
            .map_or(offset, |prefix| prefix.chars().count())
    };
    chars_before(start)..chars_before(end)
}

/// Writes `error` to `writer`, underlining the offending source when the
/// error points into it.
pub fn report_error<W: Write>(error: &EvalaError, source: &str, filename: Option<&str>, writer: W) {
    render(error, source, filename, Config::default(), writer);
}

fn render<W: Write>(
    error: &EvalaError,
    source: &str,
    filename: Option<&str>,
    config: Config,
    mut writer: W,
) {
    let Some(bytes) = error.span() else {
        writeln!(writer, "{error}").ok();
        return;
    };

    let name = filename.unwrap_or("<repl>");
    let span = char_span(source, bytes);
    // Static errors stop the program before it runs; runtime ones midway.
    let color = if error.is_runtime() {
        Color::Yellow
    } else {
        Color::Red
    };

    Report::build(ReportKind::Error, (name, span.clone()))
        .with_config(config)
        .with_message(error)
        .with_label(
            Label::new((name, span))
                .with_message(error.message())
                .with_color(color),
        )
        .finish()
        .write((name, Source::from(source)), &mut writer)
        .ok();
}
