//! Ariadne-based rendering for resolution errors.
//!
//! Turns each [`ResolutionError`] into a formatted, labeled report
//! against the original source text. Messages stay terse; a help line
//! is attached where a concrete fix exists.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::ResolutionError;

/// Rendering options for diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticOptions {
    /// Whether to emit ANSI color codes.
    pub color: bool,
}

impl DiagnosticOptions {
    /// Colorless output, for tests and non-tty writers.
    pub fn colorless() -> Self {
        DiagnosticOptions { color: false }
    }
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions { color: true }
    }
}

/// Assign a unique error code to each variant.
fn error_code(err: &ResolutionError) -> &'static str {
    match err {
        ResolutionError::UndeterminedType { .. } => "R0001",
        ResolutionError::NoMatchingInstance { .. } => "R0002",
        ResolutionError::ConstructorNotFound { .. } => "R0003",
        ResolutionError::MethodNotFound { .. } => "R0004",
        ResolutionError::FieldNotFound { .. } => "R0005",
    }
}

/// Render one resolution error into a formatted diagnostic string.
pub fn render_diagnostic(
    error: &ResolutionError,
    source: &str,
    filename: &str,
    opts: &DiagnosticOptions,
) -> String {
    let config = Config::default().with_color(opts.color);
    let source_len = source.len();

    // Clamp the span to the source and keep it non-empty; ariadne
    // needs at least one character to point at.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let code = error_code(error);
    let span = clamp(error.span().range());

    let report = match error {
        ResolutionError::UndeterminedType { ty, .. } => {
            Report::build(ReportKind::Error, (filename, span.clone()))
                .with_code(code)
                .with_message(format!("unable to determine the type of `{}`", ty))
                .with_config(config)
                .with_label(
                    Label::new((filename, span))
                        .with_message("the type here never became fully known")
                        .with_color(Color::Red),
                )
                .with_help("add a type annotation to pin the type down")
                .finish()
        }

        ResolutionError::NoMatchingInstance { sym, receiver, .. } => {
            Report::build(ReportKind::Error, (filename, span.clone()))
                .with_code(code)
                .with_message(format!("no instance defines `{}` for `{}`", sym, receiver))
                .with_config(config)
                .with_label(
                    Label::new((filename, span))
                        .with_message(format!("no instance covers `{}`", receiver))
                        .with_color(Color::Red),
                )
                .with_help(format!(
                    "define an instance of `{}` for `{}`",
                    sym.trait_name, receiver
                ))
                .finish()
        }

        ResolutionError::ConstructorNotFound { class, .. } => {
            Report::build(ReportKind::Error, (filename, span.clone()))
                .with_code(code)
                .with_message(format!("{}", error))
                .with_config(config)
                .with_label(
                    Label::new((filename, span))
                        .with_message(format!("`{}` has no matching constructor", class))
                        .with_color(Color::Red),
                )
                .with_help(
                    "argument types must match a declared constructor exactly; \
                     primitives never box implicitly",
                )
                .finish()
        }

        ResolutionError::MethodNotFound { name, receiver, is_static, .. } => {
            let qualifier = if *is_static { "static method" } else { "method" };
            Report::build(ReportKind::Error, (filename, span.clone()))
                .with_code(code)
                .with_message(format!("{}", error))
                .with_config(config)
                .with_label(
                    Label::new((filename, span))
                        .with_message(format!(
                            "`{}` has no matching {} `{}`",
                            receiver, qualifier, name
                        ))
                        .with_color(Color::Red),
                )
                .with_help(
                    "argument types must match a declared overload exactly; \
                     primitives never box implicitly",
                )
                .finish()
        }

        ResolutionError::FieldNotFound { name, receiver, .. } => {
            Report::build(ReportKind::Error, (filename, span.clone()))
                .with_code(code)
                .with_message(format!("{}", error))
                .with_config(config)
                .with_label(
                    Label::new((filename, span))
                        .with_message(format!("`{}` has no field `{}`", receiver, name))
                        .with_color(Color::Red),
                )
                .finish()
        }
    };

    let mut buf = Vec::new();
    let cache = (filename, Source::from(source));
    report.write(cache, &mut buf).expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

/// Render every error in order.
pub fn render_diagnostics(
    errors: &[ResolutionError],
    source: &str,
    filename: &str,
    opts: &DiagnosticOptions,
) -> Vec<String> {
    errors.iter().map(|e| render_diagnostic(e, source, filename, opts)).collect()
}
