//! Ariadne-based diagnostic rendering for call handle errors.
//!
//! Renders any `HandleError` into a labelled report with a stable error
//! code. The errors themselves carry no source positions; the caller passes
//! the span of the expression or declaration being checked.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use rowan::TextRange;

use crate::error::{
    BindError, ConstructionError, ConversionError, EncodingError, HandleError, UsageError,
};

// ── Error Codes ────────────────────────────────────────────────────────

/// Stable error code for each variant.
pub fn error_code(err: &HandleError) -> &'static str {
    match err {
        HandleError::Construction(e) => match e {
            ConstructionError::InvalidModifierCombination { .. } => "E0301",
            ConstructionError::InvalidOutOnReturn => "E0302",
            ConstructionError::VoidParameter { .. } => "E0303",
            ConstructionError::ByRefVoidReturn => "E0304",
        },
        HandleError::Conversion(e) => match e {
            ConversionError::ExplicitConversionRequired { .. } => "E0310",
            ConversionError::ParameterCount { .. } => "E0311",
            ConversionError::ModeMismatch { .. } => "E0312",
            ConversionError::TypeMismatch { .. } => "E0313",
            ConversionError::ReturnMismatch { .. } => "E0314",
            ConversionError::ConventionMismatch { .. } => "E0315",
        },
        HandleError::Bind(e) => match e {
            BindError::AmbiguousGroup { .. } => "E0320",
            BindError::NoApplicableCandidate { .. } => "E0321",
            BindError::Ambiguous { .. } => "E0322",
            BindError::SignatureMismatch { .. } => "E0323",
        },
        HandleError::Encoding(e) => match e {
            EncodingError::InvalidOutOnReturn => "E0330",
            EncodingError::ConflictingMarkers { .. } => "E0331",
            EncodingError::MarkerWithoutReference { .. } => "E0332",
            EncodingError::UnknownConvention { .. } => "E0333",
        },
        HandleError::Usage(e) => match e {
            UsageError::RequiresUnsafeContext { .. } => "E0340",
            UsageError::HandleAsTypeArgument { .. } => "E0341",
            UsageError::HandleBoxing { .. } => "E0342",
        },
    }
}

// ── Labels and Help ────────────────────────────────────────────────────

fn conversion_label(err: &ConversionError) -> String {
    match err {
        ConversionError::ExplicitConversionRequired { .. } => {
            "implicit conversion from `void*`".to_string()
        }
        ConversionError::ParameterCount { source, target } => {
            format!("expected {} parameter(s), found {}", target, source)
        }
        ConversionError::ModeMismatch {
            index,
            source,
            target,
        } => format!(
            "parameter {} is `{}` here but `{}` in the target",
            index + 1,
            source,
            target
        ),
        ConversionError::TypeMismatch {
            index,
            source,
            target,
        } => format!("parameter {}: expected `{}`, found `{}`", index + 1, target, source),
        ConversionError::ReturnMismatch { source, target } => {
            format!("expected `{}`, found `{}`", target, source)
        }
        ConversionError::ConventionMismatch { source, target } => {
            format!("`{}` is not `{}`", source, target)
        }
    }
}

fn label_message(err: &HandleError) -> String {
    match err {
        HandleError::Construction(e) => match e {
            ConstructionError::InvalidModifierCombination { position, .. } => {
                format!("not a valid passing mode for the {}", position)
            }
            ConstructionError::InvalidOutOnReturn => "`out` return".to_string(),
            ConstructionError::VoidParameter { index } => {
                format!("parameter {} is `void`", index + 1)
            }
            ConstructionError::ByRefVoidReturn => "`void` returned by reference".to_string(),
        },
        HandleError::Conversion(e) => conversion_label(e),
        HandleError::Bind(e) => match e {
            BindError::AmbiguousGroup { count, .. } => {
                format!("{} static overloads", count)
            }
            BindError::NoApplicableCandidate { .. } => "no matching static overload".to_string(),
            BindError::Ambiguous { candidates, .. } => {
                format!("{} overloads match equally well", candidates.len())
            }
            BindError::SignatureMismatch { reason, .. } => conversion_label(reason),
        },
        HandleError::Encoding(_) => "in this persisted signature".to_string(),
        HandleError::Usage(e) => match e {
            UsageError::RequiresUnsafeContext { .. } => "pointer type in safe code".to_string(),
            UsageError::HandleAsTypeArgument { .. } => "handle type as type argument".to_string(),
            UsageError::HandleBoxing { .. } => "handle converted to `object`".to_string(),
        },
    }
}

fn help_message(err: &HandleError) -> Option<String> {
    match err {
        HandleError::Conversion(ConversionError::ExplicitConversionRequired { target }) => {
            Some(format!("cast explicitly: `({})ptr`", target))
        }
        HandleError::Conversion(ConversionError::ConventionMismatch { .. })
        | HandleError::Bind(BindError::SignatureMismatch {
            reason: ConversionError::ConventionMismatch { .. },
            ..
        }) => Some("calling conventions must match exactly".to_string()),
        HandleError::Construction(ConstructionError::InvalidOutOnReturn) => {
            Some("return by `ref` instead".to_string())
        }
        HandleError::Bind(BindError::AmbiguousGroup { .. }) => {
            Some("assign to a typed handle to select an overload".to_string())
        }
        HandleError::Usage(UsageError::RequiresUnsafeContext { .. }) => {
            Some("move this into an `unsafe` context".to_string())
        }
        _ => None,
    }
}

// ── Span Helpers ───────────────────────────────────────────────────────

fn text_range_to_range(range: TextRange) -> Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    start..end
}

// ── Main Rendering Function ────────────────────────────────────────────

/// Render an error at `span` into a diagnostic string.
///
/// The output is colorless so it can be compared in tests.
pub fn render_diagnostic(
    error: &HandleError,
    span: TextRange,
    source: &str,
    _filename: &str,
) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };
    let range = clamp(text_range_to_range(span));

    let mut builder = Report::build(ReportKind::Error, range.clone())
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(label_message(error))
                .with_color(Color::Red),
        );
    if let Some(help) = help_message(error) {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8_lossy(&buf).into_owned()
}

/// Render several errors, each with its own span.
pub fn render_diagnostics(
    errors: &[(HandleError, TextRange)],
    source: &str,
    filename: &str,
) -> Vec<String> {
    errors
        .iter()
        .map(|(error, span)| render_diagnostic(error, *span, source, filename))
        .collect()
}
