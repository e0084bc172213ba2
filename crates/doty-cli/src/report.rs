//! Conversion of stage errors into diagnostics.

use doty_diag::Diagnostic;
use doty_lexer::LexError;
use doty_names::ResolveError;
use doty_parser::ParseError;
use doty_typeck::TypeError;

pub(crate) fn lex_error(err: LexError) -> Diagnostic {
    Diagnostic::error(err.to_string()).at(err.span())
}

pub(crate) fn parse_error(err: ParseError) -> Diagnostic {
    Diagnostic::error(err.message).at(err.span)
}

pub(crate) fn resolve_error(err: ResolveError) -> Diagnostic {
    let diag = Diagnostic::error(err.to_string()).at(err.span());
    match err {
        ResolveError::Redefinition { name, previous, .. } => diag.with_note(
            previous,
            format!("previous definition of `{}` was here", name),
        ),
        ResolveError::UnknownName { .. } => diag,
    }
}

pub(crate) fn type_error(err: TypeError) -> Diagnostic {
    Diagnostic::error(err.to_string()).at(err.span())
}
