use crate::diagnostic::{Diagnostic, DiagnosticBuilder, Span};
use crate::structures::ast::Program;
use crate::structures::symbol_table::SymbolTable;

/// Finds the first pair of items sharing a name, returning the spans of the
/// original and of the duplicate together with the name.
fn first_duplicate<'a, I, T: 'a>(
    items: I,
    key: impl Fn(&T) -> (&str, Span),
) -> Option<(String, Span, Span)>
where
    I: IntoIterator<Item = &'a T>,
{
    let keyed: Vec<(&str, Span)> = items.into_iter().map(|item| key(item)).collect();
    for (j, (name, span)) in keyed.iter().enumerate() {
        if let Some((_, first)) = keyed[..j].iter().find(|(n, _)| n == name) {
            return Some(((*name).to_owned(), *first, *span));
        }
    }
    None
}

pub fn check(program: &Program, _table: &SymbolTable) -> Vec<Diagnostic> {
    let mut reports = Vec::new();

    if let Some((name, first, dup)) =
        first_duplicate(&program.imports, |i| (i.last_segment(), i.span))
    {
        reports.push(DiagnosticBuilder::new(dup).build_duplicated_import(&name, first));
    }

    let class = &program.class;

    if let Some((name, first, dup)) =
        first_duplicate(&class.fields, |f| (f.name.data.as_str(), f.span))
    {
        reports.push(DiagnosticBuilder::new(dup).build_duplicated_field(&name, first));
    }

    if let Some((name, first, dup)) =
        first_duplicate(&class.methods, |m| (m.name.data.as_str(), m.prototype_span))
    {
        reports.push(DiagnosticBuilder::new(dup).build_duplicated_method(&name, first));
    }

    for method in &class.methods {
        if let Some((name, first, dup)) =
            first_duplicate(&method.params, |p| (p.name.data.as_str(), p.span))
        {
            reports.push(
                DiagnosticBuilder::new(dup).build_duplicated_parameter(
                    &name,
                    &method.name.data,
                    first,
                ),
            );
        }

        if let Some((name, first, dup)) =
            first_duplicate(&method.locals, |l| (l.name.data.as_str(), l.span))
        {
            reports.push(
                DiagnosticBuilder::new(dup).build_duplicated_local(&name, &method.name.data, first),
            );
        }
    }

    reports
}
