//! Model checks
//!
//! Reports the conditions the generators tolerate silently (dangling
//! aggregations, conflicting multiplicities) or assume absent (missing or
//! repeated roots, duplicate names, cycles), without failing.

use std::collections::HashSet;
use xmigen_core::{
    ClassTable, Diagnostic, DiagnosticCode, ModelError, Multiplicity, Report, SeverityThreshold,
};
use xmigen_xmi::{parse_document, ContainmentTree, ParsedDocument};

/// Check a parsed document
pub fn check_model(document: &ParsedDocument, severity: &SeverityThreshold) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    check_duplicates(document, &mut diagnostics);
    check_roots(&document.classes, &mut diagnostics);
    check_edges(document, &mut diagnostics);

    let classes = document.clone().into_class_table();
    let tree = ContainmentTree::new(&classes);
    check_multiplicity_conflicts(&classes, &mut diagnostics);
    check_cycles(&tree, &mut diagnostics);
    check_reachability(&tree, &mut diagnostics);

    for diagnostic in &mut diagnostics {
        diagnostic.severity = severity.get_severity(diagnostic.code, diagnostic.severity);
    }

    diagnostics
}

/// Parse and check a document, collecting the results into a report
///
/// Fails only when the document cannot be parsed at all.
pub fn check_document(text: &str, severity: &SeverityThreshold) -> Result<Report, ModelError> {
    let document = parse_document(text)?;
    let diagnostics = check_model(&document, severity);

    tracing::info!(
        classes = document.classes.len(),
        diagnostics = diagnostics.len(),
        "checked model"
    );

    Ok(Report::from_diagnostics(diagnostics)
        .with_model_size(document.classes.len(), document.edges.len())
        .with_source(text))
}

fn check_duplicates(document: &ParsedDocument, diagnostics: &mut Vec<Diagnostic>) {
    let mut reported = HashSet::new();

    for name in &document.duplicates {
        if reported.insert(name.as_str()) {
            diagnostics.push(
                Diagnostic::of(
                    DiagnosticCode::DuplicateClass,
                    format!("Class '{}' is declared more than once; the last declaration is used", name),
                )
                .with_class(name.clone()),
            );
        }
    }
}

fn check_roots(classes: &ClassTable, diagnostics: &mut Vec<Diagnostic>) {
    let roots = classes.roots();

    match roots.as_slice() {
        [] => diagnostics.push(Diagnostic::of(
            DiagnosticCode::NoRootClass,
            "No class is marked isRoot=\"true\"; the instance will be empty and metadata cannot be generated",
        )),
        [_] => {}
        [first, rest @ ..] => diagnostics.push(
            Diagnostic::of(
                DiagnosticCode::MultipleRoots,
                format!(
                    "{} classes are marked as root; '{}' is used",
                    roots.len(),
                    first.name
                ),
            )
            .with_class(first.name.clone())
            .with_related(rest.iter().map(|c| c.name.clone()).collect()),
        ),
    }
}

fn check_edges(document: &ParsedDocument, diagnostics: &mut Vec<Diagnostic>) {
    for edge in &document.edges {
        if !document.classes.contains(&edge.target) {
            diagnostics.push(
                Diagnostic::of(
                    DiagnosticCode::DanglingTarget,
                    format!(
                        "Aggregation of '{}' targets unknown class '{}' and is ignored",
                        edge.source, edge.target
                    ),
                )
                .with_class(edge.target.clone())
                .with_related(vec![edge.source.clone()]),
            );
        }

        if !document.classes.contains(&edge.source) {
            diagnostics.push(
                Diagnostic::of(
                    DiagnosticCode::DanglingSource,
                    format!(
                        "Aggregation into '{}' has unknown source class '{}' and is ignored",
                        edge.target, edge.source
                    ),
                )
                .with_class(edge.source.clone())
                .with_related(vec![edge.target.clone()]),
            );
        }

        for token in [&edge.source_multiplicity, &edge.target_multiplicity] {
            if !Multiplicity::is_well_formed(token) {
                diagnostics.push(
                    Diagnostic::of(
                        DiagnosticCode::InvalidMultiplicity,
                        format!(
                            "Aggregation {} -> {} has invalid multiplicity '{}'",
                            edge.source, edge.target, token
                        ),
                    )
                    .with_class(edge.source.clone())
                    .with_comparison("n or n..m", token.clone()),
                );
            }
        }
    }
}

fn check_multiplicity_conflicts(classes: &ClassTable, diagnostics: &mut Vec<Diagnostic>) {
    for class in classes.iter() {
        let containments: Vec<(&str, &Multiplicity)> = classes
            .iter()
            .flat_map(|parent| {
                parent
                    .children
                    .iter()
                    .filter(|child| child.class == class.name)
                    .map(move |child| (parent.name.as_str(), &child.multiplicity))
            })
            .collect();

        let (Some((_, first)), Some((_, last))) = (containments.first(), containments.last()) else {
            continue;
        };

        if containments.iter().any(|(_, m)| m != first) {
            diagnostics.push(
                Diagnostic::of(
                    DiagnosticCode::ConflictingMultiplicity,
                    format!(
                        "Class '{}' is contained with different multiplicities; metadata uses {}",
                        class.name, last
                    ),
                )
                .with_class(class.name.clone())
                .with_comparison(first.to_string(), last.to_string())
                .with_related(containments.iter().map(|(parent, _)| parent.to_string()).collect()),
            );
        }
    }
}

fn check_cycles(tree: &ContainmentTree<'_>, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(path) = tree.find_cycle() {
        diagnostics.push(
            Diagnostic::of(
                DiagnosticCode::ContainmentCycle,
                format!("Containment cycle: {}", path.join(" -> ")),
            )
            .with_class(path[0].clone())
            .with_related(path),
        );
    }
}

fn check_reachability(tree: &ContainmentTree<'_>, diagnostics: &mut Vec<Diagnostic>) {
    for name in tree.unreachable() {
        // Containers of an unreachable class are unreachable too
        let containers: Vec<String> = tree.ancestors(name).into_iter().map(str::to_string).collect();

        diagnostics.push(
            Diagnostic::of(
                DiagnosticCode::UnreachableClass,
                format!("Class '{}' is not reachable from the root and is absent from the instance", name),
            )
            .with_class(name)
            .with_related(containers),
        );
    }
}
