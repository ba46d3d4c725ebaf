//! Integration tests for model loading and artifact generation

use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::PathBuf;
use xmigen_core::{ClassTable, MetaEntry, ModelError, Parameter, SeverityThreshold, DiagnosticCode};
use xmigen_engine::{
    build_metadata, check_document, derive_instance, derive_metadata, load_model, Pipeline,
};
use xmigen_xmi::{parse_document, ContainmentTree};

fn fixture(relative: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/project-model")
        .join(relative);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
}

fn fixture_model() -> ClassTable {
    load_model(&fixture("input/test_input.xml")).unwrap()
}

/// `C0` (root) contains `C1`, which contains `C2`, and so on
fn chain(depth: usize) -> String {
    let mut text = String::from("<Model>\n");
    for i in 0..depth {
        text.push_str(&format!(
            "<Class name=\"C{}\" isRoot=\"{}\"><Attribute name=\"level\" type=\"int\"/></Class>\n",
            i,
            i == 0
        ));
    }
    for i in 1..depth {
        text.push_str(&format!(
            "<Aggregation source=\"C{}\" target=\"C{}\" sourceMultiplicity=\"1\" targetMultiplicity=\"0..1\"/>\n",
            i,
            i - 1
        ));
    }
    text.push_str("</Model>");
    text
}

#[test]
fn fixture_instance_matches_expected() {
    assert_eq!(
        derive_instance(&fixture_model()).unwrap(),
        fixture("expected/config.xml")
    );
}

#[test]
fn fixture_metadata_matches_expected() {
    assert_eq!(
        derive_metadata(&fixture_model()).unwrap(),
        fixture("expected/meta.json")
    );
}

#[test]
fn fixture_dangling_aggregation_is_ignored() {
    let classes = fixture_model();

    assert!(!classes.contains("Backlog"));
    let task_parents: Vec<&str> = classes
        .iter()
        .filter(|c| c.children.iter().any(|child| child.class == "Task"))
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(task_parents, vec!["Milestone"]);
}

#[test]
fn fixture_check_reports_dangling_target_only() {
    let report = check_document(&fixture("input/test_input.xml"), &SeverityThreshold::default()).unwrap();

    let codes: Vec<DiagnosticCode> = report.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![DiagnosticCode::DanglingTarget]);
    assert_eq!(report.summary.classes, 4);
    assert_eq!(report.summary.aggregations, 4);
    assert!(!report.has_errors());
}

#[test]
fn metadata_is_a_reverse_topological_order() {
    let classes = fixture_model();
    let entries = build_metadata(&classes).unwrap();

    assert_eq!(entries.len(), classes.len());
    assert!(entries.last().unwrap().is_root);

    let position: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.class.as_str(), i))
        .collect();
    assert_eq!(position.len(), entries.len(), "no class appears twice");

    for class in classes.iter() {
        for child in &class.children {
            assert!(
                position[child.class.as_str()] < position[class.name.as_str()],
                "{} must precede {}",
                child.class,
                class.name
            );
        }
    }
}

#[test]
fn class_parameters_name_existing_entries() {
    let entries: Vec<MetaEntry> = build_metadata(&fixture_model()).unwrap();

    for parameter in entries.iter().flat_map(|e| &e.parameters).filter(|p| p.is_class()) {
        assert!(
            entries.iter().any(|e| e.class == parameter.name),
            "no entry for class parameter {}",
            parameter.name
        );
    }
}

#[test]
fn metadata_json_parses_back() {
    let text = derive_metadata(&fixture_model()).unwrap();
    let entries: Vec<MetaEntry> = serde_json::from_str(&text).unwrap();

    assert_eq!(entries[0].class, "Assignee");
    assert_eq!(entries[0].parameters, vec![Parameter {
        name: "email".into(),
        type_name: "string".into(),
    }]);
}

#[test]
fn pipeline_is_idempotent() {
    let text = fixture("input/test_input.xml");
    let pipeline = Pipeline::default();

    assert_eq!(pipeline.run(&text).unwrap(), pipeline.run(&text).unwrap());
}

#[test]
fn project_task_scenario() {
    let text = r#"<Model>
        <Class name="Project" isRoot="true"/>
        <Class name="Task" isRoot="false"><Attribute name="title" type="string"/></Class>
        <Aggregation source="Task" target="Project" sourceMultiplicity="1" targetMultiplicity="0..*"/>
    </Model>"#;
    let classes = load_model(text).unwrap();

    assert_eq!(
        derive_instance(&classes).unwrap(),
        "<Project><Task><title>string</title></Task></Project>"
    );

    let entries = build_metadata(&classes).unwrap();
    let summary: Vec<(&str, &str, &str)> = entries
        .iter()
        .map(|e| (e.class.as_str(), e.min.as_str(), e.max.as_str()))
        .collect();
    assert_eq!(summary, vec![("Task", "0", "*"), ("Project", "1", "1")]);
}

#[test]
fn unknown_target_leaves_classes_untouched() {
    let text = r#"<Model>
        <Class name="Project" isRoot="true"/>
        <Class name="Task"/>
        <Aggregation source="Task" target="Nowhere" sourceMultiplicity="1" targetMultiplicity="0..*"/>
    </Model>"#;

    let parsed = parse_document(text).unwrap();
    let classes = load_model(text).unwrap();

    assert_eq!(parsed.classes, classes);
    assert!(classes.iter().all(|c| c.children.is_empty()));
}

#[test]
fn no_root_scenario() {
    let text = r#"<Model>
        <Class name="Task"><Attribute name="title" type="string"/></Class>
    </Model>"#;
    let classes = load_model(text).unwrap();

    assert_eq!(derive_instance(&classes).unwrap(), "");
    assert_eq!(derive_metadata(&classes).unwrap_err(), ModelError::RootRequired);
    assert_eq!(Pipeline::default().run(text).unwrap_err(), ModelError::RootRequired);
}

#[test]
fn shared_child_with_conflicting_multiplicity() {
    let text = r#"<Model>
        <Class name="Root" isRoot="true"/>
        <Class name="Left"/>
        <Class name="Right"/>
        <Class name="Leaf"/>
        <Aggregation source="Left" target="Root" sourceMultiplicity="1" targetMultiplicity="1"/>
        <Aggregation source="Right" target="Root" sourceMultiplicity="1" targetMultiplicity="1"/>
        <Aggregation source="Leaf" target="Left" sourceMultiplicity="1" targetMultiplicity="0..*"/>
        <Aggregation source="Leaf" target="Right" sourceMultiplicity="1" targetMultiplicity="2..4"/>
    </Model>"#;

    // Last write wins in the metadata...
    let entries = build_metadata(&load_model(text).unwrap()).unwrap();
    let leaf = entries.iter().find(|e| e.class == "Leaf").unwrap();
    assert_eq!((leaf.min.as_str(), leaf.max.as_str()), ("2", "4"));

    // ...and the checker flags it
    let report = check_document(text, &SeverityThreshold::default()).unwrap();
    assert_eq!(
        report.diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![DiagnosticCode::ConflictingMultiplicity]
    );
}

#[test]
fn cyclic_model_fails_instead_of_overflowing() {
    let text = r#"<Model>
        <Class name="Folder" isRoot="true"/>
        <Aggregation source="Folder" target="Folder" sourceMultiplicity="1" targetMultiplicity="0..*"/>
    </Model>"#;
    let classes = load_model(text).unwrap();

    let expected = ModelError::CycleDetected {
        path: vec!["Folder".into(), "Folder".into()],
    };
    assert_eq!(derive_instance(&classes).unwrap_err(), expected);
    assert_eq!(derive_metadata(&classes).unwrap_err(), expected);
}

#[test]
fn missing_field_aborts_the_run() {
    let text = r#"<Model>
        <Class name="Project" isRoot="true"/>
        <Aggregation source="Task" target="Project" targetMultiplicity="0..*"/>
    </Model>"#;

    assert_eq!(
        Pipeline::default().run(text).unwrap_err(),
        ModelError::missing_field("Aggregation", "sourceMultiplicity")
    );
}

#[test]
fn deep_chain_is_generated_without_recursion() {
    let depth = 10_000;
    let classes = load_model(&chain(depth)).unwrap();

    let instance = derive_instance(&classes).unwrap();
    assert!(instance.starts_with("<C0><level>int</level><C1><level>int</level>"));
    assert!(instance.ends_with("</C1></C0>"));
    assert_eq!(instance.matches("<level>").count(), depth);

    let entries = build_metadata(&classes).unwrap();
    assert_eq!(entries.first().unwrap().class, format!("C{}", depth - 1));
    assert_eq!(entries.last().unwrap().class, "C0");

    let outline = ContainmentTree::new(&classes).outline("C0");
    assert_eq!(outline.len(), depth);
    assert_eq!(outline.last().unwrap().depth, depth - 1);
}
