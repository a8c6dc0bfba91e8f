mod common;

use common::Editor;
use jumpline_core::{
    ActiveMatchHighlight, AnchoredText, FileRef, FindFlags, FoundMatch, NavigationController,
    PainterCategory, ResultLabels, ResultListPane, SearchCursor, StyleRegistry,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const A_TEXT: &str = "let count = 1;\nlet total = count + 1;\n";
const B_TEXT: &str = "// count\nfn count() {}\n";

fn editor() -> Editor {
    let mut editor = Editor::new();
    editor.open("A.rs", A_TEXT);
    editor.open("B.rs", B_TEXT);
    editor
}

fn all_documents() -> FindFlags {
    FindFlags {
        all_documents: true,
        ..FindFlags::default()
    }
}

#[test]
fn test_find_all_feeds_the_results_list() {
    let mut editor = editor();
    let mut cursor = SearchCursor::with_flags(all_documents());
    let found = cursor.find_all(&editor.docs, "count", None).unwrap();

    let positions: Vec<_> = found
        .iter()
        .map(|m| (m.file.clone().unwrap(), m.line, m.column))
        .collect();
    assert_eq!(
        positions,
        vec![
            (FileRef::new("A.rs"), 0, 4),
            (FileRef::new("A.rs"), 1, 12),
            (FileRef::new("B.rs"), 0, 3),
            (FileRef::new("B.rs"), 1, 3),
        ]
    );
    assert_eq!(cursor.state().find_term, "count");

    let list = ResultListPane::new(editor.docs.allocate_id(), None);
    let mut nav = NavigationController::new(
        list,
        Arc::new(StyleRegistry::default()),
        ResultLabels::matches(),
    );
    nav.set_results(&mut editor, found.iter().map(FoundMatch::to_result));
    assert_eq!(nav.controls().header, "4 matches found:");
    assert_eq!(
        nav.index().get(1).map(|r| r.message.as_str()),
        Some("let total = count + 1;")
    );

    nav.select_item(&mut editor, 1).unwrap();
    assert_eq!(editor.carets, vec![(FileRef::new("A.rs"), 27)]);
}

#[test]
fn test_comments_can_be_ignored() {
    let editor = editor();
    let mut cursor = SearchCursor::with_flags(FindFlags {
        ignore_comments_and_strings: true,
        ..all_documents()
    });
    let found = cursor.find_all(&editor.docs, "count", None).unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|m| m.line_text != "// count"));
}

#[test]
fn test_find_next_cycles_through_documents() {
    let editor = editor();
    let a = editor.docs.buffer_for_file(&FileRef::new("A.rs")).unwrap();
    let b = editor.docs.buffer_for_file(&FileRef::new("B.rs")).unwrap();
    let mut cursor = SearchCursor::with_flags(all_documents());
    cursor.set_find_term("count");
    cursor.set_position(a, 10);

    let mut visited = Vec::new();
    for _ in 0..4 {
        let result = cursor.find_next(&editor.docs).unwrap();
        visited.push((result.buffer.unwrap(), result.found.unwrap().start));
        assert!(!result.wrapped);
    }
    assert_eq!(visited, vec![(a, 27), (b, 3), (b, 12), (a, 4)]);

    let back = cursor.find_previous(&editor.docs).unwrap();
    assert_eq!((back.buffer, back.found.map(|m| m.start)), (Some(b), Some(12)));
}

#[test]
fn test_active_match_highlight_follows_find_next() {
    let mut editor = editor();
    let a = editor.docs.buffer_for_file(&FileRef::new("A.rs")).unwrap();
    let painter = StyleRegistry::default().painter(PainterCategory::Generic);
    let mut cursor = SearchCursor::new();
    cursor.set_find_term("count");
    cursor.set_position(a, 0);
    let mut active = ActiveMatchHighlight::new();

    for expected in [4..9, 27..32] {
        let m = cursor.find_next(&editor.docs).unwrap().found.unwrap();
        let doc = editor.docs.buffer(a).unwrap();
        let engine = editor.engines.get_mut(&a).unwrap();
        active.show(engine, doc, m, painter).unwrap();

        assert_eq!(engine.count_of(PainterCategory::Generic), 1);
        assert_eq!(engine.regions()[0].range(), expected);
    }

    assert!(active.clear(editor.engines.get_mut(&a).unwrap()));
    assert!(editor.engines[&a].is_empty());
}

#[test]
fn test_replace_all_keeps_result_anchors_in_place() {
    let mut editor = editor();
    let mut cursor = SearchCursor::with_flags(all_documents());
    let found = cursor.find_all(&editor.docs, "total", None).unwrap();

    let list = ResultListPane::new(editor.docs.allocate_id(), None);
    let mut nav = NavigationController::new(
        list,
        Arc::new(StyleRegistry::default()),
        ResultLabels::matches(),
    );
    nav.set_results(&mut editor, found.iter().map(FoundMatch::to_result));

    let replaced = cursor
        .replace_all(&mut editor.docs, "count", "n", None)
        .unwrap();
    assert_eq!(replaced, 4);
    let a = editor.docs.buffer_for_file(&FileRef::new("A.rs")).unwrap();
    assert_eq!(
        editor.docs.buffer(a).unwrap().text().unwrap(),
        "let n = 1;\nlet total = n + 1;\n"
    );
    assert_eq!(cursor.state().find_term, "count");
    assert_eq!(cursor.state().replace_term, "n");

    nav.select_item(&mut editor, 0).unwrap();
    let (_, caret) = editor.carets.last().cloned().unwrap();
    let text = editor.docs.buffer(a).unwrap().text().unwrap();
    assert_eq!(&text[caret..caret + 5], "total");
}
