mod common;

use common::Editor;
use jumpline_core::{
    ControlState, DerivedResult, FileRef, NavError, NavigationController, NavigationEvent,
    PainterCategory, ResultLabels, ResultListPane, StyleRegistry,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

const A_TEXT: &str = "class A {\n  int a;\n  int b;\n}\n";
const B_TEXT: &str = "class B {\n  int c;\n}\n";

fn a() -> FileRef {
    FileRef::new("A.java")
}

fn b() -> FileRef {
    FileRef::new("B.java")
}

/// Display order: 0 = unlocated, 1 = A line 1, 2 = A line 2, 3 = B line 1.
fn results() -> Vec<DerivedResult> {
    vec![
        DerivedResult::error("A: missing b").in_file(a()).at(2, 2),
        DerivedResult::warning("B: unused c").in_file(b()).at(1, 2),
        DerivedResult::error("build failed"),
        DerivedResult::error("A: missing a").in_file(a()).at(1, 2),
    ]
}

fn setup() -> (Editor, NavigationController) {
    let mut editor = Editor::new();
    editor.open("A.java", A_TEXT);
    editor.open("B.java", B_TEXT);
    let list = ResultListPane::new(editor.docs.allocate_id(), None);
    let mut nav = NavigationController::new(
        list,
        Arc::new(StyleRegistry::default()),
        ResultLabels::default(),
    );
    nav.set_results(&mut editor, results());
    (editor, nav)
}

fn result_ranges(editor: &Editor, path: &str) -> Vec<std::ops::Range<usize>> {
    editor
        .engine(path)
        .regions()
        .iter()
        .filter(|r| r.painter().category == PainterCategory::Result)
        .map(|r| r.range())
        .collect()
}

#[test]
fn test_display_order_and_header() {
    let (_, nav) = setup();
    let messages: Vec<_> = nav.index().iter().map(|r| r.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["build failed", "A: missing a", "A: missing b", "B: unused c"]
    );
    assert_eq!(
        nav.controls(),
        &ControlState {
            next_enabled: true,
            previous_enabled: false,
            header: "3 errors and 1 warning found:".to_string(),
        }
    );
    assert!(nav.list().text().starts_with("3 errors and 1 warning found:\n"));
    assert_eq!(nav.list().len(), 4);
}

#[test]
fn test_select_item_jumps_and_highlights() {
    let (mut editor, mut nav) = setup();
    nav.select_item(&mut editor, 1).unwrap();

    assert_eq!(editor.carets, vec![(a(), 12)]);
    assert_eq!(editor.scrolls, vec![(a(), 12..21)]);
    // Spans up to the next result in the same file.
    assert_eq!(result_ranges(&editor, "A.java"), vec![12..21]);
    assert_eq!(nav.list().highlighted_item(), Some(1));
    assert_eq!(editor.list_scrolls, vec![nav.list().item_range(1).unwrap()]);

    nav.select_item(&mut editor, 2).unwrap();
    // The last result of a file spans to the end of the buffer.
    assert_eq!(result_ranges(&editor, "A.java"), vec![21..30]);
}

#[test]
fn test_selection_round_trips_through_caret() {
    let (mut editor, mut nav) = setup();
    for display in [1, 2] {
        nav.select_item(&mut editor, display).unwrap();
        let (_, caret) = editor.carets.last().cloned().unwrap();
        nav.select_nothing(&mut editor);
        assert_eq!(nav.on_caret_moved(&mut editor, caret), Some(display));
    }
}

#[test]
fn test_caret_moves_on_one_line_update_once() {
    let (mut editor, mut nav) = setup();

    assert_eq!(nav.on_caret_moved(&mut editor, 14), Some(1));
    let handle = editor.engine("A.java").regions()[0].handle();
    assert_eq!(editor.list_scrolls.len(), 1);
    // Caret-driven selection never moves the caret or scrolls the document.
    assert!(editor.carets.is_empty());
    assert!(editor.scrolls.is_empty());

    for caret in [15, 16, 17, 12] {
        assert_eq!(nav.on_caret_moved(&mut editor, caret), Some(1));
    }
    assert_eq!(editor.list_scrolls.len(), 1);
    assert_eq!(editor.engine("A.java").regions()[0].handle(), handle);
    assert_eq!(editor.engine("A.java").len(), 1);

    // The class line has no result.
    assert_eq!(nav.on_caret_moved(&mut editor, 3), None);
    assert!(editor.engine("A.java").is_empty());
    assert_eq!(nav.list().highlighted_item(), None);
}

#[test]
fn test_switching_selection_keeps_one_result_highlight() {
    let (mut editor, mut nav) = setup();

    nav.select_item(&mut editor, 2).unwrap();
    let first = editor.engine("A.java").regions()[0].handle();
    assert_eq!(editor.engine("A.java").count_of(PainterCategory::Result), 1);

    nav.select_item(&mut editor, 1).unwrap();
    let engine = editor.engine("A.java");
    assert_eq!(engine.count_of(PainterCategory::Result), 1);
    assert!(engine.region(first).is_none());
    assert_eq!(nav.list().engine().len(), 1);
}

#[test]
fn test_jump_into_inactive_file_waits_for_switch() {
    let (mut editor, mut nav) = setup();
    nav.select_item(&mut editor, 1).unwrap();
    editor.carets.clear();

    nav.select_item(&mut editor, 3).unwrap();
    assert_eq!(editor.switch_requests, vec![b()]);
    assert_eq!(nav.pending_switch(), Some(&b()));
    assert_eq!(nav.selected(), Some(3));
    assert!(editor.carets.is_empty());
    assert!(editor.engine("A.java").is_empty());

    // Caret events from the old editor are ignored mid-switch.
    assert_eq!(nav.on_caret_moved(&mut editor, 14), Some(3));

    editor.activate("B.java");
    assert!(!nav.on_switch_completed(&mut editor, &a()));
    assert!(nav.on_switch_completed(&mut editor, &b()));
    assert_eq!(nav.pending_switch(), None);
    assert_eq!(editor.carets, vec![(b(), 12)]);
    assert_eq!(result_ranges(&editor, "B.java"), vec![12..21]);
}

#[test]
fn test_unopenable_file_keeps_list_selection() {
    let (mut editor, mut nav) = setup();
    editor.unopenable.push(b());
    nav.select_item(&mut editor, 1).unwrap();

    nav.select_item(&mut editor, 3).unwrap();
    assert_eq!(nav.selected(), Some(3));
    assert_eq!(nav.list().highlighted_item(), Some(3));
    assert_eq!(nav.pending_switch(), None);
    assert!(editor.engine("A.java").is_empty());
    assert!(editor.engine("B.java").is_empty());
}

#[test]
fn test_failed_switch_report_clears_pending_jump() {
    let (mut editor, mut nav) = setup();
    nav.select_item(&mut editor, 3).unwrap();
    nav.on_switch_failed(&b(), "deleted on disk");

    assert_eq!(nav.pending_switch(), None);
    assert_eq!(nav.selected(), Some(3));
    editor.activate("B.java");
    assert!(!nav.on_switch_completed(&mut editor, &b()));
    assert!(editor.carets.is_empty());
}

#[test]
fn test_unlocated_result_only_highlights_list() {
    let (mut editor, mut nav) = setup();
    nav.select_item(&mut editor, 0).unwrap();

    assert_eq!(nav.list().highlighted_item(), Some(0));
    assert!(editor.carets.is_empty());
    assert!(editor.switch_requests.is_empty());
    assert!(editor.engine("A.java").is_empty());
}

#[test]
fn test_stepping() {
    let (mut editor, mut nav) = setup();
    assert_eq!(nav.previous(&mut editor), Err(NavError::NothingSelected));
    assert_eq!(nav.next(&mut editor), Ok(0));
    assert_eq!(nav.previous(&mut editor), Err(NavError::AtFirstResult));
    assert_eq!(nav.next(&mut editor), Ok(1));
    assert_eq!(nav.next(&mut editor), Ok(2));
    assert!(nav.can_step_forward());
    assert_eq!(nav.previous(&mut editor), Ok(1));

    nav.select_item(&mut editor, 3).unwrap();
    assert!(!nav.can_step_forward());
    assert_eq!(
        nav.next(&mut editor),
        Err(NavError::IndexOutOfRange { index: 4, len: 4 })
    );
    assert_eq!(
        nav.select_item(&mut editor, 9),
        Err(NavError::IndexOutOfRange { index: 9, len: 4 })
    );
    assert_eq!(nav.selected(), Some(3));
}

#[test]
fn test_click_in_list_selects_item() {
    let (mut editor, mut nav) = setup();
    let range = nav.list().item_range(2).unwrap();

    assert_eq!(nav.select_list_offset(&mut editor, range.start + 3), Some(2));
    assert_eq!(nav.selected(), Some(2));
    assert_eq!(editor.carets, vec![(a(), 21)]);
    assert_eq!(nav.select_list_offset(&mut editor, 0), None);
}

#[test]
fn test_jump_follows_edits_made_after_indexing() {
    let (mut editor, mut nav) = setup();
    let id = editor.docs.buffer_for_file(&a()).unwrap();
    editor
        .docs
        .buffer_mut(id)
        .unwrap()
        .insert(0, "import x;\n")
        .unwrap();

    nav.select_item(&mut editor, 2).unwrap();
    assert_eq!(editor.carets, vec![(a(), 31)]);
}

#[test]
fn test_results_for_files_opened_later() {
    let mut editor = Editor::new();
    editor.open("A.java", A_TEXT);
    let list = ResultListPane::new(editor.docs.allocate_id(), None);
    let mut nav = NavigationController::new(
        list,
        Arc::new(StyleRegistry::default()),
        ResultLabels::default(),
    );
    nav.set_results(
        &mut editor,
        vec![DerivedResult::error("C: bad").in_file(FileRef::new("C.java")).at(1, 0)],
    );
    assert!(nav.index().anchor(0).is_none());

    nav.select_item(&mut editor, 0).unwrap();
    editor.open("C.java", "line0\nline1\n");
    editor.activate("C.java");
    assert!(nav.on_switch_completed(&mut editor, &FileRef::new("C.java")));

    assert_eq!(editor.carets, vec![(FileRef::new("C.java"), 6)]);
    assert_eq!(nav.index().anchor(0).map(|a| a.offset()), Some(6));
    assert_eq!(result_ranges(&editor, "C.java"), vec![6..12]);
}

#[test]
fn test_events_report_changes_only() {
    let (mut editor, mut nav) = setup();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    nav.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    nav.next(&mut editor).unwrap();
    nav.next(&mut editor).unwrap();
    nav.select_nothing(&mut editor);
    nav.select_nothing(&mut editor);

    let header = "3 errors and 1 warning found:".to_string();
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            NavigationEvent::SelectionChanged(Some(0)),
            NavigationEvent::SelectionChanged(Some(1)),
            NavigationEvent::ControlsChanged(ControlState {
                next_enabled: true,
                previous_enabled: true,
                header: header.clone(),
            }),
            NavigationEvent::SelectionChanged(None),
            NavigationEvent::ControlsChanged(ControlState {
                next_enabled: true,
                previous_enabled: false,
                header,
            }),
        ]
    );
}
