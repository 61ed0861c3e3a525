use fridge_engine::editing::{Cmd, apply};
use fridge_engine::search::{MAX_MATCHES, Query, search};
use fridge_engine::selection::{Position, SerializedSelection, VisualRange, locate, materialize};
use fridge_engine::visual::{reconstruct, render};
use fridge_engine::{
    Block, Document, Editor, HeadingLevel, InputEvent, Key, MemorySurface, NodeType, Surface,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn plain_texts(doc: &Document) -> Vec<String> {
    doc.blocks().iter().map(|b| b.to_plain().to_string()).collect()
}

#[test]
fn end_to_end_enter_after_hello() {
    // Given a titled document with one paragraph
    let doc = Document::new(Some("Title"), "Hello");
    let mut editor = Editor::new(doc, MemorySurface::default());
    let paragraph = editor.document().blocks()[1].id().clone();

    // When the caret sits at the end of the paragraph and Enter is pressed
    assert!(
        editor
            .surface_mut()
            .set_caret(&Position::new(paragraph.clone(), 5))
    );
    let outcome = editor.handle(InputEvent::KeyDown(Key::Enter));

    // Then a new empty paragraph follows, holding the caret
    assert!(outcome.prevent_default);
    let blocks = editor.document().blocks();
    assert_eq!(plain_texts(editor.document()), vec!["Title", "Hello", ""]);
    assert!(matches!(&blocks[0], Block::Heading(h) if h.level == HeadingLevel::H1));
    assert_eq!(blocks[1].id(), &paragraph);
    assert_eq!(blocks[2].node_type(), NodeType::Paragraph);
    assert_eq!(
        editor.surface().caret(),
        Some(Position::new(blocks[2].id().clone(), 0))
    );
}

#[test]
fn round_trip_identity() {
    let mut doc = Document::new(Some("見出し"), "one\n\nthree 😀");
    doc.insert(2, [Block::heading("Sub", HeadingLevel::H3), Block::image("a.png")]);

    let back = reconstruct(&render(&doc)).unwrap();

    let shape = |d: &Document| -> Vec<_> {
        d.blocks()
            .iter()
            .map(|b| (b.id().clone(), b.node_type(), b.to_plain().to_string()))
            .collect()
    };
    assert_eq!(shape(&back), shape(&doc));
}

#[rstest]
#[case(5)]
#[case(6)]
#[case(500)]
fn offset_clamps_to_end_of_block(#[case] offset: usize) {
    let doc = Document::new(None, "Hello");
    let id = doc.blocks()[0].id().clone();
    let root = render(&doc);

    let point = materialize(&root, &Position::new(id.clone(), offset)).unwrap();

    assert_eq!(locate(&root, &point), Some(Position::new(id, 5)));
}

#[test]
fn split_invariant() {
    let mut doc = Document::new(None, "abcdef");
    let original = doc.blocks()[0].id().clone();

    apply(
        &mut doc,
        Cmd::SplitBlock {
            at: Position::new(original.clone(), 3),
        },
    )
    .unwrap();

    assert_eq!(plain_texts(&doc), vec!["abc", "def"]);
    assert_eq!(doc.to_plain().replace('\n', ""), "abcdef");
    assert_eq!(doc.blocks()[0].id(), &original);
    assert_ne!(doc.blocks()[1].id(), &original);
}

#[test]
fn cross_block_merge_removes_everything_between() {
    let mut doc = Document::new(None, "Hello\nin\nbetween\nWorld");
    let first = doc.blocks()[0].id().clone();
    let last = doc.blocks()[3].id().clone();

    apply(
        &mut doc,
        Cmd::DeleteSelection {
            selection: SerializedSelection::new(
                Position::new(first.clone(), 2),
                Position::new(last, 3),
            ),
        },
    )
    .unwrap();

    assert_eq!(plain_texts(&doc), vec!["Held"]);
    assert_eq!(doc.blocks()[0].id(), &first);
}

#[test]
fn single_line_paste_keeps_node_count() {
    let doc = Document::new(Some("T"), "ab\ncd");
    let mut editor = Editor::new(doc, MemorySurface::default());
    let id = editor.document().blocks()[1].id().clone();
    editor.surface_mut().set_caret(&Position::new(id, 1));

    let outcome = editor.handle(InputEvent::Paste("no newline here".into()));
    assert!(!outcome.prevent_default);
    editor.surface_mut().insert_text("no newline here");
    editor.handle(InputEvent::Input);

    assert_eq!(editor.document().len(), 3);
    assert_eq!(editor.document().blocks()[1].to_plain(), "ano newline hereb");
}

#[test]
fn multi_line_paste_creates_one_paragraph_per_line() {
    let doc = Document::new(None, "");
    let mut editor = Editor::new(doc, MemorySurface::default());
    let id = editor.document().blocks()[0].id().clone();
    editor.surface_mut().set_caret(&Position::new(id, 0));

    editor.handle(InputEvent::Paste("1行目\n2行目\n3行目".into()));

    assert_eq!(
        plain_texts(editor.document()),
        vec!["1行目", "2行目", "3行目"]
    );
    let last = editor.document().blocks()[2].id().clone();
    assert_eq!(editor.surface().caret(), Some(Position::new(last, 3)));
}

#[test]
fn search_cap_and_ordering() {
    let text = "a".repeat(1500);

    let result = search(&text, &Query::literal("a")).unwrap();

    assert_eq!(result.count(), MAX_MATCHES);
    assert!(result.founds.iter().all(|s| s.end - s.start == 1));
    assert!(result.founds.windows(2).all(|w| w[0].end <= w[1].start));
}

#[test]
fn selection_across_blocks_then_enter() {
    let doc = Document::new(Some("Heading"), "first line\nsecond line");
    let mut editor = Editor::new(doc, MemorySurface::default());
    let blocks: Vec<_> = editor
        .document()
        .blocks()
        .iter()
        .map(|b| b.id().clone())
        .collect();

    let root = editor.surface().root().clone();
    let range = VisualRange::new(
        materialize(&root, &Position::new(blocks[1].clone(), 5)).unwrap(),
        materialize(&root, &Position::new(blocks[2].clone(), 6)).unwrap(),
    );
    editor.surface_mut().set_selection(Some(range));

    editor.handle(InputEvent::KeyDown(Key::Enter));

    assert_eq!(
        plain_texts(editor.document()),
        vec!["Heading", "first", " line"]
    );
}

#[test]
fn typing_into_bootstrapped_document() {
    let mut editor = Editor::new(Document::default(), MemorySurface::default());
    let id = editor.document().blocks()[0].id().clone();
    editor.surface_mut().set_caret(&Position::new(id, 0));

    // First key seeds heading + paragraph and lands in the heading
    editor.handle(InputEvent::KeyDown(Key::Char('M')));
    // Following keys are ordinary typing reconciled on input
    for c in "emo".chars() {
        let outcome = editor.handle(InputEvent::KeyDown(Key::Char(c)));
        assert!(!outcome.prevent_default);
        editor.surface_mut().insert_text(&c.to_string());
        editor.handle(InputEvent::Input);
    }
    editor.handle(InputEvent::KeyDown(Key::Enter));

    assert_eq!(plain_texts(editor.document()), vec!["Memo", "", ""]);
    assert_eq!(editor.document().title(), Some("Memo"));
}
