use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use fridge_config::Config;
use fridge_engine::models::Block as DocBlock;
use fridge_engine::search::{Token, TokenKind, block_spans, search_document, tokenize};
use fridge_engine::text::{byte_index, utf16_len, utf16_offset};
use fridge_engine::{
    Document, Editor, InputEvent, Key, MarkupOptions, MemorySurface, NodeId, Position, Query,
    SearchResult, Session, StateBackup, Surface, io,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{cell::Cell, env, io::stdout, path::PathBuf, process, rc::Rc};

enum Mode {
    Editing,
    /// Collecting a search query typed after Ctrl-F
    Searching(String),
}

struct App {
    editor: Editor<MemorySurface>,
    session: Session,
    backup: Option<StateBackup>,
    /// Set by the editor whenever it commits a change
    changed: Rc<Cell<bool>>,
    path: Option<PathBuf>,
    markup: MarkupOptions,
    mode: Mode,
    query: Option<Query>,
    search: Option<SearchResult>,
    status: String,
}

impl App {
    fn new(
        mut session: Session,
        document: Document,
        path: Option<PathBuf>,
        markup: MarkupOptions,
        backup: Option<StateBackup>,
    ) -> Self {
        let id = document.id().clone();
        if session.replace(&id, document.clone()) {
            session.set_active(Some(id));
        } else {
            session.add(document.clone(), true);
        }

        let changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&changed);
        let mut editor = Editor::new(document, MemorySurface::default());
        editor.subscribe(move |change| {
            log::trace!("document {} at version {}", change.document_id, change.version);
            flag.set(true);
        });

        if let Some(first) = editor.document().blocks().first() {
            let at = Position::new(first.id().clone(), 0);
            editor.surface_mut().set_caret(&at);
        }

        Self {
            editor,
            session,
            backup,
            changed,
            path,
            markup,
            mode: Mode::Editing,
            query: None,
            search: None,
            status: String::new(),
        }
    }

    fn caret(&self) -> Option<Position> {
        self.editor.surface().caret()
    }

    fn type_char(&mut self, c: char) {
        let outcome = self.editor.handle(InputEvent::KeyDown(Key::Char(c)));
        if !outcome.prevent_default && self.editor.surface_mut().insert_text(&c.to_string()) {
            self.editor.handle(InputEvent::Input);
        }
        self.after_edit();
    }

    fn enter(&mut self) {
        self.editor.handle(InputEvent::KeyDown(Key::Enter));
        self.after_edit();
    }

    fn backspace(&mut self) {
        let outcome = self.editor.handle(InputEvent::KeyDown(Key::Backspace));
        if !outcome.prevent_default && self.editor.surface_mut().delete_backward() {
            self.editor.handle(InputEvent::Input);
        }
        self.after_edit();
    }

    fn delete(&mut self) {
        let outcome = self.editor.handle(InputEvent::KeyDown(Key::Delete));
        if !outcome.prevent_default {
            // Forward delete is a backward delete one character further on
            if let Some(pos) = self.caret()
                && let Some(text) = self.block_text(&pos)
            {
                let next = next_boundary(&text, pos.offset);
                if next > pos.offset
                    && self
                        .editor
                        .surface_mut()
                        .set_caret(&Position::new(pos.node_id.clone(), next))
                    && self.editor.surface_mut().delete_backward()
                {
                    self.editor.handle(InputEvent::Input);
                }
            }
        }
        self.after_edit();
    }

    fn move_left(&mut self) {
        let Some(pos) = self.caret() else { return };
        let Some(text) = self.block_text(&pos) else {
            return;
        };
        if pos.offset > 0 {
            let prev = prev_boundary(&text, pos.offset);
            self.set_caret(Position::new(pos.node_id, prev));
        } else if let Some(prev) = self.neighbour(&pos, -1) {
            let end = block_len(prev);
            let id = prev.id().clone();
            self.set_caret(Position::new(id, end));
        }
    }

    fn move_right(&mut self) {
        let Some(pos) = self.caret() else { return };
        let Some(text) = self.block_text(&pos) else {
            return;
        };
        if pos.offset < utf16_len(&text) {
            let next = next_boundary(&text, pos.offset);
            self.set_caret(Position::new(pos.node_id, next));
        } else if let Some(next) = self.neighbour(&pos, 1) {
            let id = next.id().clone();
            self.set_caret(Position::new(id, 0));
        }
    }

    /// Move to the neighbouring block, keeping the column where it fits
    fn move_vertical(&mut self, step: isize) {
        let Some(pos) = self.caret() else { return };
        if let Some(block) = self.neighbour(&pos, step) {
            let id = block.id().clone();
            self.set_caret(Position::new(id, pos.offset));
        }
    }

    fn set_caret(&mut self, at: Position) {
        if !self.editor.surface_mut().set_caret(&at) {
            log::debug!("caret target {} is not on the surface", at.node_id);
        }
    }

    fn neighbour(&self, pos: &Position, step: isize) -> Option<&DocBlock> {
        let index = self.editor.document().index_of(&pos.node_id)?;
        let target = index.checked_add_signed(step)?;
        self.editor.document().blocks().get(target)
    }

    fn block_text(&self, pos: &Position) -> Option<String> {
        let block = self.editor.document().block(&pos.node_id)?;
        Some(block.text().unwrap_or_default().to_string())
    }

    fn run_search(&mut self, pattern: String) {
        self.mode = Mode::Editing;
        if pattern.is_empty() {
            self.clear_search();
            return;
        }
        self.query = Some(Query::literal(pattern));
        self.refresh_search();
    }

    fn clear_search(&mut self) {
        self.query = None;
        self.search = None;
        self.status.clear();
    }

    fn refresh_search(&mut self) {
        let Some(query) = &self.query else { return };
        match search_document(self.editor.document(), query) {
            Ok(result) => {
                self.status = if result.truncated {
                    format!("{}+ matches for '{}'", result.count(), query.as_str())
                } else {
                    format!("{} matches for '{}'", result.count(), query.as_str())
                };
                self.search = Some(result);
            }
            Err(e) => {
                self.status = format!("Search failed: {e}");
                self.search = None;
            }
        }
    }

    fn after_edit(&mut self) {
        if self.changed.replace(false) {
            self.persist_state();
        }
        if self.query.is_some() {
            self.refresh_search();
        }
    }

    /// Copy the edited document into the session and back the session up
    fn persist_state(&mut self) {
        let document = self.editor.document().clone();
        let id = document.id().clone();
        if !self.session.replace(&id, document.clone()) {
            self.session.add(document, true);
        }

        let Some(backup) = &mut self.backup else {
            return;
        };
        if let Err(e) = backup.save(&self.session) {
            log::warn!("failed to back up to {}: {e}", backup.path().display());
            self.status = format!("Backup failed: {e}");
        }
    }

    fn save(&mut self) {
        let Some(path) = &self.path else {
            self.status = "No file to save to".to_string();
            return;
        };
        match io::write_document(self.editor.document(), path) {
            Ok(()) => self.status = format!("Saved {}", path.display()),
            Err(e) => {
                log::error!("failed to save {}: {e}", path.display());
                self.status = format!("Save failed: {e}");
            }
        }
    }

    fn title(&self) -> String {
        let name = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| io::UNTITLED.to_string());
        format!("{} (v{})", name, self.editor.version())
    }

    fn render_document_content(&self) -> Vec<Line<'static>> {
        let document = self.editor.document();
        let caret = self.caret();
        let projected = self
            .search
            .as_ref()
            .map(|result| block_spans(document, result))
            .unwrap_or_default();

        let mut lines = Vec::new();
        for block in document.blocks() {
            let caret_here = caret
                .as_ref()
                .filter(|c| &c.node_id == block.id())
                .map(|c| c.offset);

            match block {
                DocBlock::Image(image) => {
                    let label = match &image.alt {
                        Some(alt) => format!("[image: {} ({alt})]", image.src),
                        None => format!("[image: {}]", image.src),
                    };
                    let mut style = Style::default().fg(Color::Magenta);
                    if caret_here.is_some() {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    lines.push(Line::from(Span::styled(label, style)));
                }
                DocBlock::Heading(heading) => {
                    let base = Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                    let spans = projected.get(&heading.id).map(Vec::as_slice).unwrap_or(&[]);
                    let tokens = tokenize(&heading.text, spans, &self.markup);
                    let mut line = vec![Span::styled(
                        format!("{} ", "#".repeat(heading.level.get() as usize)),
                        Style::default().fg(Color::DarkGray),
                    )];
                    line.extend(token_spans(&tokens, caret_here, base));
                    lines.push(Line::from(line));
                }
                DocBlock::Paragraph(paragraph) => {
                    let spans = projected
                        .get(&paragraph.id)
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    let tokens = tokenize(&paragraph.text, spans, &self.markup);
                    lines.push(Line::from(token_spans(&tokens, caret_here, Style::default())));
                }
            }
        }

        lines
    }
}

fn block_len(block: &DocBlock) -> usize {
    block.text().map(utf16_len).unwrap_or(0)
}

fn prev_boundary(text: &str, offset: usize) -> usize {
    let byte = byte_index(text, offset);
    match text[..byte].char_indices().next_back() {
        Some((i, _)) => utf16_offset(text, i),
        None => 0,
    }
}

fn next_boundary(text: &str, offset: usize) -> usize {
    let byte = byte_index(text, offset);
    match text[byte..].chars().next() {
        Some(c) => utf16_offset(text, byte + c.len_utf8()),
        None => utf16_len(text),
    }
}

/// Styled spans for one block's tokens, drawing the caret as a reversed cell
fn token_spans(tokens: &[Token], caret: Option<usize>, base: Style) -> Vec<Span<'static>> {
    let caret_style = base.add_modifier(Modifier::REVERSED);
    let marker = base.fg(Color::DarkGray);
    let mut spans = Vec::new();

    for token in tokens {
        let (shown, style) = match token.kind {
            TokenKind::Text => (token.content.clone(), base),
            TokenKind::HalfSpace => ("·".to_string(), marker),
            TokenKind::FullSpace => ("・".to_string(), marker),
            TokenKind::Newline => ("↵".to_string(), marker),
            TokenKind::SearchHighlight => {
                (token.content.clone(), base.bg(Color::Yellow).fg(Color::Black))
            }
            TokenKind::Placeholder => continue,
        };

        match caret {
            Some(at) if at >= token.start && at < token.end => {
                if matches!(token.kind, TokenKind::Text | TokenKind::SearchHighlight) {
                    let split = byte_index(&shown, at - token.start);
                    let (before, rest) = shown.split_at(split);
                    let cursor_len = rest.chars().next().map_or(0, char::len_utf8);
                    let (under, after) = rest.split_at(cursor_len);
                    spans.push(Span::styled(before.to_string(), style));
                    spans.push(Span::styled(under.to_string(), caret_style));
                    spans.push(Span::styled(after.to_string(), style));
                } else {
                    spans.push(Span::styled(shown, caret_style));
                }
            }
            _ => spans.push(Span::styled(shown, style)),
        }
    }

    let end = tokens.last().map_or(0, |t| t.end);
    if caret.is_some_and(|at| at >= end) {
        spans.push(Span::styled(" ", caret_style));
    }
    spans
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [file]", args[0]);
        process::exit(1);
    }

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let mut backup = config.state_path.clone().map(StateBackup::new);
    let mut session = match backup.as_mut().map(StateBackup::restore) {
        Some(Ok(Some(session))) => session,
        Some(Err(e)) => {
            log::warn!("ignoring unreadable editor state: {e}");
            Session::new()
        }
        _ => Session::new(),
    };

    let (mut document, path) = match args.get(1) {
        Some(arg) => {
            let path = config.resolve_document_path(&PathBuf::from(arg));
            // The file on disk wins over a backed-up copy of it
            let stale: Vec<NodeId> = session
                .documents()
                .iter()
                .filter(|d| d.file_path.as_deref() == Some(path.as_path()))
                .map(|d| d.id().clone())
                .collect();
            for id in &stale {
                session.remove(id);
            }

            match io::read_document(&path) {
                Ok(document) => (document, Some(path)),
                Err(io::IoError::NotFound(_)) => {
                    log::info!("{} does not exist yet, starting empty", path.display());
                    let mut document = Document::default();
                    document.file_path = Some(path.clone());
                    (document, Some(path))
                }
                Err(e) => {
                    eprintln!("Error: Cannot open '{}': {e}", path.display());
                    process::exit(1);
                }
            }
        }
        None => match session.active() {
            Some(document) => (document.clone(), document.file_path.clone()),
            None => (Document::default(), None),
        },
    };
    document.mode = config.editor.mode;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, document, path, config.markup_options(), backup);

    // Main loop
    let res = run_app(&mut terminal, &mut app);
    app.persist_state();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !handle_key(app, key)
        {
            return Ok(());
        }
    }
}

/// Returns false when the app should quit
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if let Mode::Searching(query) = &mut app.mode {
        match key.code {
            KeyCode::Esc => {
                app.mode = Mode::Editing;
                app.clear_search();
            }
            KeyCode::Enter => {
                let pattern = std::mem::take(query);
                app.run_search(pattern);
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(c) if !ctrl => query.push(c),
            _ => {}
        }
        return true;
    }

    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Char('q') if ctrl => return false,
        KeyCode::Char('s') if ctrl => app.save(),
        KeyCode::Char('f') if ctrl => app.mode = Mode::Searching(String::new()),
        KeyCode::Char(c) if !ctrl => app.type_char(c),
        KeyCode::Enter => app.enter(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.move_left(),
        KeyCode::Right => app.move_right(),
        KeyCode::Up => app.move_vertical(-1),
        KeyCode::Down => app.move_vertical(1),
        _ => {}
    }
    true
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let content = Paragraph::new(app.render_document_content())
        .block(Block::default().borders(Borders::ALL).title(app.title()))
        .wrap(Wrap { trim: false });
    f.render_widget(content, chunks[0]);

    let status = match &app.mode {
        Mode::Searching(query) => Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(query.clone()),
        ]),
        Mode::Editing => Line::from(Span::raw(app.status.clone())),
    };
    f.render_widget(Paragraph::new(status), chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("Esc/Ctrl-Q: Quit | "),
        Span::raw("Ctrl-S: Save | "),
        Span::raw("Ctrl-F: Search | "),
        Span::raw("Arrows: Move"),
    ]);
    f.render_widget(Paragraph::new(help_text), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plain(app: &App) -> Vec<String> {
        app.editor
            .document()
            .blocks()
            .iter()
            .map(|b| b.to_plain().to_string())
            .collect()
    }

    fn app(document: Document) -> App {
        App::new(Session::new(), document, None, MarkupOptions::default(), None)
    }

    #[test]
    fn test_boundaries_step_over_surrogate_pairs() {
        let text = "a😀b";
        assert_eq!(next_boundary(text, 1), 3);
        assert_eq!(prev_boundary(text, 3), 1);
        assert_eq!(next_boundary(text, 4), 4);
        assert_eq!(prev_boundary(text, 0), 0);
    }

    #[test]
    fn test_typing_and_editing_keys() {
        let mut app = app(Document::new(Some("Title"), "body"));
        app.move_vertical(1);
        for c in "new ".chars() {
            app.type_char(c);
        }
        app.enter();
        app.backspace();

        assert_eq!(plain(&app), vec!["Title", "new body"]);
    }

    #[test]
    fn test_forward_delete_inside_block() {
        let mut app = app(Document::new(None, "abc"));
        app.delete();
        assert_eq!(plain(&app), vec!["bc"]);
    }

    #[test]
    fn test_arrow_keys_cross_blocks() {
        let mut app = app(Document::new(None, "ab\ncd"));
        let second = app.editor.document().blocks()[1].id().clone();

        app.move_right();
        app.move_right();
        app.move_right();

        assert_eq!(app.caret(), Some(Position::new(second.clone(), 0)));
        app.move_left();
        let first = app.editor.document().blocks()[0].id().clone();
        assert_eq!(app.caret(), Some(Position::new(first, 2)));
    }

    #[test]
    fn test_search_tracks_edits() {
        let mut app = app(Document::new(None, "cat cat"));
        app.run_search("cat".to_string());
        assert_eq!(app.search.as_ref().map(SearchResult::count), Some(2));

        app.type_char('c');
        app.type_char('a');
        app.type_char('t');

        assert_eq!(app.search.as_ref().map(SearchResult::count), Some(3));
    }

    #[test]
    fn test_edits_are_backed_up_and_restored() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state.json");
        let mut app = App::new(
            Session::new(),
            Document::new(Some("Notes"), "a"),
            None,
            MarkupOptions::default(),
            Some(StateBackup::new(&state)),
        );

        // Moving the caret changes nothing worth backing up
        app.move_vertical(1);
        assert!(!state.exists());

        app.type_char('b');

        let restored = StateBackup::new(&state).restore().unwrap().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(
            restored.active().map(Document::to_plain),
            Some("Notes\nba".to_string())
        );
    }

    #[test]
    fn test_open_document_replaces_restored_copy() {
        let document = Document::new(Some("Draft"), "old");
        let mut session = Session::new();
        session.add(Document::new(None, "other"), true);
        session.add(document.clone(), false);

        let mut newer = Document::from_serialized(&document.to_serialized());
        newer.insert(1, [DocBlock::paragraph("new")]);
        let app = App::new(session, newer, None, MarkupOptions::default(), None);

        assert_eq!(app.session.len(), 2);
        assert_eq!(app.session.active_id(), Some(document.id()));
        assert_eq!(
            app.session.active().map(Document::to_plain),
            Some("Draft\nnew\nold".to_string())
        );
    }

    #[test]
    fn test_caret_drawn_at_end_of_line() {
        let tokens = tokenize("hi", &[], &MarkupOptions::default());
        let spans = token_spans(&tokens, Some(2), Style::default());
        assert_eq!(spans.last().map(|s| s.content.as_ref()), Some(" "));
    }
}
