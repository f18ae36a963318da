use anyhow::{Context, Result};
use blockshift_config::Config;
use blockshift_engine::{
    Attributes, BlockInstance, BlockName, BlockRegistry, BlockType, ClientId, HeadingLevel,
    SplitMergeEngine, TransformEngine, builtin_registry, library::heading,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

const PREVIEW_CHARS: usize = 40;

struct App {
    document_path: PathBuf,
    registry: BlockRegistry,
    blocks: Vec<BlockInstance>,
    block_list_state: ListState,
    target_index: usize,
    status: String,
    dirty: bool,
}

impl App {
    fn new(document_path: PathBuf, registry: BlockRegistry) -> Result<Self> {
        let markup = std::fs::read_to_string(&document_path)
            .with_context(|| format!("Failed to read {}", document_path.display()))?;
        let blocks = registry.parse_document(&markup)?;
        log::info!(
            "Loaded {} block(s) from {}",
            blocks.len(),
            document_path.display()
        );

        let mut app = Self {
            document_path,
            registry,
            blocks,
            block_list_state: ListState::default(),
            target_index: 0,
            status: String::new(),
            dirty: false,
        };

        // Select first block if available
        if !app.blocks.is_empty() {
            app.focus(0);
        }

        Ok(app)
    }

    fn selected_block(&self) -> Option<&BlockInstance> {
        self.blocks.get(self.block_list_state.selected()?)
    }

    fn focus(&mut self, index: usize) {
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.set_selected(i == index);
        }
        self.block_list_state.select(Some(index));
        self.target_index = 0;
    }

    /// Move the list selection to whichever block the last gesture focused.
    fn follow_focus(&mut self) {
        if self.blocks.is_empty() {
            self.block_list_state.select(None);
            return;
        }
        let index = self
            .blocks
            .iter()
            .position(BlockInstance::is_selected)
            .unwrap_or(0);
        self.focus(index);
    }

    fn next_block(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        let i = match self.block_list_state.selected() {
            Some(i) => (i + 1) % self.blocks.len(),
            None => 0,
        };
        self.focus(i);
    }

    fn previous_block(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        let i = match self.block_list_state.selected() {
            Some(0) | None => self.blocks.len() - 1,
            Some(i) => i - 1,
        };
        self.focus(i);
    }

    fn targets(&self) -> Vec<BlockName> {
        let Some(block) = self.selected_block() else {
            return Vec::new();
        };
        TransformEngine::new(&self.registry)
            .available_targets(block)
            .unwrap_or_default()
    }

    fn next_target(&mut self) {
        let count = self.targets().len();
        if count > 0 {
            self.target_index = (self.target_index + 1) % count;
        }
    }

    fn previous_target(&mut self) {
        let count = self.targets().len();
        if count > 0 {
            self.target_index = (self.target_index + count - 1) % count;
        }
    }

    fn apply_selected_transform(&mut self) -> Result<()> {
        let Some(block) = self.selected_block().cloned() else {
            return Ok(());
        };
        let Some(target) = self.targets().get(self.target_index).cloned() else {
            self.status = format!("No transforms available for {}", block.name());
            return Ok(());
        };
        let blocks =
            TransformEngine::new(&self.registry).apply_transform(&block, target.as_str())?;
        let replacement = SplitMergeEngine::new(&self.registry).replace(&block, blocks);
        self.splice(replacement.replaced, replacement.blocks);
        self.status = format!("Transformed {} into {target}", block.name());
        Ok(())
    }

    fn split_selected(&mut self) -> Result<()> {
        let Some(block) = self.selected_block().cloned() else {
            return Ok(());
        };
        let block_type = self.registry.get(block.name().as_str())?;
        let midpoint = block_type.content_of(block.attributes()).text_len() / 2;
        let blocks = SplitMergeEngine::new(&self.registry).split_at(&block, midpoint)?;
        self.splice(block.client_id(), blocks);
        self.status = format!("Split {} at character {midpoint}", block.name());
        Ok(())
    }

    /// Step a heading-like block through the toolbar levels, wrapping around.
    fn cycle_level(&mut self) -> Result<()> {
        let Some(block) = self.selected_block().cloned() else {
            return Ok(());
        };
        let block_type = self.registry.get(block.name().as_str())?;
        let title = block_type.title().to_string();
        let Some(default_level) = block_type.default_node_level() else {
            self.status = format!("{title} has no levels");
            return Ok(());
        };
        let current = current_level(&block).unwrap_or(default_level);
        let next = HeadingLevel::TOOLBAR
            .iter()
            .position(|level| *level == current)
            .map_or(HeadingLevel::TOOLBAR[0], |i| {
                HeadingLevel::TOOLBAR[(i + 1) % HeadingLevel::TOOLBAR.len()]
            });

        let mut changes = Attributes::new();
        changes.insert(heading::LEVEL.to_string(), next.node_name().into());
        let updated = self.registry.update_attributes(&block, changes)?;
        self.splice(block.client_id(), vec![updated]);
        self.status = format!("{title} level {}", next.number());
        Ok(())
    }

    fn merge_into_previous(&mut self) -> Result<()> {
        let Some(index) = self.block_list_state.selected() else {
            return Ok(());
        };
        if index == 0 {
            self.status = "Nothing to merge into".to_string();
            return Ok(());
        }
        let merged = SplitMergeEngine::new(&self.registry)
            .merge(&self.blocks[index - 1], &self.blocks[index])?;
        let target = merged.block.client_id();
        self.splice(target, vec![merged.block.with_selected(true)]);
        self.blocks.retain(|block| block.client_id() != merged.discarded);
        self.follow_focus();
        self.status = "Merged into previous block".to_string();
        Ok(())
    }

    fn remove_selected(&mut self) {
        let Some(block) = self.selected_block() else {
            return;
        };
        let removal = SplitMergeEngine::new(&self.registry).remove(block);
        let index = self.block_list_state.selected().unwrap_or(0);
        self.blocks.retain(|block| block.client_id() != removal.client_id);
        self.dirty = true;
        if !self.blocks.is_empty() {
            self.focus(index.min(self.blocks.len() - 1));
        } else {
            self.block_list_state.select(None);
        }
        self.status = "Removed block".to_string();
    }

    fn write(&mut self) -> Result<()> {
        let mut markup = self.registry.serialize_document(&self.blocks)?;
        markup.push('\n');
        std::fs::write(&self.document_path, markup)
            .with_context(|| format!("Failed to write {}", self.document_path.display()))?;
        self.dirty = false;
        self.status = format!("Wrote {}", self.document_path.display());
        Ok(())
    }

    /// Replace the block `replaced` with `blocks` in place.
    fn splice(&mut self, replaced: ClientId, blocks: Vec<BlockInstance>) {
        if let Some(index) = self
            .blocks
            .iter()
            .position(|block| block.client_id() == replaced)
        {
            self.blocks.splice(index..=index, blocks);
            self.dirty = true;
        }
        self.follow_focus();
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            log::warn!("{e}");
            self.status = format!("Error: {e}");
        }
    }

    fn describe(&self, block: &BlockInstance) -> String {
        let text = self
            .registry
            .get(block.name().as_str())
            .map(|block_type| block_type.content_of(block.attributes()).text())
            .unwrap_or_default();
        let mut preview: String = text.replace('\n', " ").chars().take(PREVIEW_CHARS).collect();
        if text.chars().count() > PREVIEW_CHARS {
            preview.push('…');
        }
        match current_level(block) {
            Some(level) => format!("{} {level}: {preview}", block.name()),
            None => format!("{}: {preview}", block.name()),
        }
    }
}

fn current_level(block: &BlockInstance) -> Option<HeadingLevel> {
    block
        .attribute(heading::LEVEL)
        .and_then(|value| value.as_text())
        .and_then(HeadingLevel::from_node_name)
}

/// Title line, level choices and supported features of a block type.
fn type_summary(block_type: &BlockType, block: &BlockInstance) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", block_type.title(), block_type.name())];
    if let Some(default_level) = block_type.default_node_level() {
        let current = current_level(block).unwrap_or(default_level);
        let choices: Vec<String> = HeadingLevel::INSPECTOR
            .iter()
            .map(|level| {
                if *level == current {
                    format!("[{level}]")
                } else {
                    level.to_string()
                }
            })
            .collect();
        lines.push(format!("Level: {}", choices.join(" ")));
    }

    let supports = block_type.supports();
    let features: Vec<&str> = [
        (supports.class_name, "custom class"),
        (supports.anchor, "anchor"),
        (supports.text_alignment, "alignment"),
        (supports.drop_cap, "drop cap"),
    ]
    .into_iter()
    .filter_map(|(enabled, label)| enabled.then_some(label))
    .collect();
    if !features.is_empty() {
        lines.push(format!("Supports: {}", features.join(", ")));
    }

    if let Some(rich_text) = block_type.rich_text() {
        if block_type.content_of(block.attributes()).is_empty() {
            lines.push(format!("({})", rich_text.placeholder));
        }
    }
    lines
}

fn main() -> Result<()> {
    env_logger::init();

    // Determine document path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let document_path = if args.len() == 2 {
        PathBuf::from(&args[1])
    } else if args.len() == 1 {
        match config.document_path.clone() {
            Some(path) => path,
            None => {
                eprintln!("Error: No document path provided and none set in the config file");
                eprintln!("Usage: {} <document-path>", args[0]);
                eprintln!(
                    "Or set document_path in a config file at {}",
                    config_path.display()
                );
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [document-path]", args[0]);
        process::exit(1);
    };

    let features =
        move |block: &str, feature: &str| config.is_block_feature_enabled(block, feature);
    let registry = builtin_registry(&features)?;

    // Load before touching the terminal so errors print normally
    let mut app = match App::new(document_path, registry) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    if app.dirty {
        println!("Unsaved changes to {} were discarded", app.document_path.display());
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_block(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_block(),
                KeyCode::Right | KeyCode::Char('l') => app.next_target(),
                KeyCode::Left | KeyCode::Char('h') => app.previous_target(),
                KeyCode::Enter => {
                    let result = app.apply_selected_transform();
                    app.report(result);
                }
                KeyCode::Char('s') => {
                    let result = app.split_selected();
                    app.report(result);
                }
                KeyCode::Char('v') => {
                    let result = app.cycle_level();
                    app.report(result);
                }
                KeyCode::Char('m') => {
                    let result = app.merge_into_previous();
                    app.report(result);
                }
                KeyCode::Char('d') => app.remove_selected(),
                KeyCode::Char('w') => {
                    let result = app.write();
                    app.report(result);
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    // Block list panel
    let block_items: Vec<ListItem> = app
        .blocks
        .iter()
        .map(|block| ListItem::new(vec![Line::from(vec![Span::raw(app.describe(block))])]))
        .collect();

    let title = if app.dirty { "Blocks [modified]" } else { "Blocks" };
    let blocks_list = List::new(block_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(blocks_list, chunks[0], &mut app.block_list_state);

    // Selected block panel: stored markup then transform targets
    let mut content_text = Vec::new();
    match app.selected_block() {
        Some(block) => {
            if let Ok(block_type) = app.registry.get(block.name().as_str()) {
                content_text.extend(type_summary(block_type, block).into_iter().map(Line::from));
                content_text.push(Line::from(""));
            }
            let markup = app
                .registry
                .serialize(block)
                .unwrap_or_else(|e| format!("Error serializing block: {e}"));
            content_text.push(Line::from(Span::raw(markup)));
            content_text.push(Line::from(""));

            let targets = app.targets();
            if targets.is_empty() {
                content_text.push(Line::from("No transforms available"));
            } else {
                content_text.push(Line::from("Transform to:"));
                for (i, target) in targets.iter().enumerate() {
                    let line = if i == app.target_index {
                        Line::from(Span::styled(
                            format!("▶ {target}"),
                            Style::default().add_modifier(Modifier::BOLD),
                        ))
                    } else {
                        Line::from(format!("  {target}"))
                    };
                    content_text.push(line);
                }
            }
        }
        None => content_text.push(Line::from("The document has no blocks")),
    }

    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title("Block"))
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(content, chunks[1]);

    // Instructions and last status at the bottom
    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k ↓/j: Block | "),
        Span::raw("←/h →/l: Target | "),
        Span::raw("Enter: Transform | v: Level | s: Split | m: Merge | d: Remove | w: Write"),
    ]);
    let status = Line::from(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::Cyan),
    ));

    let help = Paragraph::new(vec![help_text, status]).block(Block::default());

    f.render_widget(help, rows[1]);
}
