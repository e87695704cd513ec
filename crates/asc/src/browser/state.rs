use asc_stream::truncate_to_width;
use conversation_store::Conversation;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

pub const ID_WIDTH: usize = 14;
pub const DATE_WIDTH: usize = 19;
/// Columns taken by table borders and cell padding.
pub const TABLE_CHROME: usize = 8;
const MIN_MESSAGE_WIDTH: usize = 3;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidths {
    pub id: usize,
    pub date: usize,
    pub message: usize,
}

impl ColumnWidths {
    pub fn for_terminal(width: u16) -> Self {
        let available = usize::from(width).saturating_sub(TABLE_CHROME);
        Self {
            id: ID_WIDTH,
            date: DATE_WIDTH,
            message: available
                .saturating_sub(ID_WIDTH + DATE_WIDTH)
                .max(MIN_MESSAGE_WIDTH),
        }
    }
}

/// Fits `text` on one line of `width` columns.
pub fn truncate_cell(text: &str, width: usize) -> String {
    let single_line = text.replace(['\n', '\r', '\t'], " ");
    truncate_to_width(&single_line, width, ELLIPSIS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    ConfirmDelete,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserAction {
    Quit,
    View(Conversation),
    ViewRaw(Conversation),
    Edit(Conversation),
    Delete(Conversation),
}

#[derive(Debug)]
pub struct BrowserState {
    conversations: Vec<Conversation>,
    selected: usize,
    mode: Mode,
    width: u16,
    status: Option<String>,
}

impl BrowserState {
    pub fn new(conversations: Vec<Conversation>, width: u16) -> Self {
        Self {
            conversations,
            selected: 0,
            mode: Mode::Browse,
            width,
            status: None,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.conversations.is_empty()).then_some(self.selected)
    }

    pub fn selected(&self) -> Option<&Conversation> {
        self.conversations.get(self.selected)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    /// One-line message shown under the key help, e.g. a failed pager launch.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn column_widths(&self) -> ColumnWidths {
        ColumnWidths::for_terminal(self.width)
    }

    /// Table cells for every row, truncated to the current column widths.
    pub fn rows(&self) -> Vec<[String; 3]> {
        let widths = self.column_widths();
        self.conversations
            .iter()
            .map(|conversation| {
                [
                    truncate_cell(&conversation.id, widths.id),
                    truncate_cell(&conversation.display_date(), widths.date),
                    truncate_cell(&conversation.message, widths.message),
                ]
            })
            .collect()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<BrowserAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        self.status = None;
        match self.mode {
            Mode::Browse => self.handle_browse_key(key.code),
            Mode::ConfirmDelete => self.handle_confirm_key(key.code),
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> Option<BrowserAction> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Some(BrowserAction::Quit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.conversations.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.selected = 0;
                None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.conversations.len().saturating_sub(1);
                None
            }
            KeyCode::Enter | KeyCode::Char('v') => self.selected().cloned().map(BrowserAction::View),
            KeyCode::Char('V') => self.selected().cloned().map(BrowserAction::ViewRaw),
            KeyCode::Char('e') => self.selected().cloned().map(BrowserAction::Edit),
            KeyCode::Char('d') => {
                if self.selected().is_some() {
                    self.mode = Mode::ConfirmDelete;
                }
                None
            }
            _ => None,
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) -> Option<BrowserAction> {
        match code {
            KeyCode::Enter | KeyCode::Char('v') => {
                self.mode = Mode::Browse;
                self.selected().cloned().map(BrowserAction::Delete)
            }
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                self.mode = Mode::Browse;
                None
            }
            _ => None,
        }
    }

    /// Drops a deleted conversation from the table, keeping the cursor in range.
    pub fn remove(&mut self, id: &str) {
        self.conversations.retain(|conversation| conversation.id != id);
        if self.selected >= self.conversations.len() {
            self.selected = self.conversations.len().saturating_sub(1);
        }
    }
}
