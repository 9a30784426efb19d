//! Output log shown under the code input

pub const READY_MESSAGE: &str = "Ready to execute Lua code...";
pub const CLEARED_MESSAGE: &str = "Output cleared. Ready for new commands.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Input,
    Result,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub kind: LineKind,
    pub text: String,
}

impl OutputLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn input(text: impl Into<String>) -> Self {
        Self::new(LineKind::Input, text)
    }

    pub fn result(text: impl Into<String>) -> Self {
        Self::new(LineKind::Result, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LineKind::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(LineKind::Info, text)
    }

    /// Display rows for this line, broken at each `\n` and wrapped to `width` columns.
    ///
    /// Input lines get a `> ` prompt and their continuation rows are indented
    /// to match. A `width` of zero disables wrapping.
    pub fn display_rows(&self, width: usize) -> Vec<String> {
        let prompt = if self.kind == LineKind::Input { "> " } else { "" };

        let mut rows = Vec::new();
        for (i, row) in self.text.split('\n').enumerate() {
            let lead = match (i, prompt.is_empty()) {
                (0, _) => prompt,
                (_, true) => "",
                (_, false) => "  ",
            };
            wrap_into(&format!("{}{}", lead, row), width, &mut rows);
        }
        rows
    }
}

fn wrap_into(row: &str, width: usize, out: &mut Vec<String>) {
    if width == 0 || row.chars().count() <= width {
        out.push(row.to_string());
        return;
    }

    let chars: Vec<char> = row.chars().collect();
    out.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
}

/// Size of the panel the log is drawn into, borders excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub height: usize,
    pub width: usize,
}

impl Viewport {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }
}

/// Append-only log of submissions and their outcomes.
///
/// `scroll` counts display rows hidden above the viewport; the renderer
/// clamps it once it knows how tall the panel is.
#[derive(Debug, Clone)]
pub struct OutputLog {
    lines: Vec<OutputLine>,
    max_lines: Option<usize>,
    pub scroll: usize,
    pub follow: bool,
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl OutputLog {
    pub fn new(max_lines: Option<usize>) -> Self {
        Self {
            lines: vec![OutputLine::info(READY_MESSAGE)],
            // A bound of zero would leave the log empty
            max_lines: max_lines.map(|m| m.max(1)),
            scroll: 0,
            follow: true,
        }
    }

    pub fn push(&mut self, line: OutputLine) {
        self.lines.push(line);

        if let Some(max) = self.max_lines {
            if self.lines.len() > max {
                let excess = self.lines.len() - max;
                self.lines.drain(..excess);
            }
        }
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = OutputLine>) {
        for line in lines {
            self.push(line);
        }
    }

    /// Drop everything and leave a single info line behind
    pub fn clear(&mut self) {
        self.lines = vec![OutputLine::info(CLEARED_MESSAGE)];
        self.scroll = 0;
        self.follow = true;
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    /// Number of display rows the log needs at `width` columns
    pub fn row_count(&self, width: usize) -> usize {
        self.lines.iter().map(|l| l.display_rows(width).len()).sum()
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }

    pub fn scroll_up(&mut self, rows: usize, viewport: Viewport) {
        if self.follow {
            self.scroll = self.row_count(viewport.width).saturating_sub(viewport.height);
            self.follow = false;
        }
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize, viewport: Viewport) {
        let max = self.row_count(viewport.width).saturating_sub(viewport.height);
        self.scroll = (self.scroll + rows).min(max);
        if self.scroll >= max {
            self.follow = true;
        }
    }

    /// Top display row for the given viewport
    pub fn visible_offset(&self, viewport: Viewport) -> usize {
        let max = self.row_count(viewport.width).saturating_sub(viewport.height);
        if self.follow {
            max
        } else {
            self.scroll.min(max)
        }
    }
}
