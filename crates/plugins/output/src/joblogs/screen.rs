//! Virtual terminal screen that renders raw job output to HTML.
//!
//! The screen interprets the escape sequences CI tools actually emit (colors,
//! carriage-return progress bars, cursor movement, line erasure) and keeps only
//! what would be visible once the job finished. Buildkite's APC timestamp
//! markers (`ESC _ bk;t=<millis> BEL`) are attached to their line and rendered
//! as `<time>` elements.

use chrono::{DateTime, SecondsFormat};

use super::{ProcessError, TerminalRenderer};

/// Default limit for the cursor column.
pub const DEFAULT_MAX_COLUMNS: usize = 1_000;

/// Default limit for the number of rendered lines.
pub const DEFAULT_MAX_LINES: usize = 1_000_000;

/// Default limit for the cells held by all lines together.
pub const DEFAULT_MAX_CELLS: usize = 5_000_000;

const TAB_WIDTH: usize = 8;
const MAX_CSI_PARAMS: usize = 32;
const MAX_APC_LEN: usize = 4096;

/// Size limits for a [`Screen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenConfig {
    /// Characters per line before output wraps onto the next line
    pub max_columns: usize,
    /// Lines a single log may produce
    pub max_lines: usize,
    /// Cells a single log may occupy across all lines, blank padding included
    pub max_cells: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            max_columns: DEFAULT_MAX_COLUMNS,
            max_lines: DEFAULT_MAX_LINES,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

/// Renders through a fresh [`Screen`] per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenRenderer {
    config: ScreenConfig,
}

impl ScreenRenderer {
    pub fn new(config: ScreenConfig) -> Self {
        Self { config }
    }
}

impl TerminalRenderer for ScreenRenderer {
    fn render(&self, raw: &[u8]) -> Result<String, ProcessError> {
        let mut screen = Screen::new(self.config)?;
        screen.write(raw)?;
        Ok(screen.as_html())
    }
}

// =============================================================================
// Cells and styles
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Color {
    #[default]
    Default,
    /// Basic or bright palette entry, stored as its SGR code (30-37, 90-97, 40-47, 100-107)
    Sgr(u16),
    /// 256-colour palette index
    Xterm(u8),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Style {
    bold: bool,
    faint: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    fg: Color,
    bg: Color,
}

impl Style {
    fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    fn classes(&self) -> Vec<String> {
        let mut classes = Vec::new();
        for (on, class) in [
            (self.bold, "term-fg1"),
            (self.faint, "term-fg2"),
            (self.italic, "term-fg3"),
            (self.underline, "term-fg4"),
            (self.strike, "term-fg9"),
        ] {
            if on {
                classes.push(class.to_string());
            }
        }
        match self.fg {
            Color::Sgr(code) => classes.push(format!("term-fg{}", code)),
            Color::Xterm(n) => classes.push(format!("term-fgx{}", n)),
            _ => {}
        }
        match self.bg {
            Color::Sgr(code) => classes.push(format!("term-bg{}", code)),
            Color::Xterm(n) => classes.push(format!("term-bgx{}", n)),
            _ => {}
        }
        classes
    }

    fn inline_style(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Color::Rgb(r, g, b) = self.fg {
            parts.push(format!("color:rgb({},{},{})", r, g, b));
        }
        if let Color::Rgb(r, g, b) = self.bg {
            parts.push(format!("background-color:rgb({},{},{})", r, g, b));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(";"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    style: Style,
}

const BLANK: Cell = Cell {
    ch: ' ',
    style: Style {
        bold: false,
        faint: false,
        italic: false,
        underline: false,
        strike: false,
        fg: Color::Default,
        bg: Color::Default,
    },
};

#[derive(Debug, Clone, Default)]
struct Line {
    cells: Vec<Cell>,
    timestamp: Option<i64>,
}

// =============================================================================
// Parser state
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Apc,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Csi,
    /// Inside an OSC/DCS/SOS/PM/APC string
    Str(StringKind),
    /// Saw ESC inside a string; `\` terminates it
    StrEscape(StringKind),
    /// Designating a character set; the next char is consumed
    Charset,
}

/// A virtual terminal screen whose scrollback is bounded by [`ScreenConfig`].
#[derive(Debug)]
pub struct Screen {
    config: ScreenConfig,
    lines: Vec<Line>,
    /// Sum of `cells.len()` over `lines`
    used_cells: usize,
    x: usize,
    y: usize,
    style: Style,
    saved: Option<(usize, usize)>,
    state: State,
    params: Vec<u16>,
    param: Option<u16>,
    private: bool,
    apc: String,
}

impl Screen {
    /// Create an empty screen.
    pub fn new(config: ScreenConfig) -> Result<Self, ProcessError> {
        if config.max_columns == 0 || config.max_lines == 0 {
            return Err(ProcessError::TerminalInit(format!(
                "invalid screen size {}x{}",
                config.max_columns, config.max_lines
            )));
        }
        if config.max_cells == 0 {
            return Err(ProcessError::TerminalInit(
                "cell limit must be positive".to_string(),
            ));
        }

        Ok(Self {
            config,
            lines: Vec::new(),
            used_cells: 0,
            x: 0,
            y: 0,
            style: Style::default(),
            saved: None,
            state: State::Ground,
            params: Vec::new(),
            param: None,
            private: false,
            apc: String::new(),
        })
    }

    /// Feed raw output to the screen. Invalid UTF-8 becomes U+FFFD.
    pub fn write(&mut self, raw: &[u8]) -> Result<(), ProcessError> {
        for ch in String::from_utf8_lossy(raw).chars() {
            self.advance(ch)?;
        }
        Ok(())
    }

    fn advance(&mut self, ch: char) -> Result<(), ProcessError> {
        match self.state {
            State::Ground => self.ground(ch)?,
            State::Escape => self.escape(ch),
            State::Csi => self.csi(ch),
            State::Str(kind) => match ch {
                '\x07' => self.finish_string(kind)?,
                '\x1b' => self.state = State::StrEscape(kind),
                _ => {
                    if kind == StringKind::Apc && self.apc.len() < MAX_APC_LEN {
                        self.apc.push(ch);
                    }
                }
            },
            State::StrEscape(kind) => {
                self.finish_string(kind)?;
                if ch != '\\' {
                    self.escape(ch);
                }
            }
            State::Charset => self.state = State::Ground,
        }
        Ok(())
    }

    fn ground(&mut self, ch: char) -> Result<(), ProcessError> {
        match ch {
            '\x1b' => self.state = State::Escape,
            c if c.is_control() => self.control(c),
            c => self.print(c)?,
        }
        Ok(())
    }

    fn control(&mut self, ch: char) {
        match ch {
            '\n' => {
                self.y += 1;
                self.x = 0;
            }
            '\r' => self.x = 0,
            '\x08' => self.x = self.x.saturating_sub(1),
            '\t' => {
                let next = (self.x / TAB_WIDTH + 1) * TAB_WIDTH;
                self.x = next.min(self.config.max_columns - 1);
            }
            _ => {}
        }
    }

    fn escape(&mut self, ch: char) {
        self.state = State::Ground;
        match ch {
            '[' => {
                self.params.clear();
                self.param = None;
                self.private = false;
                self.state = State::Csi;
            }
            '_' => {
                self.apc.clear();
                self.state = State::Str(StringKind::Apc);
            }
            ']' | 'P' | 'X' | '^' => self.state = State::Str(StringKind::Ignored),
            '(' | ')' | '*' | '+' => self.state = State::Charset,
            '7' => self.saved = Some((self.x, self.y)),
            '8' => self.restore_cursor(),
            'D' => self.y += 1,
            'E' => {
                self.y += 1;
                self.x = 0;
            }
            'M' => self.y = self.y.saturating_sub(1),
            'c' => self.style = Style::default(),
            '\x1b' => self.state = State::Escape,
            _ => {}
        }
    }

    fn csi(&mut self, ch: char) {
        match ch {
            '0'..='9' => {
                let digit = ch as u16 - '0' as u16;
                let value = self.param.unwrap_or(0);
                self.param = Some(value.saturating_mul(10).saturating_add(digit));
            }
            ';' | ':' => {
                let value = self.param.take().unwrap_or(0);
                if self.params.len() < MAX_CSI_PARAMS {
                    self.params.push(value);
                }
            }
            '?' | '>' | '=' | '<' => self.private = true,
            ' '..='/' => {}
            '@'..='~' => {
                if let Some(value) = self.param.take() {
                    if self.params.len() < MAX_CSI_PARAMS {
                        self.params.push(value);
                    }
                }
                self.state = State::Ground;
                if !self.private {
                    self.dispatch_csi(ch);
                }
            }
            '\x1b' => self.state = State::Escape,
            c if c.is_control() => self.control(c),
            _ => self.state = State::Ground,
        }
    }

    /// Numeric parameter `index`, where 0 or missing means `default`.
    fn param_or(&self, index: usize, default: usize) -> usize {
        match self.params.get(index) {
            Some(&v) if v != 0 => v as usize,
            _ => default,
        }
    }

    fn dispatch_csi(&mut self, action: char) {
        let n = self.param_or(0, 1);
        match action {
            'A' => self.y = self.y.saturating_sub(n),
            'B' => self.cursor_down(n),
            'C' => self.x = self.clamp_column(self.x.saturating_add(n)),
            'D' => self.x = self.x.saturating_sub(n),
            'E' => {
                self.cursor_down(n);
                self.x = 0;
            }
            'F' => {
                self.y = self.y.saturating_sub(n);
                self.x = 0;
            }
            'G' => self.x = self.clamp_column(n - 1),
            // Rows are meaningless without a viewport; only the column is honoured.
            'H' | 'f' => self.x = self.clamp_column(self.param_or(1, 1) - 1),
            'J' => self.erase_in_display(self.params.first().copied().unwrap_or(0)),
            'K' => self.erase_in_line(self.params.first().copied().unwrap_or(0)),
            'm' => self.select_graphic_rendition(),
            's' => self.saved = Some((self.x, self.y)),
            'u' => self.restore_cursor(),
            _ => {}
        }
    }

    fn clamp_column(&self, x: usize) -> usize {
        x.min(self.config.max_columns - 1)
    }

    /// Moving down never goes past the line after the current content.
    fn cursor_down(&mut self, n: usize) {
        let limit = self.lines.len().max(self.y);
        self.y = self.y.saturating_add(n).min(limit);
    }

    fn restore_cursor(&mut self) {
        if let Some((x, y)) = self.saved {
            self.x = x;
            self.y = y;
        }
    }

    fn erase_in_line(&mut self, mode: u16) {
        let x = self.x;
        let Some(line) = self.lines.get_mut(self.y) else {
            return;
        };
        match mode {
            0 => {
                self.used_cells -= line.cells.len().saturating_sub(x);
                line.cells.truncate(x);
            }
            1 => {
                let end = (x + 1).min(line.cells.len());
                line.cells[..end].fill(BLANK);
            }
            2 => {
                self.used_cells -= line.cells.len();
                line.cells.clear();
            }
            _ => {}
        }
    }

    fn erase_in_display(&mut self, mode: u16) {
        match mode {
            0 => {
                self.erase_in_line(0);
                for line in self.lines.iter_mut().skip(self.y + 1) {
                    self.used_cells -= line.cells.len();
                    line.cells.clear();
                }
            }
            1 => {
                self.erase_in_line(1);
                let y = self.y.min(self.lines.len());
                for line in &mut self.lines[..y] {
                    self.used_cells -= line.cells.len();
                    line.cells.clear();
                }
            }
            // Whole-screen clears would wipe the scrollback of a log.
            _ => {}
        }
    }

    fn select_graphic_rendition(&mut self) {
        if self.params.is_empty() {
            self.style = Style::default();
            return;
        }

        let params = std::mem::take(&mut self.params);
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.style = Style::default(),
                1 => self.style.bold = true,
                2 => self.style.faint = true,
                3 => self.style.italic = true,
                4 => self.style.underline = true,
                9 => self.style.strike = true,
                21 | 22 => {
                    self.style.bold = false;
                    self.style.faint = false;
                }
                23 => self.style.italic = false,
                24 => self.style.underline = false,
                29 => self.style.strike = false,
                code @ (30..=37 | 90..=97) => self.style.fg = Color::Sgr(code),
                39 => self.style.fg = Color::Default,
                code @ (40..=47 | 100..=107) => self.style.bg = Color::Sgr(code),
                49 => self.style.bg = Color::Default,
                38 | 48 => {
                    let (color, consumed) = extended_color(&params[i + 1..]);
                    if let Some(color) = color {
                        if params[i] == 38 {
                            self.style.fg = color;
                        } else {
                            self.style.bg = color;
                        }
                    }
                    i += consumed;
                }
                _ => {}
            }
            i += 1;
        }
        self.params = params;
    }

    fn finish_string(&mut self, kind: StringKind) -> Result<(), ProcessError> {
        self.state = State::Ground;
        if kind != StringKind::Apc {
            return Ok(());
        }

        let apc = std::mem::take(&mut self.apc);
        if let Some(millis) = parse_timestamp(&apc) {
            let line = self.line_mut()?;
            if line.timestamp.is_none() {
                line.timestamp = Some(millis);
            }
        }
        Ok(())
    }

    fn print(&mut self, ch: char) -> Result<(), ProcessError> {
        if self.x >= self.config.max_columns {
            self.y += 1;
            self.x = 0;
        }

        let x = self.x;
        let cell = Cell {
            ch,
            style: self.style,
        };
        let len = self.line_mut()?.cells.len();
        if len <= x {
            self.claim_cells(x + 1 - len)?;
        }
        let line = self.line_mut()?;
        if line.cells.len() <= x {
            line.cells.resize(x + 1, BLANK);
        }
        line.cells[x] = cell;
        self.x += 1;
        Ok(())
    }

    fn claim_cells(&mut self, n: usize) -> Result<(), ProcessError> {
        let used = self.used_cells.saturating_add(n);
        if used > self.config.max_cells {
            return Err(ProcessError::TerminalWrite(format!(
                "log exceeds {} cells",
                self.config.max_cells
            )));
        }
        self.used_cells = used;
        Ok(())
    }

    /// The line under the cursor, creating it (and any gap before it) on demand.
    fn line_mut(&mut self) -> Result<&mut Line, ProcessError> {
        if self.y >= self.config.max_lines {
            return Err(ProcessError::TerminalWrite(format!(
                "log exceeds {} lines",
                self.config.max_lines
            )));
        }
        if self.lines.len() <= self.y {
            self.lines.resize_with(self.y + 1, Line::default);
        }
        Ok(&mut self.lines[self.y])
    }

    /// Render the screen as HTML, one line per screen line.
    pub fn as_html(&self) -> String {
        self.lines
            .iter()
            .map(render_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse `38;5;n` / `38;2;r;g;b` arguments. Returns the colour and how many
/// parameters were consumed.
fn extended_color(args: &[u16]) -> (Option<Color>, usize) {
    match args {
        [5, n, ..] => (u8::try_from(*n).ok().map(Color::Xterm), 2),
        [2, r, g, b, ..] => {
            let rgb = (u8::try_from(*r), u8::try_from(*g), u8::try_from(*b));
            match rgb {
                (Ok(r), Ok(g), Ok(b)) => (Some(Color::Rgb(r, g, b)), 4),
                _ => (None, 4),
            }
        }
        [5] => (None, 1),
        [2, rest @ ..] => (None, 1 + rest.len()),
        _ => (None, 0),
    }
}

/// Parse a Buildkite `bk;t=<millis>` APC payload.
fn parse_timestamp(apc: &str) -> Option<i64> {
    apc.strip_prefix("bk;")?
        .split(';')
        .find_map(|field| field.strip_prefix("t="))
        .and_then(|t| t.parse().ok())
}

fn render_line(line: &Line) -> String {
    let mut html = String::new();

    if let Some(datetime) = line
        .timestamp
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    {
        html.push_str(&format!(
            "<time datetime=\"{}\">{}</time>",
            datetime, datetime
        ));
    }

    let end = line
        .cells
        .iter()
        .rposition(|cell| *cell != BLANK)
        .map_or(0, |i| i + 1);
    let cells = &line.cells[..end];

    let mut start = 0;
    while start < cells.len() {
        let style = cells[start].style;
        let run_len = cells[start..]
            .iter()
            .take_while(|cell| cell.style == style)
            .count();
        let text: String = cells[start..start + run_len].iter().map(|c| c.ch).collect();
        push_run(&mut html, &style, &text);
        start += run_len;
    }

    html
}

fn push_run(html: &mut String, style: &Style, text: &str) {
    if style.is_plain() {
        push_escaped(html, text);
        return;
    }

    html.push_str("<span");
    let classes = style.classes();
    if !classes.is_empty() {
        html.push_str(&format!(" class=\"{}\"", classes.join(" ")));
    }
    if let Some(inline) = style.inline_style() {
        html.push_str(&format!(" style=\"{}\"", inline));
    }
    html.push('>');
    push_escaped(html, text);
    html.push_str("</span>");
}

fn push_escaped(html: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            c => html.push(c),
        }
    }
}
