//! Styled terminal output

use crossterm::style::{Color, Stylize};
use std::cell::RefCell;
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;
use unicode_width::UnicodeWidthStr;

pub const RULE_WIDTH: usize = 60;

/// 색상 지정이 가능한 표 셀
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub color: Option<Color>,
}

impl Cell {
    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            color: None,
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self { text, color: None }
    }
}

/// 텍스트 표
#[derive(Debug, Clone, Default)]
pub struct Table {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn untitled() -> Self {
        Self::default()
    }

    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn row<I, C>(&mut self, cells: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        (0..columns)
            .map(|i| {
                let header = self.headers.get(i).map_or(0, |h| h.width());
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.text.width())
                    .chain(std::iter::once(header))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// 표를 문자열로 렌더링
    pub fn render(&self, color: bool) -> String {
        let widths = self.widths();
        let border = format!(
            "+{}+",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );
        let line = |cells: Vec<(String, Option<Color>)>| -> String {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let (text, paint) = cells.get(i).cloned().unwrap_or_default();
                    let pad = " ".repeat(w.saturating_sub(text.width()));
                    match paint {
                        Some(c) if color => format!(" {}{pad} ", text.with(c)),
                        _ => format!(" {text}{pad} "),
                    }
                })
                .collect();
            format!("|{}|", parts.join("|"))
        };

        let mut out = Vec::new();
        if let Some(title) = &self.title {
            out.push(if color {
                title.as_str().bold().to_string()
            } else {
                title.clone()
            });
        }
        out.push(border.clone());
        if !self.headers.is_empty() {
            let header_color = color.then_some(Color::Cyan);
            out.push(line(
                self.headers
                    .iter()
                    .map(|h| (h.clone(), header_color))
                    .collect(),
            ));
            out.push(border.clone());
        }
        for row in &self.rows {
            out.push(line(row.iter().map(|c| (c.text.clone(), c.color)).collect()));
        }
        out.push(border);
        out.join("\n")
    }
}

/// 테스트에서 출력 내용을 읽기 위한 공유 버퍼
#[derive(Debug, Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 사용자 출력 (stdout). 로그는 stderr로 분리된다
pub struct Console {
    out: Box<dyn Write>,
    color: bool,
}

impl Console {
    /// stdout 콘솔. 터미널이 아니면 색상을 끈다
    pub fn stdout(color: bool) -> Self {
        let color = color && io::stdout().is_terminal();
        Self {
            out: Box::new(io::stdout()),
            color,
        }
    }

    /// 색상 없는 캡처 콘솔
    pub fn captured() -> (Self, Capture) {
        let capture = Capture::default();
        let console = Self {
            out: Box::new(capture.clone()),
            color: false,
        };
        (console, capture)
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn println(&mut self, text: impl AsRef<str>) {
        let _ = writeln!(self.out, "{}", text.as_ref());
        let _ = self.out.flush();
    }

    pub fn blank(&mut self) {
        self.println("");
    }

    pub fn heading(&mut self, text: &str) {
        let line = if self.color {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        };
        self.println(line);
    }

    pub fn success(&mut self, text: &str) {
        let line = self.paint(&format!("✓ {text}"), Color::Green);
        self.println(line);
    }

    pub fn info(&mut self, text: &str) {
        let line = self.paint(text, Color::Blue);
        self.println(line);
    }

    pub fn warn(&mut self, text: &str) {
        let line = self.paint(&format!("⚠ {text}"), Color::Yellow);
        self.println(line);
    }

    pub fn error(&mut self, text: &str) {
        let line = self.paint(text, Color::Red);
        self.println(line);
    }

    pub fn dim(&mut self, text: &str) {
        let line = self.paint(text, Color::DarkGrey);
        self.println(line);
    }

    pub fn rule(&mut self) {
        self.println("=".repeat(RULE_WIDTH));
    }

    /// 테두리 박스 안에 여러 줄 출력
    pub fn panel(&mut self, title: &str, lines: &[&str], color: Color) {
        let width = lines
            .iter()
            .map(|l| l.width())
            .chain(std::iter::once(title.width()))
            .max()
            .unwrap_or(0);
        let top = format!("┌─ {title} {}┐", "─".repeat(width.saturating_sub(title.width())));
        let bottom = format!("└{}┘", "─".repeat(width + 4));
        let top = self.paint(&top, color);
        self.println(top);
        for l in lines {
            let pad = " ".repeat(width.saturating_sub(l.width()));
            let edge = self.paint("│", color);
            self.println(format!("{edge}  {l}{pad}  {edge}"));
        }
        let bottom = self.paint(&bottom, color);
        self.println(bottom);
    }

    pub fn table(&mut self, table: &Table) {
        let rendered = table.render(self.color);
        self.println(rendered);
    }
}
