//! User input
//!
//! 드라이버와 파라미터 해석기는 `Prompter`만 사용하므로 테스트에서는
//! `ScriptedPrompter`로 입력을 대신한다.

use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Stylize;
use crossterm::terminal;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc;
use std::thread;
use tokio::sync::oneshot;

use super::error::{PlaygroundError, PlaygroundResult};

/// 사용자 입력 소스
#[async_trait(?Send)]
pub trait Prompter {
    /// 한 줄 입력. 빈 입력이면 `default`를 반환
    async fn ask(&mut self, label: &str, default: Option<&str>) -> PlaygroundResult<String>;

    /// 화면에 표시하지 않는 입력 (시크릿)
    async fn ask_hidden(&mut self, label: &str) -> PlaygroundResult<String> {
        self.ask(label, None).await
    }

    /// y/n 확인
    async fn confirm(&mut self, label: &str, default: bool) -> PlaygroundResult<bool> {
        let hint = if default { "y" } else { "n" };
        loop {
            let answer = self.ask(&format!("{label} [y/n]"), Some(hint)).await?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }

    /// 보기 중 하나를 고를 때까지 반복
    async fn choose(
        &mut self,
        label: &str,
        choices: &[&str],
        default: &str,
    ) -> PlaygroundResult<String> {
        loop {
            let answer = self
                .ask(&format!("{label} [{}]", choices.join("/")), Some(default))
                .await?;
            let answer = answer.trim();
            if choices.contains(&answer) {
                return Ok(answer.to_string());
            }
        }
    }

    /// 사람이 응답할 수 있는 입력인지 여부
    fn is_interactive(&self) -> bool;

    /// 사용자가 진행 중인 작업을 취소하면 완료된다. 기본은 취소 수단 없음
    async fn cancelled(&self) {
        std::future::pending::<()>().await
    }
}

#[derive(Debug, Clone, Copy)]
enum ReadKind {
    Line,
    Hidden,
}

type Reply = oneshot::Receiver<PlaygroundResult<String>>;
type ReadRequest = (ReadKind, oneshot::Sender<PlaygroundResult<String>>);

/// 표준 입력 기반 프롬프터
///
/// 실제 읽기는 전용 스레드가 맡고, 질문마다 Ctrl-C(SIGINT)와 경쟁시킨다.
/// 입력 스레드는 프로세스 종료를 막지 않는다.
pub struct TerminalPrompter {
    color: bool,
    requests: mpsc::Sender<ReadRequest>,
    /// Ctrl-C로 끊긴 읽기. 스레드는 아직 그 줄을 기다리고 있다
    pending: Option<Reply>,
}

impl TerminalPrompter {
    pub fn new(color: bool) -> Self {
        let (requests, inbox) = mpsc::channel::<ReadRequest>();
        thread::spawn(move || {
            for (kind, reply) in inbox {
                let result = match kind {
                    ReadKind::Line => read_line(),
                    ReadKind::Hidden => read_hidden(),
                };
                let _ = reply.send(result);
            }
        });
        Self {
            color,
            requests,
            pending: None,
        }
    }

    fn write_label(&self, label: &str, default: Option<&str>) -> PlaygroundResult<()> {
        let mut out = io::stdout().lock();
        match default {
            Some(d) if !d.is_empty() && self.color => {
                write!(out, "{} {}: ", label.bold(), format!("({d})").cyan())?
            }
            Some(d) if !d.is_empty() => write!(out, "{label} ({d}): ")?,
            _ if self.color => write!(out, "{}: ", label.bold())?,
            _ => write!(out, "{label}: ")?,
        }
        out.flush()?;
        Ok(())
    }

    async fn read(&mut self, kind: ReadKind) -> PlaygroundResult<String> {
        let mut reply = match self.pending.take() {
            Some(reply) => reply,
            None => {
                let (tx, rx) = oneshot::channel();
                self.requests
                    .send((kind, tx))
                    .map_err(|_| PlaygroundError::Interrupted)?;
                rx
            }
        };

        tokio::select! {
            result = &mut reply => return result.unwrap_or(Err(PlaygroundError::Interrupted)),
            Ok(()) = tokio::signal::ctrl_c() => {}
        }
        // 다음 질문이 이 읽기의 결과를 이어받는다
        println!();
        self.pending = Some(reply);
        Err(PlaygroundError::Interrupted)
    }
}

fn read_line() -> PlaygroundResult<String> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        // EOF
        return Err(PlaygroundError::Interrupted);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// raw 모드에서 에코 없이 한 줄 읽기
fn read_hidden() -> PlaygroundResult<String> {
    if !io::stdin().is_terminal() {
        return read_line();
    }
    terminal::enable_raw_mode()?;
    let result = collect_keys();
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn collect_keys() -> PlaygroundResult<String> {
    let mut buffer = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(buffer),
            // raw 모드에서는 SIGINT 대신 키 이벤트로 들어온다
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                buffer.clear();
                return Err(PlaygroundError::Interrupted);
            }
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Esc => {
                buffer.clear();
                return Ok(buffer);
            }
            _ => {}
        }
    }
}

#[async_trait(?Send)]
impl Prompter for TerminalPrompter {
    async fn ask(&mut self, label: &str, default: Option<&str>) -> PlaygroundResult<String> {
        self.write_label(label, default)?;
        let line = self.read(ReadKind::Line).await?;
        if line.trim().is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(line.trim().to_string())
    }

    async fn ask_hidden(&mut self, label: &str) -> PlaygroundResult<String> {
        self.write_label(label, None)?;
        self.read(ReadKind::Hidden).await
    }

    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    async fn cancelled(&self) {
        // 시그널 핸들러를 못 붙이면 취소 수단이 없는 것으로 본다
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await
        }
    }
}

/// 미리 정한 응답을 순서대로 돌려주는 프롬프터
///
/// 응답이 바닥나면 `Interrupted`를 반환한다. 빈 문자열 응답은 기본값을 고르고,
/// [`ScriptedPrompter::CTRL_C`] 응답은 그 질문에서 Ctrl-C를 누른 것과 같다.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
    interactive: bool,
}

impl ScriptedPrompter {
    pub const CTRL_C: &'static str = "\u{3}";

    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
            interactive: true,
        }
    }

    /// 비대화형 입력 흉내 (파이프된 stdin 등)
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// 지금까지 표시된 질문
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait(?Send)]
impl Prompter for ScriptedPrompter {
    async fn ask(&mut self, label: &str, default: Option<&str>) -> PlaygroundResult<String> {
        self.asked.push(label.to_string());
        let answer = self.answers.pop_front().ok_or(PlaygroundError::Interrupted)?;
        if answer == Self::CTRL_C {
            return Err(PlaygroundError::Interrupted);
        }
        if answer.trim().is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer.trim().to_string())
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_defaults_and_exhaustion() {
        let mut prompter = ScriptedPrompter::new(["", "ETH/IDR"]);
        assert_eq!(prompter.ask("symbol", Some("BTC/IDR")).await.unwrap(), "BTC/IDR");
        assert_eq!(prompter.ask("symbol", Some("BTC/IDR")).await.unwrap(), "ETH/IDR");
        assert!(matches!(
            prompter.ask("symbol", None).await,
            Err(PlaygroundError::Interrupted)
        ));
        assert_eq!(prompter.asked().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_ctrl_c_interrupts_one_question() {
        let mut prompter = ScriptedPrompter::new([ScriptedPrompter::CTRL_C, "kraken"]);
        assert!(matches!(
            prompter.ask("exchange", Some("indodax")).await,
            Err(PlaygroundError::Interrupted)
        ));
        assert_eq!(prompter.ask("exchange", Some("indodax")).await.unwrap(), "kraken");
    }

    #[tokio::test]
    async fn test_confirm_retries_until_yes_or_no() {
        let mut prompter = ScriptedPrompter::new(["maybe", "Y"]);
        assert!(prompter.confirm("Save?", false).await.unwrap());

        let mut prompter = ScriptedPrompter::new([""]);
        assert!(!prompter.confirm("Save?", false).await.unwrap());
    }

    #[tokio::test]
    async fn test_choose() {
        let mut prompter = ScriptedPrompter::new(["9", "", "2"]);
        let choices = ["1", "2", "3"];
        assert_eq!(prompter.choose("Select action", &choices, "3").await.unwrap(), "3");
        assert_eq!(prompter.choose("Select action", &choices, "3").await.unwrap(), "2");
    }

    #[tokio::test]
    async fn test_scripted_input_is_never_cancelled() {
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            prompter.cancelled(),
        )
        .await;
        assert!(outcome.is_err());
    }
}
