//! Interactive driver
//!
//! 거래소 선택부터 엔드포인트 호출, 저장까지의 흐름을 명시적인 상태 기계로 돌린다.
//! 거래소와 엔드포인트가 모두 플래그로 주어지면 한 사이클만 실행한다.

use chrono::Local;
use crossterm::style::Color;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::capabilities::CapabilityReport;
use super::catalog::Catalog;
use super::console::{Cell, Console, Table};
use super::endpoint::Endpoint;
use super::error::{PlaygroundError, PlaygroundResult};
use super::exporter::{ExportReport, Exporter, DEFAULT_OUTPUT_DIR};
use super::factory::{ExchangeFactory, DEFAULT_EXCHANGE};
use super::invoker::{self, InvocationRecord};
use super::params::{ParamResolver, ResolvedArgs};
use super::presenter;
use super::prompt::Prompter;
use super::session::{Credentials, Session};
use crate::types::Capability;

/// 엔드포인트 선택 화면의 페이지 크기
pub const PAGE_SIZE: usize = 50;

const MENU_CHOICES: [&str; 5] = ["1", "2", "3", "4", "5"];

/// 명령줄에서 넘어온 실행 옵션
#[derive(Debug, Default)]
pub struct DriverOptions {
    pub exchange: Option<String>,
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
    /// 인증 정보가 `--api-key`/`--secret`로 들어왔는지 여부
    pub credentials_from_flags: bool,
    /// `--symbol`, `--limit`, `--param name=value`
    pub params: HashMap<String, String>,
    pub export: bool,
    pub output_dir: PathBuf,
    pub debug: bool,
}

impl DriverOptions {
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ..Self::default()
        }
    }

    /// 거래소와 엔드포인트가 모두 주어지면 한 사이클만 실행
    pub fn is_single_shot(&self) -> bool {
        self.exchange.is_some() && self.endpoint.is_some()
    }
}

/// 실행 결과 (종료 코드 결정용)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// 단일 실행에서 호출이 실패함
    Failed,
    /// 명령줄 인증 정보 사용을 거절함
    Declined,
}

impl RunStatus {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::Failed | RunStatus::Declined => 1,
        }
    }
}

/// 드라이버 상태
enum State {
    SelectExchange,
    EnterCredentials(String),
    Connect(String, Option<Credentials>),
    BrowseCatalog,
    SelectEndpoint,
    PromptParameters(Endpoint),
    Invoke(Endpoint, ResolvedArgs),
    Present(InvocationRecord),
    OfferExport(InvocationRecord),
    Exit,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::SelectExchange => "select_exchange",
            State::EnterCredentials(_) => "enter_credentials",
            State::Connect(..) => "connect",
            State::BrowseCatalog => "browse_catalog",
            State::SelectEndpoint => "select_endpoint",
            State::PromptParameters(_) => "prompt_parameters",
            State::Invoke(..) => "invoke",
            State::Present(_) => "present",
            State::OfferExport(_) => "offer_export",
            State::Exit => "exit",
        }
    }
}

pub struct Driver<P: Prompter> {
    console: Console,
    prompter: P,
    factory: ExchangeFactory,
    exporter: Exporter,
    options: DriverOptions,
    session: Option<Session>,
}

impl<P: Prompter> Driver<P> {
    pub fn new(console: Console, prompter: P, options: DriverOptions) -> Self {
        Self {
            console,
            prompter,
            factory: ExchangeFactory::new(),
            exporter: Exporter::new(options.output_dir.clone()),
            options,
            session: None,
        }
    }

    pub fn with_factory(mut self, factory: ExchangeFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// 드라이버 실행. 어느 경로로 끝나든 인증 정보는 지워진다
    pub async fn run(&mut self) -> PlaygroundResult<RunStatus> {
        let result = self.run_inner().await;
        self.shutdown();
        match result {
            Err(PlaygroundError::Interrupted) => {
                self.console.blank();
                self.console.warn("Operation cancelled by user");
                Ok(RunStatus::Completed)
            }
            other => other,
        }
    }

    async fn run_inner(&mut self) -> PlaygroundResult<RunStatus> {
        if self.options.credentials_from_flags && !self.accept_flag_credentials().await? {
            self.console
                .warn("Exiting for security. Use interactive mode instead.");
            return Ok(RunStatus::Declined);
        }

        match (self.options.exchange.clone(), self.options.endpoint.clone()) {
            (Some(exchange), Some(endpoint)) => self.run_once(exchange, endpoint).await,
            _ => self.run_interactive().await,
        }
    }

    /// 세션을 닫고 남은 인증 정보를 지운다
    fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
        if let Some(mut credentials) = self.options.credentials.take() {
            credentials.clear();
        }
        debug!("driver shut down");
    }

    async fn accept_flag_credentials(&mut self) -> PlaygroundResult<bool> {
        self.console.panel(
            "Security Warning",
            &[
                "API credentials were passed as command line arguments.",
                "They may be visible in shell history and process listings.",
                "Prefer the interactive prompt or CCXT_API_KEY / CCXT_SECRET.",
            ],
            Color::Red,
        );
        match self
            .prompter
            .confirm("Continue with command line credentials?", false)
            .await
        {
            Ok(accepted) => Ok(accepted),
            Err(PlaygroundError::Interrupted) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// 단일 실행: 플래그만으로 연결, 인자 해석, 호출, 출력, 저장
    async fn run_once(&mut self, exchange: String, endpoint: String) -> PlaygroundResult<RunStatus> {
        let endpoint = match endpoint.parse::<Endpoint>() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                self.report(&PlaygroundError::invalid("endpoint", err.to_string()));
                return Ok(RunStatus::Failed);
            }
        };

        let credentials = self.options.credentials.take();
        match self.connect(&exchange, credentials).await {
            Ok(()) => {}
            Err(PlaygroundError::Interrupted) => return Err(PlaygroundError::Interrupted),
            Err(err) => {
                self.report(&err);
                return Ok(RunStatus::Failed);
            }
        }

        let args = match self.resolve_params(endpoint, false).await {
            Ok(args) => args,
            Err(PlaygroundError::Interrupted) => return Err(PlaygroundError::Interrupted),
            Err(err) => {
                self.report(&err);
                return Ok(RunStatus::Failed);
            }
        };

        let Some(record) = self.invoke(endpoint, args).await? else {
            return Ok(RunStatus::Failed);
        };
        presenter::present(&mut self.console, &record);

        if !record.is_success() {
            return Ok(RunStatus::Failed);
        }
        if record.payload().is_some_and(|p| !p.is_null()) {
            let ask = self.prompter.is_interactive();
            self.offer_export(&record, ask).await?;
        }
        Ok(RunStatus::Completed)
    }

    async fn run_interactive(&mut self) -> PlaygroundResult<RunStatus> {
        self.banner();

        let mut preset_endpoint = self.options.endpoint.take();
        let mut state = match self.options.exchange.take() {
            Some(exchange) => State::EnterCredentials(exchange),
            None => State::SelectExchange,
        };

        loop {
            debug!(state = state.name(), "driver state");
            state = match state {
                State::SelectExchange => State::EnterCredentials(self.select_exchange().await?),
                State::EnterCredentials(exchange) => {
                    let credentials = match self.options.credentials.take() {
                        Some(credentials) => Some(credentials),
                        None => self.ask_credentials(&exchange).await?,
                    };
                    State::Connect(exchange, credentials)
                }
                State::Connect(exchange, credentials) => {
                    match self.connect(&exchange, credentials).await {
                        Ok(()) => match preset_endpoint.take() {
                            Some(name) => match name.parse::<Endpoint>() {
                                Ok(endpoint) => State::PromptParameters(endpoint),
                                Err(err) => {
                                    self.report(&PlaygroundError::invalid("endpoint", err.to_string()));
                                    State::BrowseCatalog
                                }
                            },
                            None => State::BrowseCatalog,
                        },
                        Err(PlaygroundError::Interrupted) => {
                            return Err(PlaygroundError::Interrupted)
                        }
                        Err(err) => {
                            self.report(&err);
                            State::SelectExchange
                        }
                    }
                }
                State::BrowseCatalog => self.main_menu().await?,
                State::SelectEndpoint => match self.select_endpoint().await {
                    Ok(Some(endpoint)) => State::PromptParameters(endpoint),
                    Ok(None) => {
                        self.console.info("Returning to main menu.");
                        State::BrowseCatalog
                    }
                    // 선택 화면에서의 Ctrl-C는 메뉴로만 돌아간다
                    Err(PlaygroundError::Interrupted) => {
                        self.console.blank();
                        self.console.warn("Selection cancelled. Returning to main menu.");
                        State::BrowseCatalog
                    }
                    Err(err) => return Err(err),
                },
                State::PromptParameters(endpoint) => match self.resolve_params(endpoint, true).await {
                    Ok(args) => State::Invoke(endpoint, args),
                    Err(PlaygroundError::Interrupted) => return Err(PlaygroundError::Interrupted),
                    Err(err) => {
                        self.report(&err);
                        State::BrowseCatalog
                    }
                },
                State::Invoke(endpoint, args) => match self.invoke(endpoint, args).await? {
                    Some(record) => State::Present(record),
                    None => State::SelectExchange,
                },
                State::Present(record) => {
                    presenter::present(&mut self.console, &record);
                    if record.payload().is_some_and(|p| !p.is_null()) {
                        State::OfferExport(record)
                    } else {
                        State::BrowseCatalog
                    }
                }
                State::OfferExport(record) => {
                    self.offer_export(&record, true).await?;
                    State::BrowseCatalog
                }
                State::Exit => {
                    self.console.blank();
                    self.console.success("Goodbye!");
                    return Ok(RunStatus::Completed);
                }
            };
        }
    }

    fn banner(&mut self) {
        self.console.panel(
            "CCXT Playground",
            &["Explore and test unified exchange endpoints interactively."],
            Color::Cyan,
        );
        self.console.panel(
            "Security Notice",
            &[
                "API keys stay in memory for this session only.",
                "They are never written to exported files or logs.",
                "Use read-only keys whenever possible.",
            ],
            Color::Yellow,
        );
    }

    async fn select_exchange(&mut self) -> PlaygroundResult<String> {
        let (popular, others) = self.factory.grouped();
        let mut table = Table::new("Available Exchanges")
            .headers(["Popular Exchanges", "Other Exchanges"]);
        for i in 0..popular.len().max(others.len()) {
            table.row([
                popular.get(i).map_or_else(|| Cell::from(""), |id| Cell::colored(*id, Color::Cyan)),
                others.get(i).map_or_else(|| Cell::from(""), |id| Cell::colored(*id, Color::Blue)),
            ]);
        }
        self.console.blank();
        self.console.heading("Step 1: Select Exchange");
        self.console.table(&table);

        loop {
            let answer = self
                .prompter
                .ask("Enter exchange name", Some(DEFAULT_EXCHANGE))
                .await?
                .to_ascii_lowercase();
            match self.factory.resolve(&answer) {
                Ok(id) => return Ok(id.as_str().to_string()),
                Err(err) => self.console.error(&format!("{err}. Please try again.")),
            }
        }
    }

    async fn ask_credentials(&mut self, exchange: &str) -> PlaygroundResult<Option<Credentials>> {
        self.console.blank();
        self.console
            .heading(&format!("Step 2: API Credentials for {exchange}"));
        self.console
            .dim("Leave empty to use public endpoints only. The secret is not echoed.");

        let api_key = self.prompter.ask("Enter API Key (optional)", Some("")).await?;
        let secret = self.prompter.ask_hidden("Enter Secret (optional)").await?;
        Ok(Credentials::new(api_key, secret))
    }

    /// 세션 교체. 기존 세션의 인증 정보는 먼저 지운다
    async fn connect(
        &mut self,
        exchange: &str,
        credentials: Option<Credentials>,
    ) -> PlaygroundResult<()> {
        if let Some(previous) = self.session.take() {
            previous.close();
        }

        self.console.blank();
        self.console.info(&format!("Setting up {exchange}..."));
        let session = self.factory.open(exchange, credentials)?;
        if session.is_authenticated() {
            self.console.success("API credentials configured");
        }

        let load = session.client().load_markets(false);
        let loaded = match until_cancelled(&self.prompter, load).await {
            Ok(loaded) => loaded,
            Err(err) => {
                session.close();
                return Err(err);
            }
        };
        match loaded {
            Ok(markets) => self.console.success(&format!(
                "Successfully connected to {} ({} markets)",
                session.exchange(),
                markets.len()
            )),
            Err(err) => {
                warn!(exchange = %session.exchange(), error = %err, "market load failed");
                self.console.warn(&format!("Could not load markets: {err}"));
                self.console
                    .warn("Some endpoints might not work without network access or credentials");
            }
        }
        info!(exchange = %session.exchange(), "connected");
        self.session = Some(session);
        Ok(())
    }

    async fn main_menu(&mut self) -> PlaygroundResult<State> {
        let Some(exchange) = self.session.as_ref().map(Session::exchange) else {
            return Ok(State::SelectExchange);
        };

        self.console.blank();
        self.console.rule();
        self.console
            .heading(&format!("Connected to {exchange}. Available Actions:"));
        self.console.println("1. View all available endpoints");
        self.console.println("2. Check supported endpoints only");
        self.console.println("3. Test a specific endpoint");
        self.console.println("4. Change exchange");
        self.console.println("5. Exit");

        let choice = self
            .prompter
            .choose("Choose an option", &MENU_CHOICES, "3")
            .await?;
        let next = match choice.as_str() {
            "1" => {
                self.show_catalog().await?;
                State::BrowseCatalog
            }
            "2" => {
                self.show_capabilities().await?;
                State::BrowseCatalog
            }
            "3" => State::SelectEndpoint,
            "4" => {
                if let Some(session) = self.session.take() {
                    session.close();
                }
                State::SelectExchange
            }
            _ => State::Exit,
        };
        Ok(next)
    }

    async fn show_catalog(&mut self) -> PlaygroundResult<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let exchange = session.exchange();
        let catalog = Catalog::build(session.client());

        for (category, items) in catalog.groups() {
            let mut table = Table::new(format!("{} Endpoints", category.label()))
                .headers(["Method", "Status", "Description"]);
            for item in items {
                table.row([
                    Cell::colored(item.endpoint.name(), Color::Cyan),
                    status_cell(item.capability),
                    Cell::from(item.description),
                ]);
            }
            self.console.blank();
            self.console.table(&table);
        }
        self.console
            .dim(&format!("Total: {} endpoints", catalog.total()));

        self.console.rule();
        if self
            .prompter
            .confirm("Save endpoints information to JSON file?", false)
            .await?
        {
            let result = self.exporter.export_catalog(exchange, &catalog, Local::now());
            self.finish_export("Endpoints information saved to", result);
        }
        Ok(())
    }

    async fn show_capabilities(&mut self) -> PlaygroundResult<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let exchange = session.exchange();
        let report = CapabilityReport::build(session.client());

        for group in &report.groups {
            let mut table = Table::new(format!("{} Endpoints Support Status", group.name))
                .headers(["Endpoint", "Status", "Notes"]);
            let ordered = [
                (Capability::Supported, "Natively supported"),
                (Capability::Emulated, "Emulated by the library"),
                (Capability::NotSupported, "Not available on this exchange"),
            ];
            for (status, note) in ordered {
                for name in group.with_status(status) {
                    table.row([
                        Cell::from(name),
                        Cell::colored(status.label(), status_color(status)),
                        Cell::from(note),
                    ]);
                }
            }
            self.console.blank();
            self.console.table(&table);
        }

        let summary = report.summary;
        let mut table = Table::new(format!("Support Summary for {exchange}"))
            .headers(["Status", "Count", "Percentage"]);
        let rows = [
            (Capability::Supported, summary.supported, summary.support_percentage()),
            (Capability::Emulated, summary.emulated, summary.emulated_percentage()),
            (
                Capability::NotSupported,
                summary.not_supported,
                summary.not_supported_percentage(),
            ),
        ];
        for (status, count, percent) in rows {
            table.row([
                Cell::colored(status.label(), status_color(status)),
                Cell::from(count.to_string()),
                Cell::from(format!("{percent:.1}%")),
            ]);
        }
        table.row([
            Cell::from("Total Checked"),
            Cell::from(summary.total_checked.to_string()),
            Cell::from("100%"),
        ]);
        self.console.blank();
        self.console.table(&table);

        let info = &report.info;
        let mut table = Table::new("Exchange Information").headers(["Property", "Value"]);
        table.row(["Exchange ID".to_string(), info.id.clone()]);
        table.row(["Name".to_string(), info.name.clone()]);
        table.row(["API Version".to_string(), info.api_version.clone()]);
        table.row(["Rate Limit".to_string(), format!("{} ms", info.rate_limit_ms)]);
        table.row([
            "Sandbox Mode".to_string(),
            if info.sandbox { "✓ Enabled" } else { "✗ Not enabled" }.to_string(),
        ]);
        self.console.blank();
        self.console.table(&table);

        self.console.rule();
        if self
            .prompter
            .confirm("Save capabilities information to JSON file?", false)
            .await?
        {
            let result = self
                .exporter
                .export_capabilities(exchange, &report, Local::now());
            self.finish_export("Capabilities information saved to", result);
        }
        Ok(())
    }

    /// 페이지 단위 엔드포인트 선택. `q`이면 None
    async fn select_endpoint(&mut self) -> PlaygroundResult<Option<Endpoint>> {
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        let all = Catalog::build(session.client()).sorted();
        if all.is_empty() {
            self.console.warn("No endpoints available for this exchange");
            return Ok(None);
        }
        let pages = all.len().div_ceil(PAGE_SIZE);
        let mut page = 0;

        loop {
            let start = page * PAGE_SIZE;
            let end = (start + PAGE_SIZE).min(all.len());
            let slice = &all[start..end];
            let half = slice.len().div_ceil(2);

            let mut table = Table::new(format!(
                "Available Endpoints with Support Status (Page {} of {pages})",
                page + 1
            ))
            .headers(["#", "Status", "Method", "#", "Status", "Method"]);
            for row in 0..half {
                let mut cells = Vec::with_capacity(6);
                for column in [row, row + half] {
                    match slice.get(column) {
                        Some(item) => {
                            cells.push(Cell::from((start + column + 1).to_string()));
                            cells.push(status_cell(item.capability));
                            cells.push(Cell::colored(item.endpoint.name(), Color::Cyan));
                        }
                        None => cells.extend([Cell::from(""), Cell::from(""), Cell::from("")]),
                    }
                }
                table.row(cells);
            }

            self.console.blank();
            self.console.table(&table);
            self.console
                .dim("Legend: ✓ Supported   ⚡ Emulated   ✗ Not supported");
            let mut hints = Vec::new();
            if page + 1 < pages {
                hints.push("'n' next page");
            }
            if page > 0 {
                hints.push("'p' previous page");
            }
            hints.push("'q' back to menu");
            self.console.dim(&hints.join(", "));

            let answer = self
                .prompter
                .ask(
                    &format!("Select endpoint number (1-{}) or name", all.len()),
                    None,
                )
                .await?;
            let answer = answer.trim().to_ascii_lowercase();
            match answer.as_str() {
                "q" => return Ok(None),
                "n" | "" if page + 1 < pages => page += 1,
                "p" if page > 0 => page -= 1,
                "" | "n" | "p" => {}
                other => {
                    if let Ok(index) = other.parse::<usize>() {
                        if (1..=all.len()).contains(&index) {
                            return Ok(Some(all[index - 1].endpoint));
                        }
                        self.console.error(&format!(
                            "Invalid endpoint number. Must be between 1 and {}",
                            all.len()
                        ));
                    } else if let Ok(endpoint) = other.parse::<Endpoint>() {
                        return Ok(Some(endpoint));
                    } else {
                        self.console.error(&format!("Unknown endpoint '{other}'"));
                    }
                }
            }
        }
    }

    async fn resolve_params(
        &mut self,
        endpoint: Endpoint,
        interactive: bool,
    ) -> PlaygroundResult<ResolvedArgs> {
        let symbols = self
            .session
            .as_ref()
            .map(|s| s.client().symbols())
            .unwrap_or_default();
        let resolver = ParamResolver::new(interactive)
            .with_flags(self.options.params.clone())
            .with_symbols(symbols);

        self.console.blank();
        self.console
            .heading(&format!("Testing endpoint: {endpoint}"));
        self.console.dim(endpoint.description());
        let names: Vec<&str> = endpoint.params().iter().map(|p| p.name).collect();
        if !names.is_empty() {
            self.console
                .dim(&format!("Parameters: {}", names.join(", ")));
        }

        resolver.resolve(endpoint, &mut self.prompter).await
    }

    /// 세션이 없으면 None. 호출 중 Ctrl-C는 `Interrupted`
    async fn invoke(
        &mut self,
        endpoint: Endpoint,
        args: ResolvedArgs,
    ) -> PlaygroundResult<Option<InvocationRecord>> {
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        let signature = args.call_signature(endpoint);
        self.console.blank();
        self.console.info(&format!("Executing: {signature}"));
        let call = invoker::invoke(session, endpoint, args, self.options.debug);
        until_cancelled(&self.prompter, call).await.map(Some)
    }

    /// `--export`면 묻지 않고 저장, 아니면 `ask`일 때만 확인
    async fn offer_export(&mut self, record: &InvocationRecord, ask: bool) -> PlaygroundResult<()> {
        let wanted = if self.options.export {
            true
        } else if ask {
            self.console.rule();
            self.prompter
                .confirm("💾 Save response to JSON file?", false)
                .await?
        } else {
            false
        };
        if wanted {
            let result = self.exporter.export_invocation(record);
            self.finish_export("Response saved to", result);
        }
        Ok(())
    }

    /// 저장 실패는 보고만 하고 계속 진행
    fn finish_export(&mut self, label: &str, result: PlaygroundResult<ExportReport>) {
        match result {
            Ok(report) => {
                self.console
                    .success(&format!("{label}: {}", report.path.display()));
                if report.is_oversized() {
                    self.console
                        .warn(&format!("Large file: {}", report.size_label()));
                } else {
                    self.console
                        .dim(&format!("File size: {}", report.size_label()));
                }
            }
            Err(err) => self.report(&err),
        }
    }

    fn report(&mut self, err: &PlaygroundError) {
        debug!(kind = err.kind(), "reported error");
        self.console.error(&format!("Error: {err}"));
    }
}

/// 사용자가 취소하면 작업을 버리고 `Interrupted`
async fn until_cancelled<P, F>(prompter: &P, work: F) -> PlaygroundResult<F::Output>
where
    P: Prompter,
    F: Future,
{
    tokio::select! {
        biased;
        output = work => Ok(output),
        _ = prompter.cancelled() => Err(PlaygroundError::Interrupted),
    }
}

fn status_cell(capability: Capability) -> Cell {
    let icon = match capability {
        Capability::Supported => "✓",
        Capability::Emulated => "⚡",
        Capability::NotSupported => "✗",
    };
    Cell::colored(icon, status_color(capability))
}

fn status_color(status: Capability) -> Color {
    match status {
        Capability::Supported => Color::Green,
        Capability::Emulated => Color::Yellow,
        Capability::NotSupported => Color::Red,
    }
}
