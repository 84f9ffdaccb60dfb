//! Report view app.
//!
//! Resolves a report from the navigation route, sequences the load
//! pipeline (document, settings, progress, header/menu, refresh), and
//! drives panel visibility. Navigating to the already-loaded report
//! without new filter options is a no-op so filters, scroll position
//! and column widths survive; navigating with options refreshes the
//! view while reusing the loaded document and settings.

pub mod menu;

use crate::api::client::ReportTransport;
use crate::api::models::{DoctypeMeta, ReportDocument, ReportGeneratedEvent};
use crate::route::Route;
use crate::settings::{self, ReportSettings};
use crate::tui::{App, Command, Subscription, Theme};
use crossterm::event::KeyCode;
use menu::{MenuAction, MenuEntry};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Page key this app answers to when the route carries none.
const DEFAULT_PAGE: &str = "report-view";

/// Minimum spacing between refresh executions; calls arriving inside
/// the window coalesce into one trailing execution.
const REFRESH_THROTTLE: Duration = Duration::from_millis(300);

/// Reports the server builds faster than this get no progress bar.
const PROGRESS_THRESHOLD_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparedReportAction {
    New,
    Rebuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
}

/// Which of the page's panels are currently visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelVisibility {
    pub message: bool,
    pub report: bool,
    pub chart: bool,
    pub summary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub elapsed: u64,
    pub total: u64,
}

/// Dismissible notification about a generated prepared-report
/// artifact. Carries the artifact name; never navigates on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub text: String,
    pub artifact: Option<String>,
}

/// View state owned by the datatable subsystem. Preserved across soft
/// refreshes, reset on full report loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatatableState {
    pub column_widths: Vec<u16>,
    pub scroll_offset: usize,
}

/// 300ms refresh throttle with trailing-call coalescing.
#[derive(Debug)]
struct Throttle {
    min_interval: Duration,
    last_fire: Option<Instant>,
    pending: bool,
}

impl Throttle {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fire: None,
            pending: false,
        }
    }

    /// True when the call may run now; otherwise records a trailing
    /// call for later release.
    fn acquire(&mut self, now: Instant) -> bool {
        match self.last_fire {
            Some(last) if now.duration_since(last) < self.min_interval => {
                self.pending = true;
                false
            }
            _ => {
                self.last_fire = Some(now);
                true
            }
        }
    }

    /// Release the coalesced trailing call once the interval passed.
    fn take_pending(&mut self, now: Instant) -> bool {
        let due = self
            .last_fire
            .is_none_or(|last| now.duration_since(last) >= self.min_interval);
        if self.pending && due {
            self.pending = false;
            self.last_fire = Some(now);
            true
        } else {
            false
        }
    }

    fn has_pending(&self) -> bool {
        self.pending
    }
}

pub struct State {
    transport: Arc<dyn ReportTransport>,
    route: Route,
    page_name: String,
    initialized: bool,
    scaffold_built: bool,
    phase: LoadPhase,

    report_name: Option<String>,
    title: String,
    report_doc: Option<ReportDocument>,
    report_settings: Option<Arc<ReportSettings>>,
    doctype_meta: Option<DoctypeMeta>,
    datatable: Option<DatatableState>,

    /// Explicit prepared-report selection from route options.
    prepared_report_name: Option<String>,
    /// Artifact currently backing the view.
    prepared_report_doc_name: Option<String>,
    prepared_report_action: PreparedReportAction,
    generate_disabled: bool,

    panels: PanelVisibility,
    message: Option<String>,
    progress: Option<Progress>,
    alert: Option<Alert>,
    menu: Vec<MenuEntry>,

    /// Bumped on every full load; async completions carry the
    /// generation they were started under and stale ones are dropped.
    load_generation: u64,
    refresh_throttle: Throttle,
}

impl State {
    fn new(route: Route, transport: Arc<dyn ReportTransport>) -> Self {
        Self {
            transport,
            route,
            page_name: String::new(),
            initialized: false,
            scaffold_built: false,
            phase: LoadPhase::Idle,
            report_name: None,
            title: String::new(),
            report_doc: None,
            report_settings: None,
            doctype_meta: None,
            datatable: None,
            prepared_report_name: None,
            prepared_report_doc_name: None,
            prepared_report_action: PreparedReportAction::New,
            generate_disabled: false,
            panels: PanelVisibility::default(),
            message: None,
            progress: None,
            alert: None,
            menu: Vec::new(),
            load_generation: 0,
            refresh_throttle: Throttle::new(REFRESH_THROTTLE),
        }
    }

    /// Ordered one-time setup. Safe to call on every show.
    fn ensure_init(&mut self) {
        if self.initialized {
            return;
        }
        self.page_name = self
            .route
            .page_name()
            .unwrap_or(DEFAULT_PAGE)
            .to_string();
        self.refresh_throttle = Throttle::new(REFRESH_THROTTLE);
        self.build_scaffold();
        // The report_generated subscription activates with this flag.
        self.initialized = true;
        log::info!("Initialized report view for page '{}'", self.page_name);
    }

    fn build_scaffold(&mut self) {
        if self.scaffold_built {
            return;
        }
        self.panels = PanelVisibility::default();
        self.scaffold_built = true;
    }

    fn rebuild_menu(&mut self) {
        self.menu = menu::standard_menu();
        self.menu.extend(menu::report_menu());
    }

    pub fn panels(&self) -> PanelVisibility {
        self.panels
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }
}

#[derive(Clone)]
pub struct LoadedDocument {
    doc: ReportDocument,
    meta: Option<DoctypeMeta>,
}

#[derive(Clone)]
pub enum Msg {
    /// The page was shown; run init once, then dispatch the route.
    Shown,
    RouteChanged(Route),
    DocumentLoaded {
        generation: u64,
        result: Result<LoadedDocument, String>,
    },
    SettingsResolved {
        generation: u64,
        result: Result<Arc<ReportSettings>, String>,
    },
    /// The datatable subsystem finished rendering the refreshed view.
    RenderCompleted { generation: u64 },
    ProgressTick,
    RefreshRequested,
    ThrottleReleased,
    ReportGenerated(ReportGeneratedEvent),
    DismissAlert,
    Menu(MenuAction),
    Quit,
}

/// Parameters the viewer is started with.
pub struct Params {
    pub route: Route,
    pub transport: Arc<dyn ReportTransport>,
}

pub struct ReportViewApp;

impl App for ReportViewApp {
    type State = State;
    type Msg = Msg;
    type InitParams = Params;

    fn init(params: Params) -> (State, Command<Msg>) {
        let state = State::new(params.route, params.transport);
        (state, Command::perform(async {}, |_| Msg::Shown))
    }

    fn update(state: &mut State, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::Shown => {
                state.ensure_init();
                dispatch_route(state)
            }

            Msg::RouteChanged(route) => {
                state.route = route;
                dispatch_route(state)
            }

            Msg::DocumentLoaded { generation, result } => {
                if generation != state.load_generation {
                    log::debug!("Discarding stale document load (generation {})", generation);
                    return Command::None;
                }
                match result {
                    Ok(loaded) => {
                        state.title = loaded.doc.name.clone();
                        state.doctype_meta = loaded.meta;
                        state.report_doc = Some(loaded.doc.clone());

                        let transport = state.transport.clone();
                        Command::perform(
                            async move {
                                settings::resolve(transport.as_ref(), &loaded.doc)
                                    .await
                                    .map_err(|e| e.to_string())
                            },
                            move |result| Msg::SettingsResolved { generation, result },
                        )
                    }
                    Err(error) => fail_load(state, error),
                }
            }

            Msg::SettingsResolved { generation, result } => {
                if generation != state.load_generation {
                    log::debug!("Discarding stale settings (generation {})", generation);
                    return Command::None;
                }
                match result {
                    Ok(resolved) => {
                        if resolved.execution_time >= PROGRESS_THRESHOLD_SECS {
                            state.progress = Some(Progress {
                                elapsed: 0,
                                total: resolved.execution_time,
                            });
                        }
                        if let (Some(provider), Some(doc)) =
                            (resolved.provider.as_ref(), state.report_doc.as_ref())
                        {
                            provider.on_load(doc);
                        }
                        state.report_settings = Some(resolved);
                        state.rebuild_menu();
                        refresh_report(state)
                    }
                    Err(error) => fail_load(state, error),
                }
            }

            Msg::RenderCompleted { generation } => {
                if generation != state.load_generation {
                    return Command::None;
                }
                state.phase = LoadPhase::Ready;
                state.progress = None;
                state.message = None;
                state.panels.message = false;
                state.panels.report = true;
                if state.datatable.is_none() {
                    state.datatable = Some(DatatableState::default());
                }
                log::info!("Report ready: {}", state.title);
                Command::None
            }

            Msg::ProgressTick => {
                if let Some(progress) = &mut state.progress {
                    progress.elapsed += 1;
                    log::debug!(
                        "Report build progress: {}/{}s",
                        progress.elapsed,
                        progress.total
                    );
                }
                Command::None
            }

            Msg::RefreshRequested => request_refresh(state),

            Msg::ThrottleReleased => {
                if state.refresh_throttle.take_pending(Instant::now()) {
                    refresh_report(state)
                } else {
                    Command::None
                }
            }

            Msg::ReportGenerated(event) => {
                // The server finished a build; the generate action
                // comes back regardless of which report it was for.
                state.generate_disabled = false;

                let Some(report_label) = event.report_name.clone() else {
                    return Command::None;
                };
                state.prepared_report_action = PreparedReportAction::Rebuild;

                if state.prepared_report_doc_name.as_deref() == Some(event.name.as_str()) {
                    request_refresh(state)
                } else {
                    state.alert = Some(Alert {
                        text: format!("Report {} has been generated.", report_label),
                        artifact: Some(event.name),
                    });
                    Command::None
                }
            }

            Msg::DismissAlert => {
                state.alert = None;
                Command::None
            }

            Msg::Menu(action) => {
                let Some(entry) = state.menu.iter().find(|e| e.action == action) else {
                    log::debug!("Ignoring unknown action: {:?}", action);
                    return Command::None;
                };
                if !(entry.condition)(state) {
                    return Command::None;
                }
                match action {
                    MenuAction::Refresh => request_refresh(state),
                    MenuAction::GenerateReport => {
                        state.generate_disabled = true;
                        Command::publish(
                            action.topic(),
                            serde_json::json!({ "report": state.report_name }),
                        )
                    }
                    delegated => Command::publish(
                        delegated.topic(),
                        serde_json::json!({ "report": state.report_name }),
                    ),
                }
            }

            Msg::Quit => Command::Quit,
        }
    }

    fn view(state: &State, frame: &mut Frame, theme: &Theme) {
        draw(state, frame, theme);
    }

    fn subscriptions(state: &State) -> Vec<Subscription<Msg>> {
        let mut subs = vec![Subscription::keyboard(
            KeyCode::Char('q'),
            "Quit",
            Msg::Quit,
        )];

        for entry in &state.menu {
            if let Some(key) = entry.key {
                if (entry.condition)(state) {
                    subs.push(Subscription::keyboard(key, entry.label, Msg::Menu(entry.action)));
                }
            }
        }

        if state.alert.is_some() {
            subs.push(Subscription::keyboard(
                KeyCode::Esc,
                "Dismiss alert",
                Msg::DismissAlert,
            ));
        }

        if state.initialized {
            subs.push(Subscription::subscribe("report_generated", |data| {
                serde_json::from_value::<ReportGeneratedEvent>(data)
                    .ok()
                    .map(Msg::ReportGenerated)
            }));
        }

        // Progress and throttle timers exist only while their state
        // does, so supersession or completion cancels them.
        if state.progress.is_some() {
            subs.push(Subscription::timer(
                Duration::from_secs(1),
                Msg::ProgressTick,
            ));
        }
        if state.refresh_throttle.has_pending() {
            subs.push(Subscription::timer(REFRESH_THROTTLE, Msg::ThrottleReleased));
        }

        subs
    }

    fn title() -> &'static str {
        "Report View"
    }

    fn status(state: &State, theme: &Theme) -> Option<Line<'static>> {
        match state.phase {
            LoadPhase::Loading => Some(Line::from(Span::styled(
                "Loading...",
                theme.warning_style(),
            ))),
            LoadPhase::Ready => Some(Line::from(Span::styled(
                state.title.clone(),
                theme.success_style(),
            ))),
            LoadPhase::Idle => None,
        }
    }
}

/// The load() decision: full load, soft refresh, or no-op.
fn dispatch_route(state: &mut State) -> Command<Msg> {
    let Some(report_name) = state.route.report_name().map(str::to_string) else {
        return show_no_report(state);
    };

    if let Some(artifact) = state.route.prepared_report_name() {
        state.prepared_report_name = Some(artifact.to_string());
        state.prepared_report_doc_name = Some(artifact.to_string());
    }

    if state.report_name.as_deref() != Some(report_name.as_str()) {
        load_report(state, report_name)
    } else if state.route.has_options() {
        refresh_report(state)
    } else {
        // Same report, nothing new: filters, scroll position and
        // column widths stay exactly as they are.
        Command::None
    }
}

fn show_no_report(state: &mut State) -> Command<Msg> {
    state.phase = LoadPhase::Idle;
    state.panels = PanelVisibility {
        message: true,
        ..Default::default()
    };
    state.message = Some(
        "No report selected. Run `reportview-cli list` to see the reports you can open."
            .to_string(),
    );
    Command::None
}

fn load_report(state: &mut State, report_name: String) -> Command<Msg> {
    state.load_generation += 1;
    let generation = state.load_generation;

    // Per-report toolbar additions from the previous report go away;
    // the full set is rebuilt once settings resolve.
    state.menu = menu::standard_menu();
    state.report_name = Some(report_name.clone());
    state.title = report_name.clone();
    state.report_doc = None;
    state.report_settings = None;
    state.doctype_meta = None;
    state.datatable = None;
    state.prepared_report_doc_name = state.prepared_report_name.clone();
    state.prepared_report_action = PreparedReportAction::New;
    state.phase = LoadPhase::Loading;
    state.progress = None;
    state.panels = PanelVisibility {
        message: true,
        ..Default::default()
    };
    state.message = Some(format!("Loading {}...", report_name));

    log::info!("Loading report: {} (generation {})", report_name, generation);

    let transport = state.transport.clone();
    Command::perform(
        async move {
            let doc = transport.get_report_doc(&report_name).await?;
            // Schema prefetch for later menu predicates; a failure
            // here must not sink the report itself.
            let meta = match transport.get_doctype_meta(&doc.ref_doctype).await {
                Ok(meta) => Some(meta),
                Err(e) => {
                    log::warn!("Schema prefetch failed for {}: {}", doc.ref_doctype, e);
                    None
                }
            };
            Ok(LoadedDocument { doc, meta })
        },
        move |result: Result<LoadedDocument, crate::api::ApiError>| Msg::DocumentLoaded {
            generation,
            result: result.map_err(|e| e.to_string()),
        },
    )
}

/// Soft refresh: document and settings stay, panels flip to the
/// loading message until the datatable subsystem reports back.
fn refresh_report(state: &mut State) -> Command<Msg> {
    state.prepared_report_name = None;
    state.phase = LoadPhase::Loading;
    state.panels = PanelVisibility {
        message: true,
        ..Default::default()
    };
    state.message = Some("Loading...".to_string());

    let generation = state.load_generation;
    Command::batch(vec![
        // Filter application and the data refresh itself belong to
        // the datatable subsystem.
        Command::publish(
            "report:refresh",
            serde_json::json!({
                "report": state.report_name,
                "filters": state.route.options(),
            }),
        ),
        Command::perform(async {}, move |_| Msg::RenderCompleted { generation }),
    ])
}

fn request_refresh(state: &mut State) -> Command<Msg> {
    if state.report_doc.is_none() {
        return Command::None;
    }
    if state.refresh_throttle.acquire(Instant::now()) {
        refresh_report(state)
    } else {
        log::debug!("Refresh throttled; trailing call queued");
        Command::None
    }
}

fn fail_load(state: &mut State, error: String) -> Command<Msg> {
    log::error!("Report load failed: {}", error);
    state.phase = LoadPhase::Idle;
    state.progress = None;
    state.panels = PanelVisibility {
        message: true,
        ..Default::default()
    };
    state.message = Some(error);
    Command::None
}

fn draw(state: &State, frame: &mut Frame, theme: &Theme) {
    let has_alert = state.alert.is_some();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(if has_alert { 1 } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_title(state, frame, theme, rows[0]);
    if let Some(alert) = &state.alert {
        draw_alert(alert, frame, theme, rows[1]);
    }
    draw_body(state, frame, theme, rows[2]);
    draw_help(state, frame, theme, rows[3]);
}

fn draw_title(state: &State, frame: &mut Frame, theme: &Theme, area: Rect) {
    let title = if state.title.is_empty() {
        "Report View".to_string()
    } else {
        format!("Report View — {}", state.title)
    };
    let mut spans = vec![Span::styled(
        title,
        Style::default().fg(theme.accent_primary).bold(),
    )];
    if state.phase == LoadPhase::Loading {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("Loading...", theme.warning_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_alert(alert: &Alert, frame: &mut Frame, theme: &Theme, area: Rect) {
    let mut spans = vec![Span::styled(alert.text.clone(), theme.warning_style())];
    if let Some(artifact) = &alert.artifact {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("[{}]", artifact),
            Style::default().fg(theme.accent_secondary).underlined(),
        ));
    }
    spans.push(Span::styled(
        "  (Esc to dismiss)",
        Style::default().fg(theme.text_tertiary),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_body(state: &State, frame: &mut Frame, theme: &Theme, area: Rect) {
    if state.panels.message {
        draw_message_panel(state, frame, theme, area);
        return;
    }
    if state.panels.report {
        let mut constraints = vec![Constraint::Min(3)];
        if state.panels.chart {
            constraints.push(Constraint::Length(8));
        }
        if state.panels.summary {
            constraints.push(Constraint::Length(4));
        }
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        draw_report_panel(state, frame, theme, parts[0]);
        let mut next = 1;
        if state.panels.chart {
            draw_placeholder("Chart", frame, theme, parts[next]);
            next += 1;
        }
        if state.panels.summary {
            draw_placeholder("Summary", frame, theme, parts[next]);
        }
    }
}

fn draw_message_panel(state: &State, frame: &mut Frame, theme: &Theme, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        state.message.clone().unwrap_or_default(),
        Style::default().fg(theme.text_secondary),
    ))];
    if let Some(progress) = state.progress {
        lines.push(Line::from(Span::styled(
            format!(
                "The server is building this report ({}s of ~{}s)",
                progress.elapsed, progress.total
            ),
            Style::default().fg(theme.text_tertiary),
        )));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_primary))
        .title("Status");

    if let Some(progress) = state.progress {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .split(block.inner(area));
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), parts[0]);

        let ratio = (progress.elapsed as f64 / progress.total.max(1) as f64).min(1.0);
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(theme.accent_primary))
                .ratio(ratio),
            parts[1],
        );
    } else {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
}

fn draw_report_panel(state: &State, frame: &mut Frame, theme: &Theme, area: Rect) {
    let mut lines = Vec::new();
    if let Some(doc) = &state.report_doc {
        let doctype = match &state.doctype_meta {
            Some(meta) => format!("{} ({} fields)", doc.ref_doctype, meta.fields.len()),
            None => doc.ref_doctype.clone(),
        };
        lines.push(Line::from(vec![
            Span::styled("Doctype: ", Style::default().fg(theme.text_tertiary)),
            Span::styled(doctype, Style::default().fg(theme.text_primary)),
        ]));
        if !doc.report_type.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Type: ", Style::default().fg(theme.text_tertiary)),
                Span::styled(doc.report_type.clone(), Style::default().fg(theme.text_primary)),
            ]));
        }
        if doc.prepared_report {
            let action = match state.prepared_report_action {
                PreparedReportAction::New => "new",
                PreparedReportAction::Rebuild => "rebuild",
            };
            lines.push(Line::from(vec![
                Span::styled("Prepared report: ", Style::default().fg(theme.text_tertiary)),
                Span::styled(
                    state
                        .prepared_report_doc_name
                        .clone()
                        .unwrap_or_else(|| format!("({})", action)),
                    Style::default().fg(theme.accent_secondary),
                ),
            ]));
        }
    }
    if let Some(resolved) = &state.report_settings {
        if !resolved.filters.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Filters",
                Style::default().fg(theme.accent_primary),
            )));
            for filter in &resolved.filters {
                let value = state
                    .route
                    .option(&filter.fieldname)
                    .map(str::to_string)
                    .or_else(|| filter.default.as_ref().map(ToString::to_string))
                    .unwrap_or_default();
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {}: ", filter.label),
                        Style::default().fg(theme.text_tertiary),
                    ),
                    Span::styled(value, Style::default().fg(theme.text_primary)),
                ]));
            }
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_primary))
        .title(state.title.clone());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn draw_placeholder(name: &str, frame: &mut Frame, theme: &Theme, area: Rect) {
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border_primary))
            .title(name),
        area,
    );
}

fn draw_help(state: &State, frame: &mut Frame, theme: &Theme, area: Rect) {
    let mut spans = Vec::new();
    for entry in &state.menu {
        if !(entry.condition)(state) {
            continue;
        }
        if let Some(key) = entry.key {
            if let KeyCode::Char(c) = key.code {
                spans.push(Span::styled(
                    format!("[{}] ", c),
                    Style::default().fg(theme.accent_primary),
                ));
                spans.push(Span::styled(
                    format!("{}  ", entry.label),
                    Style::default().fg(theme.text_secondary),
                ));
            }
        }
    }
    spans.push(Span::styled("[q] ", Style::default().fg(theme.accent_primary)));
    spans.push(Span::styled("Quit", Style::default().fg(theme.text_secondary)));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
