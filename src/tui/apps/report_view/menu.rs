//! Declarative menu surface for the report view.
//!
//! Entries are `{label, action, key, condition, standard}`; the
//! condition is evaluated against current state, so hidden entries
//! neither render in the help line nor bind their key. Actions whose
//! pipelines live outside the viewer (print, export, auto email) are
//! delegated by publishing their topic on the event bus.

use super::{LoadPhase, State};
use crate::tui::KeyBinding;
use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Refresh,
    EditReport,
    Print,
    Pdf,
    Export,
    GenerateReport,
    SetupAutoEmail,
    UserPermissions,
    ExportChart,
    ExportCard,
}

impl MenuAction {
    /// Bus topic used when the action is delegated to the host side.
    pub fn topic(&self) -> &'static str {
        match self {
            MenuAction::Refresh => "report:refresh",
            MenuAction::EditReport => "report:edit",
            MenuAction::Print => "report:print",
            MenuAction::Pdf => "report:pdf",
            MenuAction::Export => "report:export",
            MenuAction::GenerateReport => "report:generate",
            MenuAction::SetupAutoEmail => "report:auto-email",
            MenuAction::UserPermissions => "report:user-permissions",
            MenuAction::ExportChart => "report:export-chart",
            MenuAction::ExportCard => "report:export-card",
        }
    }
}

pub struct MenuEntry {
    pub label: &'static str,
    pub action: MenuAction,
    pub key: Option<KeyBinding>,
    pub condition: fn(&State) -> bool,
    /// Standard entries survive report changes; the rest are rebuilt
    /// per report.
    pub standard: bool,
}

fn has_doc(state: &State) -> bool {
    state.report_doc.is_some()
}

fn ready(state: &State) -> bool {
    state.report_doc.is_some() && state.phase == LoadPhase::Ready
}

fn can_generate(state: &State) -> bool {
    state
        .report_doc
        .as_ref()
        .is_some_and(|doc| doc.prepared_report)
        && !state.generate_disabled
}

fn has_settings(state: &State) -> bool {
    state.report_settings.is_some() && state.phase == LoadPhase::Ready
}

/// Entries present on every report.
pub fn standard_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry {
            label: "Refresh",
            action: MenuAction::Refresh,
            key: Some(KeyBinding::new(KeyCode::Char('r'))),
            condition: has_doc,
            standard: true,
        },
        MenuEntry {
            label: "Edit Report",
            action: MenuAction::EditReport,
            key: Some(KeyBinding::new(KeyCode::Char('e'))),
            condition: has_doc,
            standard: true,
        },
        MenuEntry {
            label: "Print",
            action: MenuAction::Print,
            key: Some(KeyBinding::new(KeyCode::Char('p'))),
            condition: ready,
            standard: true,
        },
        MenuEntry {
            label: "PDF",
            action: MenuAction::Pdf,
            key: Some(KeyBinding::new(KeyCode::Char('d'))),
            condition: ready,
            standard: true,
        },
        MenuEntry {
            label: "Export",
            action: MenuAction::Export,
            key: Some(KeyBinding::new(KeyCode::Char('x'))),
            condition: ready,
            standard: true,
        },
        MenuEntry {
            label: "Generate Report",
            action: MenuAction::GenerateReport,
            key: Some(KeyBinding::new(KeyCode::Char('g'))),
            condition: can_generate,
            standard: true,
        },
        MenuEntry {
            label: "Setup Auto Email",
            action: MenuAction::SetupAutoEmail,
            key: Some(KeyBinding::new(KeyCode::Char('a'))),
            condition: has_doc,
            standard: true,
        },
        MenuEntry {
            label: "User Permissions",
            action: MenuAction::UserPermissions,
            key: Some(KeyBinding::new(KeyCode::Char('u'))),
            condition: has_doc,
            standard: true,
        },
    ]
}

/// Chart/card export entries, attached once settings resolve.
pub fn report_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry {
            label: "Export Chart",
            action: MenuAction::ExportChart,
            key: Some(KeyBinding::new(KeyCode::Char('c'))),
            condition: has_settings,
            standard: false,
        },
        MenuEntry {
            label: "Export Card",
            action: MenuAction::ExportCard,
            key: None,
            condition: has_settings,
            standard: false,
        },
    ]
}
