//! The main trait that all TUI apps must implement.

use crate::tui::{Command, Subscription, Theme};
use ratatui::Frame;
use ratatui::text::Line;

/// Elm-architecture app:
/// - State: data that represents the app's current state
/// - Msg: events/actions that can happen
/// - update: handles messages and returns commands
/// - view: renders the current state
/// - subscriptions: declares what inputs the app wants to receive
pub trait App: Sized + Send + 'static {
    /// The app's state type
    type State: Send;

    /// The app's message type
    type Msg: Clone + Send + 'static;

    /// Typed parameters handed to init()
    type InitParams;

    /// Build the initial state, optionally with a startup command
    fn init(params: Self::InitParams) -> (Self::State, Command<Self::Msg>);

    /// Update the state based on a message and return a command
    fn update(state: &mut Self::State, msg: Self::Msg) -> Command<Self::Msg>;

    /// Render the current state
    fn view(state: &Self::State, frame: &mut Frame, theme: &Theme);

    /// Declare what inputs this app wants to receive
    fn subscriptions(state: &Self::State) -> Vec<Subscription<Self::Msg>>;

    /// Return the app's title (static string for the title bar)
    fn title() -> &'static str;

    /// Return optional status text (dynamic, styled based on state)
    fn status(_state: &Self::State, _theme: &Theme) -> Option<Line<'static>> {
        None
    }
}
