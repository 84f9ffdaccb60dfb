pub mod app;
pub mod apps;
pub mod bus;
pub mod command;
pub mod runtime;
pub mod subscription;
pub mod theme;

pub use app::App;
pub use bus::{BusEvent, EventBus, event_bus};
pub use command::Command;
pub use runtime::Runtime;
pub use subscription::{KeyBinding, Subscription};
pub use theme::{RuntimeConfig, Theme, ThemeVariant};
