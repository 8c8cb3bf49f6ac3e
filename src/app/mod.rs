//! The appliance console: main menu plus the About screen.

pub mod about;
pub mod console;

pub use about::{APP_NAME, APP_VERSION, AboutFlow};
pub use console::{Console, MenuEntry};
