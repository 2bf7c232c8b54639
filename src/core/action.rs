//! Actions that modules can return to communicate with the app

/// Actions returned by modules to communicate state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action needed
    None,

    /// Put text on the system clipboard
    Copy(String),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Request quit
    Quit,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}
