//! Terminal UI components: session table, output pane and toasts.

pub mod layout;
pub mod output_pane;
pub mod session_table;
pub mod toast;
pub mod toast_widget;

pub use output_pane::OutputPane;
pub use session_table::SessionTable;
pub use toast::{Toast, ToastManager, ToastType};
pub use toast_widget::{ToastPosition, ToastWidget};
