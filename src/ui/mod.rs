//! UI helpers for consistent CLI output
//!
//! Uses `cliclack` for styled output in a terminal, with a plain fallback
//! when stdout is piped or running under CI.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, remark, step_error_detail, step_info, step_ok,
    step_ok_detail, step_warn_hint,
};
pub use progress::TaskSpinner;
