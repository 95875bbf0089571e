mod check;
mod foods;
mod helpers;
mod summary;

pub(crate) use check::cmd_check;
pub(crate) use foods::{cmd_foods, cmd_thresholds};
pub(crate) use summary::{cmd_clear, cmd_history, cmd_weekly};
