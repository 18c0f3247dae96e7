use nl2sql_core::clock;

use crate::commands::CommandResult;

pub fn today() -> CommandResult {
    CommandResult::success("today", clock::today_date())
}

pub fn time() -> CommandResult {
    CommandResult::success("time", clock::current_time())
}
