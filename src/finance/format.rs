//! Text progress bars for goals and budgets

const GOAL_BAR_LEN: usize = 10;
const BUDGET_BAR_LEN: usize = 8;

/// Goal progress bar (10 cells) and the capped percentage.
pub fn goal_bar(current: f64, target: f64) -> (String, u32) {
    let ratio = if target > 0.0 {
        (current / target).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (GOAL_BAR_LEN as f64 * ratio) as usize;
    let bar = "🟩".repeat(filled) + &"⬜".repeat(GOAL_BAR_LEN - filled);
    (bar, (ratio * 100.0) as u32)
}

/// Budget usage bar (8 cells). `ratio` is spent / limit, may exceed 1.
pub fn budget_bar(ratio: f64) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * BUDGET_BAR_LEN as f64) as usize;
    "█".repeat(filled) + &"░".repeat(BUDGET_BAR_LEN - filled)
}
