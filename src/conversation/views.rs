//! Read-only screens: balance, history, goals, categories, budgets, reports
//!
//! Every function renders MarkdownV2 and never writes to the database.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::conversation::actions::CallbackAction;
use crate::conversation::reply::{Button, Keyboard, Reply};
use crate::core::config;
use crate::core::error::AppResult;
use crate::core::types::TxKind;
use crate::core::utils::{esc, escape_code, money};
use crate::finance::budget::{usage_ratio, BudgetStatus};
use crate::finance::format::{budget_bar, goal_bar};
use crate::finance::period::Month;
use crate::finance::snapshot;
use crate::storage::{budgets, categories, goals, transactions};

fn button(text: &str, action: CallbackAction) -> Button {
    Button::callback(text, action.to_string())
}

fn cancel_button() -> Button {
    button("🔙 Отмена", CallbackAction::CloseKeyboard)
}

/// Greeting with the main keyboard
pub fn welcome(first_name: Option<&str>, app_url: &str) -> Reply {
    let name = first_name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("друг");
    let text = format!(
        "👋 *Привет, {}\\!*\n\n\
         Я *FinGoal*, твой персональный финансовый помощник 💰\n\n\
         📱 Нажми *📱 Мои Деньги*, чтобы открыть приложение\n\n\
         Или пиши мне текстом:\n\
         🔹 `1000 Еда` записать расход\n\
         🔹 `+5000 ЗП` записать доход\n\
         🔹 `!1000 Отпуск` отложить в копилку\n\n\
         Удачного планирования\\! 🚀",
        esc(name)
    );
    Reply::text(text).with_keyboard(Keyboard::MainMenu {
        app_url: app_url.to_string(),
    })
}

pub fn help() -> Reply {
    Reply::text(
        "ℹ️ *Как пользоваться FinGoal*\n\n\
         *Записи текстом:*\n\
         `500 Еда обед` расход, первое слово после суммы это категория\n\
         `+50000 Зарплата` доход\n\
         `!3000 Отпуск` пополнить цель \\(или начать новую\\)\n\n\
         *Команды:*\n\
         /balance баланс за всё время\n\
         /history последние записи\n\
         /report отчет за месяц\n\
         /cancel отменить текущее действие\n\n\
         Остальное в меню внизу и в приложении 📱",
    )
}

/// Lifetime totals
pub fn balance(conn: &Connection, user_id: i64) -> AppResult<Reply> {
    let totals = transactions::lifetime_totals(conn, user_id)?;
    Ok(Reply::text(format!(
        "📊 *Ваш баланс:*\n\n\
         🟢 Доходы: {} р\\.\n\
         🔴 Расходы: {} р\\.\n\n\
         💰 *Итого: {} р\\.*",
        money(totals.income),
        money(totals.expense),
        money(totals.net())
    )))
}

/// Last few records, newest first
pub fn history(conn: &Connection, user_id: i64) -> AppResult<Reply> {
    let rows = transactions::recent_transactions(conn, user_id, config::limits::HISTORY_ITEMS)?;
    if rows.is_empty() {
        return Ok(Reply::text("История пуста\\."));
    }

    let mut text = format!("📂 *Последние {} записей:*\n\n", rows.len());
    for tx in &rows {
        let day = tx.date.get(..10).unwrap_or(&tx.date);
        let _ = writeln!(
            text,
            "`{}` \\| *{}{} р\\.* \\({}\\)",
            escape_code(day),
            esc(tx.kind.sign()),
            money(tx.amount),
            esc(&tx.category)
        );
    }
    Ok(Reply::text(text))
}

pub fn goals_menu() -> Reply {
    Reply::text("🎯 *Управление Целями*\nВыберите действие:").with_inline(vec![
        vec![button("➕ Создать цель", CallbackAction::GoalCreate)],
        vec![button("📋 Мои цели (Прогресс)", CallbackAction::GoalList)],
        vec![button("❌ Удалить цель", CallbackAction::GoalDeleteMenu)],
    ])
}

/// Active goals with progress bars
pub fn goal_list(conn: &Connection, user_id: i64) -> AppResult<Reply> {
    let goals = goals::list_goals(conn, user_id)?;
    if goals.is_empty() {
        return Ok(Reply::text("У вас пока нет целей\\. Создайте первую\\!"));
    }

    let mut text = String::from("🎯 *Ваши финансовые цели:*\n\n");
    for goal in &goals {
        let (bar, percent) = goal_bar(goal.current_amount, goal.target_amount);
        let _ = write!(
            text,
            "*{}*\n{} {}%\n💰 {} / {} р\\.\n\n",
            esc(&goal.name),
            bar,
            percent,
            money(goal.current_amount),
            money(goal.target_amount)
        );
    }
    Ok(Reply::text(text))
}

pub fn goal_delete_menu(conn: &Connection, user_id: i64) -> AppResult<Reply> {
    let goals = goals::list_goals(conn, user_id)?;
    if goals.is_empty() {
        return Ok(Reply::text("Нечего удалять 🤷‍♂️"));
    }

    let mut rows: Vec<Vec<Button>> = goals
        .iter()
        .map(|goal| vec![button(&format!("❌ {}", goal.name), CallbackAction::GoalDelete(goal.id))])
        .collect();
    rows.push(vec![cancel_button()]);
    Ok(Reply::text("Выберите цель для удаления:").with_inline(rows))
}

pub fn categories_menu() -> Reply {
    Reply::text("📂 *Управление Категориями*").with_inline(vec![
        vec![button("➕ Добавить категорию", CallbackAction::CategoryCreate)],
        vec![button("📊 Статистика за месяц", CallbackAction::CategoryStats)],
        vec![button("❌ Удалить категорию", CallbackAction::CategoryDeleteMenu)],
    ])
}

pub fn category_type_prompt() -> Reply {
    Reply::text("К чему относится категория?").with_inline(vec![vec![
        button("📉 Расход", CallbackAction::CategoryType(TxKind::Expense)),
        button("📈 Доход", CallbackAction::CategoryType(TxKind::Income)),
    ]])
}

/// Current-month sums for declared and used categories, split by kind
pub fn category_stats(conn: &Connection, user_id: i64, now: NaiveDateTime) -> AppResult<Reply> {
    let month = Month::of(now);
    let sums = transactions::sums_by_category_and_kind(conn, user_id, &month.start())?;

    let mut text = format!("📊 *Статистика за {}:*\n\n", esc(month.russian_name()));
    let mut anything = false;

    for (kind, title) in [(TxKind::Income, "📈 *ДОХОДЫ:*"), (TxKind::Expense, "📉 *РАСХОДЫ:*")] {
        // case-insensitive merge so "еда" and "Еда" end up on one line
        let mut lines: BTreeMap<String, (String, f64)> = BTreeMap::new();
        for name in categories::category_names(conn, user_id, Some(kind))? {
            lines.entry(name.to_lowercase()).or_insert((name, 0.0));
        }
        for (name, _, sum) in sums.iter().filter(|(_, k, _)| *k == kind) {
            lines.entry(name.to_lowercase()).or_insert((name.clone(), 0.0)).1 += sum;
        }
        if lines.is_empty() {
            continue;
        }

        anything = true;
        let total: f64 = lines.values().map(|(_, sum)| sum).sum();
        let _ = writeln!(text, "{}", title);
        for (name, sum) in lines.values() {
            let _ = writeln!(text, "\\- {}: {} р\\.", esc(name), money(*sum));
        }
        let _ = write!(text, "*Всего: {} р\\.*\n\n", money(total));
    }

    if !anything {
        return Ok(Reply::text("Пока пусто\\. Самое время начать вести бюджет\\!"));
    }
    Ok(Reply::text(text))
}

pub fn budgets_menu() -> Reply {
    Reply::text("📊 *Управление Бюджетами \\(на месяц\\)*").with_inline(vec![
        vec![button("➕ Установить лимит", CallbackAction::BudgetSet)],
        vec![button("📉 Мои лимиты (Статус)", CallbackAction::BudgetList)],
    ])
}

fn status_caption(status: BudgetStatus) -> String {
    match status {
        BudgetStatus::Within => "В рамках".to_string(),
        BudgetStatus::AlmostSpent => "Осталось немного".to_string(),
        BudgetStatus::Exceeded { by } => format!("ПРЕВЫШЕНИЕ на {} р\\.\\!", money(by)),
    }
}

/// Budgets of the current month with usage bars
pub fn budget_status(conn: &Connection, user_id: i64, now: NaiveDateTime) -> AppResult<Reply> {
    let month = Month::of(now);
    let budgets = budgets::budgets_for_month(conn, user_id, &month.key())?;
    if budgets.is_empty() {
        return Ok(Reply::text("Бюджеты на этот месяц не установлены\\."));
    }

    let mut text = format!("📊 *Бюджеты на {}:*\n\n", esc(month.russian_name()));
    for budget in &budgets {
        let spent = transactions::spent_in_category(conn, user_id, &budget.category_name, &month.start())?;
        let ratio = usage_ratio(spent, budget.amount);
        let status = BudgetStatus::evaluate(spent, budget.amount);
        let _ = write!(
            text,
            "*{}* {}\n{} {}%\n💸 {} / {} р\\.\n_{}_\n\n",
            esc(&budget.category_name),
            status.icon(),
            budget_bar(ratio),
            (ratio * 100.0) as i64,
            money(spent),
            money(budget.amount),
            status_caption(status)
        );
    }
    Ok(Reply::text(text))
}

/// Monthly report with month navigation and a chart button
pub fn report(
    conn: &Connection,
    user_id: i64,
    month: Month,
    now: NaiveDateTime,
    webapp_base: &str,
) -> AppResult<Reply> {
    let start = month.start();
    let end = month.end();
    let totals = transactions::totals_between(conn, user_id, &start, Some(&end))?;

    let mut text = format!(
        "📊 *Отчет за {}*\n\n\
         💰 *Баланс:* {} р\\.\n\
         📈 Доход: {} р\\.\n\
         📉 Расход: {} р\\.\n",
        esc(&month.russian_title()),
        money(totals.net()),
        money(totals.income),
        money(totals.expense)
    );

    let top = transactions::expenses_by_category(
        conn,
        user_id,
        &start,
        Some(&end),
        Some(config::limits::TOP_EXPENSES),
    )?;
    if !top.is_empty() {
        let _ = writeln!(text, "\n*🏆 Топ\\-{} расходов:*", config::limits::TOP_EXPENSES);
        for (category, sum) in &top {
            let _ = writeln!(text, "\\- {}: {} р\\.", esc(category), money(*sum));
        }
    }

    let budgets = budgets::budgets_for_month(conn, user_id, &month.key())?;
    if !budgets.is_empty() {
        let spent_by_category: BTreeMap<String, f64> =
            transactions::expenses_by_category(conn, user_id, &start, Some(&end), None)?
                .into_iter()
                .collect();
        text.push_str("\n*⚖️ Бюджеты \\(в этом месяце\\):*\n");
        for budget in &budgets {
            let spent = spent_by_category.get(&budget.category_name).copied().unwrap_or(0.0);
            let status = BudgetStatus::evaluate(spent, budget.amount);
            let _ = writeln!(
                text,
                "{} {}: {} / {} р\\.",
                status.icon(),
                esc(&budget.category_name),
                money(spent),
                money(budget.amount)
            );
        }
    }

    if month == Month::of(now) {
        let goals = goals::list_goals(conn, user_id)?;
        if !goals.is_empty() {
            text.push_str("\n*🎯 Цели \\(сейчас\\):*\n");
            for goal in &goals {
                let _ = writeln!(
                    text,
                    "\\- {}: {} / {} \\({}%\\)",
                    esc(&goal.name),
                    money(goal.current_amount),
                    money(goal.target_amount),
                    goal.progress_percent() as u32
                );
            }
        }
    }

    let chart = snapshot::build_chart_payload(conn, user_id, month)?;
    let chart_url = snapshot::webapp_url(webapp_base, &snapshot::encode_payload(&chart)?, None)?;

    Ok(Reply::text(text).with_inline(vec![
        vec![
            button("⬅️", CallbackAction::Report(month.prev())),
            button(
                &format!("🗓 {:02}/{}", month.month(), month.year()),
                CallbackAction::Noop,
            ),
            button("➡️", CallbackAction::Report(month.next())),
        ],
        vec![Button::web_app("📊 Открыть диаграммы", chart_url)],
    ]))
}

/// Inline button opening the Mini App with a fresh snapshot
pub fn open_app(conn: &Connection, user_id: i64, now: NaiveDateTime, webapp_base: &str) -> AppResult<Reply> {
    let url = snapshot::snapshot_url(
        conn,
        webapp_base,
        user_id,
        config::limits::DEFAULT_SNAPSHOT_TRANSACTIONS,
        now,
        None,
    )?;
    Ok(Reply::text("Ваш финансовый пульт готов:").with_inline(vec![vec![Button::web_app(
        "📱 Открыть приложение",
        url,
    )]]))
}

/// Picker rows: options two per row, then a cancel button
pub fn picker(options: &[String], action: impl Fn(usize) -> CallbackAction, cancel: CallbackAction) -> Vec<Vec<Button>> {
    let buttons = options
        .iter()
        .enumerate()
        .map(|(i, name)| button(name, action(i)))
        .collect();
    let mut rows = Keyboard::grid(buttons, 2);
    rows.push(vec![button("🔙 Отмена", cancel)]);
    rows
}

/// Picker with a delete mark on every option, one per row
pub fn delete_picker(options: &[String], action: impl Fn(usize) -> CallbackAction) -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = options
        .iter()
        .enumerate()
        .map(|(i, name)| vec![button(&format!("❌ {}", name), action(i))])
        .collect();
    rows.push(vec![cancel_button()]);
    rows
}
