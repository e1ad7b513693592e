//! Message-driven flows: free-text entries, dialogs, `/start` deep links and Mini App data

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::conversation::actions::CallbackAction;
use crate::conversation::menu::MenuButton;
use crate::conversation::reply::{Button, Outcome, Reply};
use crate::conversation::state::{ChatState, ConversationStore};
use crate::conversation::views;
use crate::core::config;
use crate::core::error::AppResult;
use crate::core::types::TxKind;
use crate::core::utils::{esc, escape_code, money};
use crate::finance::deeplink::{self, DeepLink};
use crate::finance::ledger::{self, GoalTopUp, Recorded};
use crate::finance::miniapp::{self, MiniAppAction};
use crate::finance::parser::{parse_amount, parse_entry, Entry, TxDraft};
use crate::finance::period::Month;
use crate::finance::quips;
use crate::finance::resolver::{resolve_category, Resolution};
use crate::finance::snapshot;
use crate::storage::{categories, users};

/// Everything a flow needs to answer one update
pub struct FlowContext<'a> {
    pub conn: &'a Connection,
    pub store: &'a ConversationStore,
    pub user_id: i64,
    pub now: NaiveDateTime,
    /// Base URL of the Mini App
    pub webapp_url: &'a str,
}

/// Appends the budget alarm, if any, to a confirmation text
pub(crate) fn with_warning(mut text: String, recorded: &Recorded) -> String {
    if let Some(alarm) = recorded.budget_warning {
        text.push_str(&format!("\n\n🚨 {}", esc(alarm)));
    }
    text
}

pub(crate) fn kind_icon(kind: TxKind) -> &'static str {
    match kind {
        TxKind::Expense => "📉",
        TxKind::Income => "📈",
    }
}

impl FlowContext<'_> {
    /// Handles a plain text message
    pub fn handle_text(&self, text: &str) -> AppResult<Outcome> {
        let text = text.trim();

        if let Ok(button) = text.parse::<MenuButton>() {
            if let Some(state) = self.store.clear(self.user_id) {
                log::debug!("User {} left state {} via menu", self.user_id, state.name());
            }
            return self.menu(button);
        }

        match self.store.get(self.user_id) {
            Some(state) if state.expects_text() => return self.continue_dialog(state, text),
            Some(ChatState::TransactionAwaitingDecision { .. }) => {
                return Ok(Outcome::text(
                    "👆 Сначала решите, что делать с предыдущей записью \\(кнопки выше\\), или отправьте /cancel",
                ));
            }
            _ => {}
        }

        match parse_entry(text) {
            Some(Entry::GoalTopUp { amount, goal_name }) => self.goal_top_up(&goal_name, amount),
            Some(Entry::Transaction(draft)) => self.transaction(draft),
            None => Ok(Outcome::none()),
        }
    }

    /// Screen behind a main keyboard button
    pub fn menu(&self, button: MenuButton) -> AppResult<Outcome> {
        let reply = match button {
            MenuButton::MyMoney => views::open_app(self.conn, self.user_id, self.now, self.webapp_url)?,
            MenuButton::Goals => views::goals_menu(),
            MenuButton::Categories => views::categories_menu(),
            MenuButton::Budgets => views::budgets_menu(),
            MenuButton::Reports => self.report(Month::of(self.now))?,
            MenuButton::Balance => views::balance(self.conn, self.user_id)?,
            MenuButton::History => views::history(self.conn, self.user_id)?,
        };
        Ok(Outcome::reply(reply))
    }

    pub fn report(&self, month: Month) -> AppResult<Reply> {
        views::report(self.conn, self.user_id, month, self.now, self.webapp_url)
    }

    fn continue_dialog(&self, state: ChatState, text: &str) -> AppResult<Outcome> {
        match state {
            ChatState::GoalAwaitingName => {
                if text.is_empty() {
                    return Ok(Outcome::text("Введите название цели текстом\\."));
                }
                self.store.set(
                    self.user_id,
                    ChatState::GoalAwaitingTarget {
                        name: text.to_string(),
                    },
                );
                Ok(Outcome::text("Сколько нужно накопить? \\(Введите число, например: 100000\\)"))
            }
            ChatState::GoalAwaitingTarget { name } => {
                let Some(target) = parse_amount(text) else {
                    return Ok(Outcome::text("Пожалуйста, введите корректное число\\."));
                };
                ledger::create_goal(self.conn, self.user_id, &name, target, self.now)?;
                self.store.clear(self.user_id);
                Ok(Outcome::text(format!(
                    "✅ Цель *'{}'* создана\\!\nЦель: {} р\\.\n\nПополняйте её командой: `!сумма {}`",
                    esc(&name),
                    money(target),
                    escape_code(&name)
                ))
                .refreshing_menu())
            }
            ChatState::CategoryAwaitingName { kind } => {
                if text.is_empty() {
                    return Ok(Outcome::text("Введите название категории текстом\\."));
                }
                self.store.clear(self.user_id);
                if !categories::create_category(self.conn, self.user_id, text, kind, self.now)? {
                    return Ok(Outcome::text("Такая категория уже есть\\!"));
                }
                let kind_name = match kind {
                    TxKind::Expense => "Расход",
                    TxKind::Income => "Доход",
                };
                Ok(Outcome::text(format!(
                    "✅ Категория *{}* \\({}\\) создана\\!",
                    esc(text),
                    kind_name
                ))
                .refreshing_menu())
            }
            ChatState::BudgetAwaitingAmount { category } => {
                let Some(limit) = parse_amount(text) else {
                    return Ok(Outcome::text("Введите корректное число\\."));
                };
                ledger::set_monthly_budget(self.conn, self.user_id, &category, limit, self.now)?;
                self.store.clear(self.user_id);
                Ok(Outcome::text(format!(
                    "✅ Установлен бюджет *{} р\\.* на _{}_\\.",
                    money(limit),
                    esc(&category)
                ))
                .refreshing_menu())
            }
            other => {
                // picker states never reach here, see ChatState::expects_text
                log::warn!("User {} sent text in state {}", self.user_id, other.name());
                Ok(Outcome::none())
            }
        }
    }

    fn goal_top_up(&self, goal_name: &str, amount: f64) -> AppResult<Outcome> {
        let text = match ledger::top_up_goal_by_name(self.conn, self.user_id, goal_name, amount, self.now)? {
            GoalTopUp::Existing { goal, before, after } => format!(
                "🎯 *Цель '{}' пополнена\\!*\nБыло: {} р\\.\nСтало: {} р\\.\nДобавлено: \\+{} р\\.",
                esc(&goal.name),
                money(before),
                money(after),
                money(amount)
            ),
            GoalTopUp::Created { .. } => format!(
                "🆕 *Новая цель '{}' создана\\!*\nНачало положено: {} р\\.",
                esc(goal_name),
                money(amount)
            ),
        };
        Ok(Outcome::text(text).refreshing_menu())
    }

    fn transaction(&self, draft: TxDraft) -> AppResult<Outcome> {
        match resolve_category(self.conn, self.user_id, &draft.category, draft.kind)? {
            Resolution::Matched { category, corrected } => {
                let recorded = ledger::record_transaction(
                    self.conn,
                    self.user_id,
                    draft.amount,
                    &category,
                    draft.kind,
                    draft.description.as_deref(),
                    self.now,
                )?;
                if !recorded.is_saved() {
                    return Ok(Outcome::none());
                }

                let mut text = format!(
                    "{}\n{} *{} р\\.*\nКатегория: {}",
                    esc(quips::transaction_quip(draft.kind)),
                    kind_icon(draft.kind),
                    money(draft.amount),
                    esc(&category)
                );
                if corrected {
                    text.push_str(&format!(
                        "\n\\(Исправил _'{}'_ на *'{}'*\\)",
                        esc(&draft.category),
                        esc(&category)
                    ));
                }
                if let Some(description) = &draft.description {
                    text.push_str(&format!("\nОписание: {}", esc(description)));
                }
                Ok(Outcome::text(with_warning(text, &recorded)).refreshing_menu())
            }
            Resolution::Unresolved { options } => {
                let mut rows = vec![
                    vec![Button::callback(
                        format!("➕ Создать '{}'", draft.category),
                        CallbackAction::TxCreateCategory.to_string(),
                    )],
                    vec![Button::callback(
                        "📂 Выбрать из списка",
                        CallbackAction::TxPickCategory.to_string(),
                    )],
                ];
                if !options.is_empty() {
                    rows.push(vec![Button::callback("❌ Отмена", CallbackAction::TxCancel.to_string())]);
                }
                let text = format!("🤔 Категория *'{}'* не найдена\\.\nЧто делаем?", esc(&draft.category));
                self.store.set(
                    self.user_id,
                    ChatState::TransactionAwaitingDecision {
                        pending: draft,
                        options,
                    },
                );
                Ok(Outcome::reply(Reply::text(text).with_inline(rows)))
            }
        }
    }

    /// `/start [payload]`: applies a deep link or greets the user
    pub fn handle_start(&self, first_name: Option<&str>, payload: &str) -> AppResult<Outcome> {
        let payload = payload.trim();
        if !payload.is_empty() {
            match deeplink::decode(payload) {
                Ok(link) => return self.apply_deep_link(link),
                Err(e) => log::warn!("Ignoring bad start payload from user {}: {}", self.user_id, e),
            }
        }

        self.store.clear(self.user_id);
        let app_url = snapshot::snapshot_url(
            self.conn,
            self.webapp_url,
            self.user_id,
            config::limits::MENU_SNAPSHOT_TRANSACTIONS,
            self.now,
            None,
        )?;
        Ok(Outcome::reply(views::welcome(first_name, &app_url)).refreshing_menu())
    }

    fn apply_deep_link(&self, link: DeepLink) -> AppResult<Outcome> {
        let text = match link {
            DeepLink::Transaction { kind, amount, category } => {
                let recorded =
                    ledger::record_transaction(self.conn, self.user_id, amount, &category, kind, None, self.now)?;
                if !recorded.is_saved() {
                    log::info!("Duplicate deep link transaction from user {} dropped", self.user_id);
                    return Ok(Outcome::none().deleting_source());
                }
                with_warning(
                    format!(
                        "✅ *Данные сохранены\\!*\n{} {} р\\. \\({}\\)",
                        kind_icon(kind),
                        money(amount),
                        esc(&category)
                    ),
                    &recorded,
                )
            }
            DeepLink::Goal { name, target } => {
                ledger::create_goal(self.conn, self.user_id, &name, target, self.now)?;
                format!(
                    "🎯 *Цель '{}' создана\\!*\nНужно накопить: {} р\\.",
                    esc(&name),
                    money(target)
                )
            }
            DeepLink::Budget { category, limit } => {
                ledger::set_monthly_budget(self.conn, self.user_id, &category, limit, self.now)?;
                format!(
                    "⚖️ *Бюджет на '{}' установлен\\!*\nЛимит: {} р\\.",
                    esc(&category),
                    money(limit)
                )
            }
            DeepLink::TopUp { goal_id, amount } => {
                if ledger::top_up_goal_by_id(self.conn, self.user_id, goal_id, amount)? {
                    format!("💰 *Копилка пополнена на {} р\\.\\!*", money(amount))
                } else {
                    "Цель не найдена\\.".to_string()
                }
            }
        };
        Ok(Outcome::text(text).deleting_source().refreshing_menu())
    }

    /// Data posted by the Mini App. Failures are reported to the user, never propagated.
    pub fn handle_web_app_data(&self, data: &str) -> AppResult<Outcome> {
        log::info!("Web app data from user {}: {}", self.user_id, data);
        match miniapp::parse_action(data).and_then(|action| self.apply_mini_app_action(action)) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::error!("Web app data from user {} rejected: {}", self.user_id, e);
                Ok(Outcome::text("Ошибка обработки данных приложения\\."))
            }
        }
    }

    fn apply_mini_app_action(&self, action: MiniAppAction) -> AppResult<Outcome> {
        let text = match action {
            MiniAppAction::AddTx { t, a, c, d } => {
                let recorded = ledger::record_transaction(self.conn, self.user_id, a, &c, t, d.as_deref(), self.now)?;
                if !recorded.is_saved() {
                    return Ok(Outcome::none());
                }
                with_warning(format!("✅ Добавлено: {} р\\. \\({}\\)", money(a), esc(c.trim())), &recorded)
            }
            MiniAppAction::AddGoal { n, t } => {
                ledger::create_goal(self.conn, self.user_id, &n, t, self.now)?;
                format!("🎯 Цель '{}' создана\\!", esc(n.trim()))
            }
            MiniAppAction::AddBudget { c, l } => {
                ledger::set_monthly_budget(self.conn, self.user_id, &c, l, self.now)?;
                format!("⚖️ Бюджет на '{}' установлен\\!", esc(c.trim()))
            }
            MiniAppAction::TopUpGoal { id, a } => {
                if ledger::top_up_goal_by_id(self.conn, self.user_id, id, a)? {
                    format!("💰 Копилка пополнена на {} р\\.\\!", money(a))
                } else {
                    "Цель не найдена\\.".to_string()
                }
            }
            MiniAppAction::Unknown => "✅ Данные обновлены".to_string(),
        };
        Ok(Outcome::text(text).refreshing_menu())
    }

    /// `/cancel`
    pub fn cancel(&self) -> Outcome {
        match self.store.clear(self.user_id) {
            Some(state) => {
                log::debug!("User {} cancelled {}", self.user_id, state.name());
                Outcome::text("🔙 Отмена")
            }
            None => Outcome::text("Нечего отменять\\."),
        }
    }

    /// Wipes every record of the user
    pub fn reset_all(&self) -> AppResult<Outcome> {
        users::reset_user_data(self.conn, self.user_id)?;
        self.store.clear(self.user_id);
        log::warn!("User {} wiped all data", self.user_id);
        Ok(Outcome::text(
            "💥 *ПОЛНЫЙ СБРОС ВЫПОЛНЕН*\nВсе ваши категории, транзакции, цели и бюджеты удалены\\.\n\nЖмите /start для начала новой жизни\\.",
        )
        .refreshing_menu())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::reply::Keyboard;
    use crate::storage::migrations::open_in_memory_for_test;
    use crate::storage::{budgets, goals, transactions};
    use chrono::NaiveDate;

    fn at(day: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(9, 0, sec)
            .unwrap()
    }

    fn ctx<'a>(conn: &'a Connection, store: &'a ConversationStore, now: NaiveDateTime) -> FlowContext<'a> {
        FlowContext {
            conn,
            store,
            user_id: 1,
            now,
            webapp_url: "https://example.org/app/",
        }
    }

    #[test]
    fn test_matched_transaction_with_correction() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        categories::create_category(&conn, 1, "Продукты", TxKind::Expense, at(1, 0)).unwrap();

        let outcome = ctx(&conn, &store, at(2, 0)).handle_text("450 продукты молоко").unwrap();
        assert!(outcome.refresh_menu);
        let text = &outcome.replies[0].text;
        assert!(text.contains("📉 *450 р\\.*"));
        assert!(!text.contains("Исправил"));
        assert!(text.contains("Описание: молоко"));

        let outcome = ctx(&conn, &store, at(2, 30)).handle_text("100 Продуктв").unwrap();
        assert!(outcome.replies[0].text.contains("Исправил _'Продуктв'_ на *'Продукты'*"));

        let stored = transactions::recent_transactions(&conn, 1, 10).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|tx| tx.category == "Продукты"));
    }

    #[test]
    fn test_unknown_category_waits_for_decision() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();

        let outcome = ctx(&conn, &store, at(2, 0)).handle_text("+5000 Фриланс").unwrap();
        let reply = &outcome.replies[0];
        assert!(reply.text.contains("*'Фриланс'* не найдена"));
        let Some(Keyboard::Inline(rows)) = &reply.keyboard else {
            panic!("expected decision buttons");
        };
        // no categories yet, so no cancel row
        assert_eq!(rows.len(), 2);
        assert!(matches!(
            store.get(1),
            Some(ChatState::TransactionAwaitingDecision { .. })
        ));

        let blocked = ctx(&conn, &store, at(2, 10)).handle_text("100 Еда").unwrap();
        assert!(blocked.replies[0].text.contains("/cancel"));
        assert!(transactions::recent_transactions(&conn, 1, 10).unwrap().is_empty());
    }

    #[test]
    fn test_goal_dialog() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        store.set(1, ChatState::GoalAwaitingName);
        let flow = ctx(&conn, &store, at(3, 0));

        flow.handle_text("Новый iPhone").unwrap();
        assert_eq!(
            store.get(1),
            Some(ChatState::GoalAwaitingTarget {
                name: "Новый iPhone".into()
            })
        );

        let retry = flow.handle_text("много").unwrap();
        assert!(retry.replies[0].text.contains("корректное число"));
        assert!(store.get(1).is_some());

        let done = flow.handle_text("100000").unwrap();
        assert!(done.replies[0].text.contains("`!сумма Новый iPhone`"));
        assert!(store.get(1).is_none());
        let goals = goals::list_goals(&conn, 1).unwrap();
        assert_eq!(goals[0].target_amount, 100_000.0);
    }

    #[test]
    fn test_category_and_budget_dialogs() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store, at(3, 0));

        store.set(1, ChatState::CategoryAwaitingName { kind: TxKind::Expense });
        let created = flow.handle_text("Такси").unwrap();
        assert!(created.replies[0].text.contains("*Такси* \\(Расход\\)"));

        store.set(1, ChatState::CategoryAwaitingName { kind: TxKind::Expense });
        let dup = flow.handle_text("Такси").unwrap();
        assert_eq!(dup.replies[0].text, "Такая категория уже есть\\!");

        store.set(
            1,
            ChatState::BudgetAwaitingAmount {
                category: "Такси".into(),
            },
        );
        assert!(flow.handle_text("-5").unwrap().replies[0].text.contains("корректное"));
        flow.handle_text("2500").unwrap();
        assert_eq!(budgets::budget_limit(&conn, 1, "Такси", "2026-10").unwrap(), Some(2500.0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_menu_button_clears_state() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        store.set(1, ChatState::GoalAwaitingName);

        let outcome = ctx(&conn, &store, at(3, 0)).handle_text("💰 Баланс").unwrap();
        assert!(outcome.replies[0].text.contains("Ваш баланс"));
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_goal_top_up_text() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store, at(4, 0));

        let created = flow.handle_text("!1000 Отпуск").unwrap();
        assert!(created.replies[0].text.contains("Новая цель 'Отпуск'"));
        let topped = flow.handle_text("!500 Отп").unwrap();
        assert!(topped.replies[0].text.contains("Стало: 1,500 р\\."));
    }

    #[test]
    fn test_start_with_deep_link() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store, at(5, 0));

        let payload = deeplink::encode("expense|250|Кофе");
        let outcome = flow.handle_start(Some("Иван"), &payload).unwrap();
        assert!(outcome.delete_source && outcome.refresh_menu);
        assert!(outcome.replies[0].text.contains("📉 250 р\\. \\(Кофе\\)"));

        // same link again within the duplicate window
        let again = flow.handle_start(Some("Иван"), &payload).unwrap();
        assert!(again.replies.is_empty());
        assert_eq!(transactions::recent_transactions(&conn, 1, 10).unwrap().len(), 1);

        let greeting = flow.handle_start(Some("Иван"), "%%%broken").unwrap();
        assert!(greeting.replies[0].text.contains("Привет, Иван"));
        assert!(!greeting.delete_source);
    }

    #[test]
    fn test_web_app_data() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store, at(6, 0));

        let added = flow
            .handle_web_app_data(r#"{"action":"add_tx","t":"expense","a":1200,"c":"Кафе"}"#)
            .unwrap();
        assert!(added.replies[0].text.contains("✅ Добавлено: 1,200 р\\. \\(Кафе\\)"));
        assert!(added.refresh_menu);

        let bad = flow.handle_web_app_data(r#"{"action":"add_goal","n":"","t":10}"#).unwrap();
        assert_eq!(bad.replies[0].text, "Ошибка обработки данных приложения\\.");
        assert!(goals::list_goals(&conn, 1).unwrap().is_empty());
    }

    #[test]
    fn test_start_embeds_menu_sized_snapshot() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let now = at(8, 30);
        for i in 0..12 {
            ledger::record_transaction(&conn, 1, 100.0 + i as f64, "Еда", TxKind::Expense, None, at(8, i)).unwrap();
        }

        let outcome = ctx(&conn, &store, now).handle_start(Some("Аня"), "").unwrap();
        let Some(Keyboard::MainMenu { app_url }) = &outcome.replies[0].keyboard else {
            panic!("expected main menu keyboard");
        };
        let expected = snapshot::snapshot_url(
            &conn,
            "https://example.org/app/",
            1,
            config::limits::MENU_SNAPSHOT_TRANSACTIONS,
            now,
            None,
        )
        .unwrap();
        assert_eq!(app_url, &expected);
    }

    #[test]
    fn test_cancel_and_reset() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store, at(7, 0));

        assert_eq!(flow.cancel().replies[0].text, "Нечего отменять\\.");
        store.set(1, ChatState::GoalAwaitingName);
        assert_eq!(flow.cancel().replies[0].text, "🔙 Отмена");

        flow.handle_text("!100 Машина").unwrap();
        ledger::record_transaction(&conn, 1, 50.0, "Еда", TxKind::Expense, None, at(6, 0)).unwrap();
        ledger::set_monthly_budget(&conn, 1, "Еда", 900.0, at(6, 0)).unwrap();
        categories::create_category(&conn, 1, "Еда", TxKind::Expense, at(6, 0)).unwrap();
        store.set(1, ChatState::GoalAwaitingName);

        flow.reset_all().unwrap();
        assert!(store.is_empty());
        assert!(goals::list_goals(&conn, 1).unwrap().is_empty());
        assert!(categories::category_names(&conn, 1, None).unwrap().is_empty());
        assert!(budgets::budgets_for_month(&conn, 1, "2026-10").unwrap().is_empty());
        assert!(transactions::recent_transactions(&conn, 1, 5).unwrap().is_empty());
    }
}
