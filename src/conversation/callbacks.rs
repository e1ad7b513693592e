//! Inline button presses

use crate::conversation::actions::CallbackAction;
use crate::conversation::flows::{with_warning, FlowContext};
use crate::conversation::reply::{Button, Delivery, Outcome, Reply};
use crate::conversation::state::ChatState;
use crate::conversation::views;
use crate::core::error::AppResult;
use crate::core::types::TxKind;
use crate::core::utils::{esc, money};
use crate::finance::ledger;
use crate::finance::parser::TxDraft;
use crate::storage::{categories, goals};

const STALE: &str = "Ошибка: данные устарели\\.";
const BAD_PICK: &str = "Ошибка выбора\\. Попробуйте снова\\.";

impl FlowContext<'_> {
    /// Handles callback data of a pressed inline button
    pub fn handle_callback(&self, data: &str) -> AppResult<Outcome> {
        let action = match data.parse::<CallbackAction>() {
            Ok(action) => action,
            Err(e) => {
                log::warn!("User {}: {}", self.user_id, e);
                return Ok(Outcome::none().with_notice("Кнопка больше не работает"));
            }
        };
        log::debug!("User {} pressed {}", self.user_id, action);

        match action {
            CallbackAction::GoalCreate => {
                self.store.set(self.user_id, ChatState::GoalAwaitingName);
                Ok(Outcome::text(
                    "Введите название новой цели \\(например: 'Новый iPhone'\\):",
                ))
            }
            CallbackAction::GoalList => Ok(Outcome::reply(views::goal_list(self.conn, self.user_id)?)),
            CallbackAction::GoalDeleteMenu => Ok(Outcome::reply(views::goal_delete_menu(self.conn, self.user_id)?)),
            CallbackAction::GoalDelete(goal_id) => {
                let text = if goals::delete_goal(self.conn, self.user_id, goal_id)? {
                    "✅ Цель удалена\\."
                } else {
                    "Цель уже удалена\\."
                };
                Ok(Outcome::reply(Reply::edit(text)).refreshing_menu())
            }
            CallbackAction::CategoryCreate => Ok(Outcome::reply(views::category_type_prompt())),
            CallbackAction::CategoryType(kind) => {
                self.store.set(self.user_id, ChatState::CategoryAwaitingName { kind });
                Ok(Outcome::reply(Reply::edit(
                    "Введите название категории \\(например: 'Такси'\\):",
                )))
            }
            CallbackAction::CategoryStats => Ok(Outcome::reply(views::category_stats(
                self.conn,
                self.user_id,
                self.now,
            )?)),
            CallbackAction::CategoryDeleteMenu => self.category_delete_menu(),
            CallbackAction::CategoryDelete(index) => self.category_delete(index),
            CallbackAction::BudgetSet => self.budget_picker(),
            CallbackAction::BudgetCategory(index) => self.budget_category(index),
            CallbackAction::BudgetList => Ok(Outcome::reply(views::budget_status(
                self.conn,
                self.user_id,
                self.now,
            )?)),
            CallbackAction::Report(month) => {
                let mut reply = self.report(month)?;
                reply.delivery = Delivery::EditSource;
                Ok(Outcome::reply(reply))
            }
            CallbackAction::Noop => Ok(Outcome::none()),
            CallbackAction::TxCreateCategory => self.tx_create_category(),
            CallbackAction::TxPickCategory => self.tx_pick_category(),
            CallbackAction::TxSelect(index) => self.tx_select(index),
            CallbackAction::TxCancel => {
                if let Some(ChatState::TransactionAwaitingDecision { .. }) = self.store.get(self.user_id) {
                    self.store.clear(self.user_id);
                }
                Ok(Outcome::none().deleting_source())
            }
            CallbackAction::CloseKeyboard => {
                if let Some(ChatState::BudgetPickingCategory { .. } | ChatState::CategoryDeletePicking { .. }) =
                    self.store.get(self.user_id)
                {
                    self.store.clear(self.user_id);
                }
                Ok(Outcome::none().deleting_source())
            }
        }
    }

    fn category_delete_menu(&self) -> AppResult<Outcome> {
        let options = categories::known_category_names(self.conn, self.user_id, None)?;
        if options.is_empty() {
            return Ok(Outcome::text("Вообще нет категорий\\."));
        }
        let rows = views::delete_picker(&options, CallbackAction::CategoryDelete);
        self.store.set(self.user_id, ChatState::CategoryDeletePicking { options });
        Ok(Outcome::reply(
            Reply::text("Выберите категорию для удаления \\(удалится история и сама категория\\):").with_inline(rows),
        ))
    }

    fn category_delete(&self, index: usize) -> AppResult<Outcome> {
        let Some(ChatState::CategoryDeletePicking { options }) = self.store.get(self.user_id) else {
            return Ok(Outcome::reply(Reply::edit(STALE)));
        };
        let Some(name) = options.get(index) else {
            return Ok(Outcome::text(BAD_PICK));
        };

        let removed = categories::delete_category_everywhere(self.conn, self.user_id, name)?;
        self.store.clear(self.user_id);
        log::info!(
            "User {} deleted category '{}' with {} transactions",
            self.user_id,
            name,
            removed
        );
        Ok(Outcome::reply(Reply::edit(format!(
            "✅ Категория *'{}'* и все её транзакции удалены\\.",
            esc(name)
        )))
        .refreshing_menu())
    }

    fn budget_picker(&self) -> AppResult<Outcome> {
        let options = categories::known_category_names(self.conn, self.user_id, Some(TxKind::Expense))?;
        if options.is_empty() {
            return Ok(Outcome::text(
                "Сначала добавьте расходы, чтобы ставить на них лимиты\\.",
            ));
        }
        let rows = views::picker(&options, CallbackAction::BudgetCategory, CallbackAction::CloseKeyboard);
        self.store.set(self.user_id, ChatState::BudgetPickingCategory { options });
        Ok(Outcome::reply(Reply::text("Выберите категорию для лимита:").with_inline(rows)))
    }

    fn budget_category(&self, index: usize) -> AppResult<Outcome> {
        let Some(ChatState::BudgetPickingCategory { options }) = self.store.get(self.user_id) else {
            return Ok(Outcome::reply(Reply::edit(STALE)));
        };
        let Some(category) = options.get(index).cloned() else {
            return Ok(Outcome::text(BAD_PICK));
        };

        let text = format!(
            "Введите лимит на месяц для категории *'{}'* \\(число\\):",
            esc(&category)
        );
        self.store.set(self.user_id, ChatState::BudgetAwaitingAmount { category });
        Ok(Outcome::reply(Reply::edit(text)))
    }

    fn pending_transaction(&self) -> Option<(TxDraft, Vec<String>)> {
        match self.store.get(self.user_id) {
            Some(ChatState::TransactionAwaitingDecision { pending, options }) => Some((pending, options)),
            _ => None,
        }
    }

    /// The prompt goes away without a confirmation, nothing was written
    fn duplicate_dropped(&self) -> Outcome {
        log::info!("Duplicate pending transaction from user {} dropped", self.user_id);
        Outcome::none().deleting_source()
    }

    fn tx_create_category(&self) -> AppResult<Outcome> {
        let Some((pending, _)) = self.pending_transaction() else {
            return Ok(Outcome::reply(Reply::edit(STALE)));
        };

        categories::create_category(self.conn, self.user_id, &pending.category, pending.kind, self.now)?;
        let recorded = ledger::record_transaction(
            self.conn,
            self.user_id,
            pending.amount,
            &pending.category,
            pending.kind,
            pending.description.as_deref(),
            self.now,
        )?;
        self.store.clear(self.user_id);
        if !recorded.is_saved() {
            return Ok(self.duplicate_dropped());
        }

        let text = format!(
            "✅ Создана категория *'{}'* и добавлена запись:\n{} р\\.",
            esc(&pending.category),
            money(pending.amount)
        );
        Ok(Outcome::reply(Reply::edit(with_warning(text, &recorded))).refreshing_menu())
    }

    fn tx_pick_category(&self) -> AppResult<Outcome> {
        let Some((_, options)) = self.pending_transaction() else {
            return Ok(Outcome::reply(Reply::edit(STALE)));
        };

        if options.is_empty() {
            let rows = vec![
                vec![Button::callback(
                    "➕ Создать новую",
                    CallbackAction::TxCreateCategory.to_string(),
                )],
                vec![Button::callback(
                    "🔙 Отмена",
                    CallbackAction::TxCancel.to_string(),
                )],
            ];
            return Ok(Outcome::reply(
                Reply::edit("Категорий этого типа пока нет\\. Создайте новую:").with_inline(rows),
            ));
        }

        let rows = views::picker(&options, CallbackAction::TxSelect, CallbackAction::TxCancel);
        Ok(Outcome::reply(Reply::edit("📂 Выберите категорию:").with_inline(rows)))
    }

    fn tx_select(&self, index: usize) -> AppResult<Outcome> {
        let Some((pending, options)) = self.pending_transaction() else {
            return Ok(Outcome::reply(Reply::edit(STALE)));
        };
        let Some(category) = options.get(index) else {
            return Ok(Outcome::text(BAD_PICK));
        };

        let recorded = ledger::record_transaction(
            self.conn,
            self.user_id,
            pending.amount,
            category,
            pending.kind,
            pending.description.as_deref(),
            self.now,
        )?;
        self.store.clear(self.user_id);
        if !recorded.is_saved() {
            return Ok(self.duplicate_dropped());
        }

        let text = format!("✅ Добавлено в *'{}'*:\n{} р\\.", esc(category), money(pending.amount));
        Ok(Outcome::reply(Reply::edit(with_warning(text, &recorded))).refreshing_menu())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::reply::Keyboard;
    use crate::conversation::state::ConversationStore;
    use crate::storage::migrations::open_in_memory_for_test;
    use crate::storage::{budgets, transactions};
    use chrono::{NaiveDate, NaiveDateTime};
    use rusqlite::Connection;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    fn ctx<'a>(conn: &'a Connection, store: &'a ConversationStore) -> FlowContext<'a> {
        FlowContext {
            conn,
            store,
            user_id: 7,
            now: at(10),
            webapp_url: "https://example.org/app/",
        }
    }

    fn callback_data(reply: &Reply) -> Vec<String> {
        reply
            .keyboard
            .as_ref()
            .map(|k| k.inline_buttons().filter_map(|b| b.callback_data().map(String::from)).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_pending_transaction_pick_and_select() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);
        categories::create_category(&conn, 7, "Еда", TxKind::Expense, at(1)).unwrap();
        categories::create_category(&conn, 7, "Транспорт", TxKind::Expense, at(1)).unwrap();

        let prompt = flow.handle_text("300 Шаурма вкусная").unwrap();
        assert_eq!(callback_data(&prompt.replies[0]), vec!["tx:new", "tx:pick", "tx:cancel"]);

        let picker = flow.handle_callback("tx:pick").unwrap();
        assert_eq!(picker.replies[0].delivery, Delivery::EditSource);
        assert_eq!(
            callback_data(&picker.replies[0]),
            vec!["tx:sel:0", "tx:sel:1", "tx:cancel"]
        );

        assert_eq!(flow.handle_callback("tx:sel:9").unwrap().replies[0].text, BAD_PICK);

        let saved = flow.handle_callback("tx:sel:1").unwrap();
        assert!(saved.replies[0].text.contains("*'Транспорт'*"));
        assert!(saved.refresh_menu);

        let stored = transactions::recent_transactions(&conn, 7, 5).unwrap();
        assert_eq!(stored[0].category, "Транспорт");
        assert_eq!(stored[0].description.as_deref(), Some("вкусная"));

        // state is gone, the old buttons are stale now
        assert_eq!(flow.handle_callback("tx:sel:0").unwrap().replies[0].text, STALE);
    }

    #[test]
    fn test_pending_transaction_new_category() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);

        flow.handle_text("+20000 Фриланс").unwrap();
        let saved = flow.handle_callback("tx:new").unwrap();
        assert!(saved.replies[0].text.contains("Создана категория *'Фриланс'*"));
        assert_eq!(
            categories::category_names(&conn, 7, Some(TxKind::Income)).unwrap(),
            vec!["Фриланс".to_string()]
        );
        assert_eq!(transactions::lifetime_totals(&conn, 7).unwrap().income, 20_000.0);
    }

    #[test]
    fn test_pending_transaction_duplicate_is_not_confirmed() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);
        categories::create_category(&conn, 7, "Еда", TxKind::Expense, at(1)).unwrap();
        ledger::record_transaction(&conn, 7, 100.0, "Еда", TxKind::Expense, None, at(10)).unwrap();

        flow.handle_text("100 Шаурмяшка").unwrap();
        let picked = flow.handle_callback("tx:sel:0").unwrap();
        assert!(picked.replies.is_empty());
        assert!(picked.delete_source);
        assert!(!picked.refresh_menu);
        assert!(store.is_empty());
        assert_eq!(transactions::recent_transactions(&conn, 7, 5).unwrap().len(), 1);

        ledger::record_transaction(&conn, 7, 250.0, "Кино", TxKind::Expense, None, at(10)).unwrap();
        flow.handle_text("250 Кино").unwrap();
        assert!(store.get(7).is_some());
        let created = flow.handle_callback("tx:new").unwrap();
        assert!(created.replies.is_empty());
        assert!(created.delete_source);
        assert!(store.is_empty());
        assert_eq!(transactions::recent_transactions(&conn, 7, 5).unwrap().len(), 2);
    }

    #[test]
    fn test_pending_transaction_cancel() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);

        flow.handle_text("100 Непонятно").unwrap();
        let outcome = flow.handle_callback("tx:cancel").unwrap();
        assert!(outcome.delete_source && outcome.replies.is_empty());
        assert!(store.is_empty());
        assert!(transactions::recent_transactions(&conn, 7, 5).unwrap().is_empty());
    }

    #[test]
    fn test_budget_flow() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);

        let empty = flow.handle_callback("budget:set").unwrap();
        assert!(empty.replies[0].text.starts_with("Сначала добавьте расходы"));

        ledger::record_transaction(&conn, 7, 500.0, "Кафе", TxKind::Expense, None, at(2)).unwrap();
        let picker = flow.handle_callback("budget:set").unwrap();
        assert_eq!(callback_data(&picker.replies[0]), vec!["budget:cat:0", "kb:close"]);

        let prompt = flow.handle_callback("budget:cat:0").unwrap();
        assert!(prompt.replies[0].text.contains("*'Кафе'*"));
        flow.handle_text("4000").unwrap();
        assert_eq!(budgets::budget_limit(&conn, 7, "Кафе", "2026-10").unwrap(), Some(4000.0));
    }

    #[test]
    fn test_category_delete_flow() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);

        assert_eq!(
            flow.handle_callback("cat:delete").unwrap().replies[0].text,
            "Вообще нет категорий\\."
        );

        ledger::record_transaction(&conn, 7, 500.0, "Кафе", TxKind::Expense, None, at(2)).unwrap();
        categories::create_category(&conn, 7, "Бар", TxKind::Expense, at(2)).unwrap();

        let menu = flow.handle_callback("cat:delete").unwrap();
        assert_eq!(
            callback_data(&menu.replies[0]),
            vec!["cat:del:0", "cat:del:1", "kb:close"]
        );

        let done = flow.handle_callback("cat:del:1").unwrap();
        assert!(done.replies[0].text.contains("*'Кафе'*"));
        assert!(transactions::recent_transactions(&conn, 7, 5).unwrap().is_empty());
        assert_eq!(flow.handle_callback("cat:del:0").unwrap().replies[0].text, STALE);
    }

    #[test]
    fn test_category_type_and_goal_prompts() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);

        let prompt = flow.handle_callback("cat:create").unwrap();
        assert_eq!(
            callback_data(&prompt.replies[0]),
            vec!["cat:type:expense", "cat:type:income"]
        );
        flow.handle_callback("cat:type:income").unwrap();
        assert_eq!(store.get(7), Some(ChatState::CategoryAwaitingName { kind: TxKind::Income }));

        flow.handle_callback("goal:create").unwrap();
        assert_eq!(store.get(7), Some(ChatState::GoalAwaitingName));
    }

    #[test]
    fn test_goal_delete_and_report_navigation() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);
        let id = ledger::create_goal(&conn, 7, "Дача", 1000.0, at(1)).unwrap();

        let deleted = flow.handle_callback(&format!("goal:del:{}", id)).unwrap();
        assert_eq!(deleted.replies[0].text, "✅ Цель удалена\\.");
        let again = flow.handle_callback(&format!("goal:del:{}", id)).unwrap();
        assert_eq!(again.replies[0].text, "Цель уже удалена\\.");

        let report = flow.handle_callback("report:2026:9").unwrap();
        assert_eq!(report.replies[0].delivery, Delivery::EditSource);
        assert!(report.replies[0].text.contains("Сентябрь 2026"));
        assert!(matches!(report.replies[0].keyboard, Some(Keyboard::Inline(_))));
    }

    #[test]
    fn test_unknown_and_noop() {
        let conn = open_in_memory_for_test().unwrap();
        let store = ConversationStore::new();
        let flow = ctx(&conn, &store);

        assert!(flow.handle_callback("noop").unwrap().is_empty());
        assert!(flow.handle_callback("dl:video:1").unwrap().notice.is_some());
        assert!(flow.handle_callback("report:2147483647:12").unwrap().notice.is_some());
        assert!(flow.handle_callback("report:-2147483648:1").unwrap().notice.is_some());
    }
}
