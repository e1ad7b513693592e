//! Playful one-liners attached to replies

use rand::seq::IndexedRandom;

use crate::core::types::TxKind;

pub const EXPENSE_QUIPS: &[&str] = &[
    "Опять траты? Ну ладно...",
    "Записал. Плакали твои денежки.",
    "Интересный выбор! (нет)",
    "Баланс худеет, а ты нет?",
    "Ок, босс. Минус в карму (и в кошелек).",
    "Найс! (но можно было сэкономить)",
];

pub const INCOME_QUIPS: &[&str] = &[
    "О_О Деньги! Срочно тратить!",
    "Богач детектед.",
    "Плюс на счет, минус на совесть (шутка).",
    "Наконец-то пополнение!",
];

pub const BUDGET_ALARMS: &[&str] = &[
    "АЛАРМ! Бюджет пробит! 😱",
    "Кто-то слишком много кушает... 🍞",
    "Бюджет: 'Я устал, я ухожу...'",
    "Остановись, безумец! Лимит исчерпан!",
    "Поздравляю, вы банкрот в этой категории! 🎉",
];

fn pick(pool: &'static [&'static str]) -> &'static str {
    pool.choose(&mut rand::rng()).copied().unwrap_or_default()
}

/// Random reaction to a freshly recorded transaction
pub fn transaction_quip(kind: TxKind) -> &'static str {
    match kind {
        TxKind::Expense => pick(EXPENSE_QUIPS),
        TxKind::Income => pick(INCOME_QUIPS),
    }
}

/// Random alarm line for a budget that has just been exceeded
pub fn budget_alarm() -> &'static str {
    pick(BUDGET_ALARMS)
}
