//! Main reply keyboard

use strum::{Display, EnumIter, EnumString};

/// Buttons of the persistent main keyboard.
///
/// `Display` gives the label shown to the user; `FromStr` also accepts the
/// labels of older keyboards still cached by some clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum MenuButton {
    #[strum(to_string = "📱 Мои Деньги")]
    MyMoney,
    #[strum(to_string = "🎯 Цели")]
    Goals,
    #[strum(to_string = "📂 Категории")]
    Categories,
    #[strum(to_string = "📊 Бюджеты")]
    Budgets,
    #[strum(to_string = "📈 Отчеты")]
    Reports,
    #[strum(to_string = "💰 Баланс", serialize = "📊 Мой Баланс", serialize = "Баланс")]
    Balance,
    #[strum(to_string = "📋 Транзакции", serialize = "📋 История")]
    History,
}

impl MenuButton {
    /// Keyboard rows, top to bottom
    pub const LAYOUT: &'static [&'static [MenuButton]] = &[
        &[MenuButton::MyMoney],
        &[MenuButton::Goals, MenuButton::Categories],
        &[MenuButton::Budgets, MenuButton::Reports],
        &[MenuButton::Balance, MenuButton::History],
    ];

    /// The button opens the Mini App instead of sending its label
    pub fn opens_web_app(self) -> bool {
        self == MenuButton::MyMoney
    }

    pub fn label(self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_labels_parse_back() {
        for button in MenuButton::iter() {
            assert_eq!(button.label().parse::<MenuButton>(), Ok(button));
        }
    }

    #[test]
    fn test_legacy_labels() {
        assert_eq!("📊 Мой Баланс".parse::<MenuButton>(), Ok(MenuButton::Balance));
        assert_eq!("Баланс".parse::<MenuButton>(), Ok(MenuButton::Balance));
        assert_eq!("📋 История".parse::<MenuButton>(), Ok(MenuButton::History));
        assert!("500 Еда".parse::<MenuButton>().is_err());
    }

    #[test]
    fn test_layout_covers_every_button() {
        let placed: Vec<MenuButton> = MenuButton::LAYOUT.iter().flat_map(|row| row.iter().copied()).collect();
        assert_eq!(placed.len(), MenuButton::iter().count());
        assert!(placed[0].opens_web_app());
    }
}
