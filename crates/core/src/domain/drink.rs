use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrinkType {
    Cappuccino,
    Latte,
    PourOver,
    ColdBrew,
}

impl DrinkType {
    pub const ALL: [DrinkType; 4] =
        [DrinkType::Cappuccino, DrinkType::Latte, DrinkType::PourOver, DrinkType::ColdBrew];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cappuccino => "Cappuccino",
            Self::Latte => "Latte",
            Self::PourOver => "Pour Over",
            Self::ColdBrew => "Cold Brew",
        }
    }

    /// Value submitted back by the dialog select element.
    pub fn value(&self) -> &'static str {
        match self {
            Self::Cappuccino => "cappuccino",
            Self::Latte => "latte",
            Self::PourOver => "pourOver",
            Self::ColdBrew => "coldBrew",
        }
    }

    pub fn from_value(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|drink| drink.value() == raw.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::DrinkType;

    #[test]
    fn select_values_resolve_back_to_drinks() {
        for drink in DrinkType::ALL {
            assert_eq!(DrinkType::from_value(drink.value()), Some(drink));
        }
        assert_eq!(DrinkType::from_value("espresso"), None);
    }

    #[test]
    fn labels_match_menu_wording() {
        assert_eq!(DrinkType::PourOver.label(), "Pour Over");
        assert_eq!(DrinkType::ColdBrew.label(), "Cold Brew");
    }
}
