use serde::{Deserialize, Serialize};

/// User roles, assigned once at registration and never mutated.
///
/// Legacy data may carry role strings in arbitrary casing, so parsing is
/// case-insensitive and everything normalizes to this enum at the DB
/// boundary. The wire format is the canonical SCREAMING_SNAKE form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Survivor,
    Admin,
    Nikita,
}

impl Role {
    /// Case-insensitive parse covering legacy casings ("nikita", "Nikita", "NIKITA").
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("survivor") {
            Some(Self::Survivor)
        } else if s.eq_ignore_ascii_case("admin") {
            Some(Self::Admin)
        } else if s.eq_ignore_ascii_case("nikita") {
            Some(Self::Nikita)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Survivor => "SURVIVOR",
            Self::Admin => "ADMIN",
            Self::Nikita => "NIKITA",
        }
    }

    /// The exempt role scores 0 no matter how many taps it lands.
    pub fn is_exempt(self) -> bool {
        matches!(self, Self::Nikita)
    }
}

/// Round lifecycle status, derived from wall-clock time on every read.
/// Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Cooldown,
    Active,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("SURVIVOR"), Some(Role::Survivor));
        assert_eq!(Role::parse("survivor"), Some(Role::Survivor));
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("NIKITA"), Some(Role::Nikita));
        assert_eq!(Role::parse("nikita"), Some(Role::Nikita));
        assert_eq!(Role::parse("Nikita"), Some(Role::Nikita));
        assert_eq!(Role::parse("guest"), None);
    }

    #[test]
    fn role_serde_uses_canonical_form() {
        let json = serde_json::to_string(&Role::Nikita).unwrap();
        assert_eq!(json, "\"NIKITA\"");
        let back: Role = serde_json::from_str("\"SURVIVOR\"").unwrap();
        assert_eq!(back, Role::Survivor);
    }

    #[test]
    fn only_nikita_is_exempt() {
        assert!(Role::Nikita.is_exempt());
        assert!(!Role::Survivor.is_exempt());
        assert!(!Role::Admin.is_exempt());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RoundStatus::Cooldown).unwrap(),
            "\"cooldown\""
        );
        assert_eq!(
            serde_json::to_string(&RoundStatus::Finished).unwrap(),
            "\"finished\""
        );
    }
}
