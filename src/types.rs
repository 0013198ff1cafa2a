use std::fmt::{self, Display};
use std::str::FromStr;

/// Visual category of a notification.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Success,
    Error,
    Info,
    Warning,
}

impl Kind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" | "ok" => Ok(Self::Success),
            "error" | "err" => Ok(Self::Error),
            "info" | "information" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

/// Screen corner or edge the notification stack is anchored to.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Position {
    TopLeft,
    #[default]
    TopRight,
    TopCenter,
    BottomLeft,
    BottomRight,
    BottomCenter,
}

impl Position {
    pub const ALL: [Self; 6] = [
        Self::TopLeft,
        Self::TopRight,
        Self::TopCenter,
        Self::BottomLeft,
        Self::BottomRight,
        Self::BottomCenter,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::TopCenter => "top-center",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::BottomCenter => "bottom-center",
        }
    }

    /// Bottom-anchored stacks grow upwards, so the newest entry sits at the edge.
    pub const fn is_bottom(self) -> bool {
        matches!(
            self,
            Self::BottomLeft | Self::BottomRight | Self::BottomCenter
        )
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|position| position.as_str() == normalized)
            .ok_or_else(|| format!("unknown position: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{Kind, Position};
    use std::str::FromStr;

    #[test]
    fn kind_from_str_accepts_aliases() {
        assert_eq!(Kind::from_str("success"), Ok(Kind::Success));
        assert_eq!(Kind::from_str("WARN"), Ok(Kind::Warning));
        assert_eq!(Kind::from_str("err"), Ok(Kind::Error));
        assert!(Kind::from_str("fatal").is_err());
    }

    #[test]
    fn position_defaults_to_top_right() {
        assert_eq!(Position::default(), Position::TopRight);
    }

    #[test]
    fn position_parses_kebab_and_snake_case() {
        assert_eq!(Position::from_str("bottom-left"), Ok(Position::BottomLeft));
        assert_eq!(Position::from_str("TOP_CENTER"), Ok(Position::TopCenter));
        assert!(Position::from_str("middle").is_err());
    }

    #[test]
    fn only_bottom_positions_stack_upwards() {
        let bottom: Vec<_> = Position::ALL.into_iter().filter(|p| p.is_bottom()).collect();
        assert_eq!(
            bottom,
            vec![
                Position::BottomLeft,
                Position::BottomRight,
                Position::BottomCenter
            ]
        );
    }
}
