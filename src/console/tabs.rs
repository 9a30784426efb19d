use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Repl,
    Api,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TabError {
    #[error("no such tab: {0} (expected one of: repl, api, status)")]
    NotFound(String),
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Repl, Tab::Api, Tab::Status];

    /// Stable identifier, also accepted by `--tab`
    pub fn name(&self) -> &'static str {
        match self {
            Tab::Repl => "repl",
            Tab::Api => "api",
            Tab::Status => "status",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Repl => "Execute Code",
            Tab::Api => "API Documentation",
            Tab::Status => "Server Status",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tab {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Tab::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| TabError::NotFound(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("repl".parse::<Tab>().unwrap(), Tab::Repl);
        assert_eq!("Status".parse::<Tab>().unwrap(), Tab::Status);
        assert_eq!(
            "settings".parse::<Tab>().unwrap_err(),
            TabError::NotFound("settings".to_string())
        );
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(Tab::Repl.next(), Tab::Api);
        assert_eq!(Tab::Status.next(), Tab::Repl);
        assert_eq!(Tab::Repl.prev(), Tab::Status);
        for tab in Tab::ALL {
            assert_eq!(tab.next().prev(), tab);
        }
    }
}
