use crate::err::Error;
use serde::Deserialize;
use std::{collections::HashMap, fmt, str::FromStr};

/// One `TOKEN=USER` pair, as found in the config file or on the command line.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub user: String,
}

impl TokenEntry {
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: user.into(),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::TokenEntry("empty token".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(Error::TokenEntry("empty user".to_string()));
        }
        if self.token.chars().any(char::is_whitespace) {
            return Err(Error::TokenEntry("token contains whitespace".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for TokenEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEntry")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl FromStr for TokenEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, user) = s
            .split_once('=')
            .ok_or_else(|| Error::TokenEntry("missing `=` separator".to_string()))?;

        let entry = TokenEntry::new(token.trim(), user.trim());
        entry.validate()?;
        Ok(entry)
    }
}

/// Maps bearer tokens to usernames. Built once at startup and never modified.
#[derive(Clone, Default)]
pub struct TokenTable {
    entries: HashMap<String, String>,
}

impl TokenTable {
    /// Build the table from `entries`; a later entry replaces an earlier one
    /// with the same token.
    pub fn from_entries<I>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = TokenEntry>,
    {
        let mut table = HashMap::new();
        for entry in entries {
            entry.validate()?;
            table.insert(entry.token, entry.user);
        }

        Ok(Self { entries: table })
    }

    /// Username bound to `token`, if any.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TokenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}
