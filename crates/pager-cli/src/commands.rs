//! Navigation commands for the browse script.

use crate::sessions::{PracticeSession, SessionFilter};
use anyhow::{bail, Context, Result};
use pager_core::{LoadOutcome, PaginatedCache, PaginationArgs};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Jump to an absolute page.
    Goto(u32),
    Next,
    Prev,
    /// Refetch the current page, bypassing the cache.
    Reload,
    /// Change the instrument filter and restart at page 1. `None` clears it.
    Filter(Option<String>),
    /// Drop every cached page.
    Invalidate,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "next" | "n" => return Ok(Command::Next),
            "prev" | "p" => return Ok(Command::Prev),
            "reload" | "r" => return Ok(Command::Reload),
            "invalidate" => return Ok(Command::Invalidate),
            _ => {}
        }

        if let Some(name) = s.strip_prefix("filter:") {
            let name = name.trim();
            return Ok(Command::Filter((!name.is_empty()).then(|| name.to_string())));
        }

        let page = s.strip_prefix("goto:").unwrap_or(s);
        let page: u32 = page
            .parse()
            .with_context(|| format!("Unknown command: {}", s))?;
        if page == 0 {
            bail!("Pages start at 1");
        }
        Ok(Command::Goto(page))
    }
}

/// Parse a comma-separated command script.
pub fn parse_script(script: &str) -> Result<Vec<Command>> {
    script
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Runs commands against one cache, remembering the active filter.
pub struct Browser<'a> {
    cache: &'a PaginatedCache<PracticeSession, SessionFilter>,
    page_size: u32,
    filter: Option<SessionFilter>,
}

impl<'a> Browser<'a> {
    pub fn new(
        cache: &'a PaginatedCache<PracticeSession, SessionFilter>,
        page_size: u32,
        filter: Option<SessionFilter>,
    ) -> Self {
        Self {
            cache,
            page_size,
            filter,
        }
    }

    /// Run one command. Returns `None` for commands that load nothing.
    pub async fn run(&mut self, command: &Command) -> Result<Option<LoadOutcome>> {
        let outcome = match command {
            Command::Goto(page) => {
                let args = PaginationArgs::new(*page, self.page_size);
                self.cache.load_page(args, self.filter.clone(), false).await?
            }
            Command::Next => self.cache.load_adjacent_page(1, false).await?,
            Command::Prev => self.cache.load_adjacent_page(-1, false).await?,
            Command::Reload => self.cache.load_adjacent_page(0, true).await?,
            Command::Filter(instrument) => {
                self.filter = instrument.clone().map(SessionFilter::instrument);
                let args = PaginationArgs::new(1, self.page_size);
                self.cache.load_page(args, self.filter.clone(), false).await?
            }
            Command::Invalidate => {
                let removed = self.cache.invalidate()?;
                info!("Removed {} cached pages", removed);
                return Ok(None);
            }
        };
        Ok(Some(outcome))
    }
}
