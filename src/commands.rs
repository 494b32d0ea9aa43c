//! Text commands issued from the chat channel (`!latest 5`, `!remove RM-0512KI`, ...).

use crate::ingest::SharedStore;
use crate::models::{ListingId, ListingIdError};
use crate::render;
use crate::schedule::ScheduleHandle;
use crate::scrapers::{SearchHandle, SearchParams};
use thiserror::Error;

pub const PREFIX: char = '!';
/// Largest page `!latest` will show
pub const LATEST_MAX: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Latest(usize),
    All,
    Remove(ListingId),
    RemoveAll,
    Countdown,
    Help,
    /// Replace the search budget used from the next scrape on
    Initialise {
        max_price_per_week: u32,
        bedrooms: u32,
        people: u32,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("not a command")]
    NotACommand,
    #[error("unknown command `{0}`, try !help")]
    Unknown(String),
    #[error("`!{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("could not remove listing: {0}")]
    InvalidId(#[from] ListingIdError),
    #[error("`{0}` is not a whole number")]
    InvalidNumber(String),
    #[error("the number of people must be at least 1")]
    NoPeople,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let body = line.trim().strip_prefix(PREFIX).ok_or(CommandError::NotACommand)?;
        let mut words = body.split_whitespace();
        let name = words.next().ok_or(CommandError::NotACommand)?;

        match name.to_lowercase().as_str() {
            "latest" => {
                // anything outside 1..=20 shows the full page
                let count = words
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| (1..=LATEST_MAX).contains(n))
                    .unwrap_or(LATEST_MAX);
                Ok(Command::Latest(count))
            }
            "all" | "allproperties" => Ok(Command::All),
            "remove" | "removeproperty" => {
                let id = words.next().ok_or(CommandError::MissingArgument("remove"))?;
                Ok(Command::Remove(id.parse()?))
            }
            "removeall" => Ok(Command::RemoveAll),
            "countdown" => Ok(Command::Countdown),
            "help" => Ok(Command::Help),
            "initialise" | "initialize" => {
                let mut next = || -> Result<u32, CommandError> {
                    let word = words.next().ok_or(CommandError::MissingArgument("initialise"))?;
                    word.parse().map_err(|_| CommandError::InvalidNumber(word.to_string()))
                };
                let max_price_per_week = next()?;
                let bedrooms = next()?;
                let people = next()?;
                if people == 0 {
                    return Err(CommandError::NoPeople);
                }
                Ok(Command::Initialise {
                    max_price_per_week,
                    bedrooms,
                    people,
                })
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Everything a command may touch
#[derive(Clone)]
pub struct CommandContext {
    store: SharedStore,
    schedule: Option<ScheduleHandle>,
    search: Option<SearchHandle>,
}

impl CommandContext {
    pub fn new(store: SharedStore, schedule: Option<ScheduleHandle>) -> Self {
        Self {
            store,
            schedule,
            search: None,
        }
    }

    /// Let `!initialise` change the parameters the scrapers read
    pub fn with_search(mut self, search: SearchHandle) -> Self {
        self.search = Some(search);
        self
    }

    /// Parse and run one line. Lines that are not commands get no reply.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        match Command::parse(line) {
            Ok(command) => Some(self.execute(command).await),
            Err(CommandError::NotACommand) => None,
            Err(e) => Some(e.to_string()),
        }
    }

    pub async fn execute(&self, command: Command) -> String {
        match command {
            Command::Latest(n) => {
                let listings = self.store.read().await.get_recent(n);
                if listings.is_empty() {
                    return "No listings found yet.".to_string();
                }
                format!("Latest {} listings found:\n{}", listings.len(), render::fenced(&listings))
            }
            Command::All => {
                let snapshot = self.store.read().await.snapshot();
                if snapshot.is_empty() {
                    return "No listings found yet.".to_string();
                }
                format!("All {} listings found:\n{}", snapshot.len(), render::fenced(&snapshot.read(None)))
            }
            Command::Remove(id) => {
                if self.store.write().await.remove(&id) {
                    format!("Removed listing with ID {}", id)
                } else {
                    format!("No listing with ID {}; it will be ignored from now on", id)
                }
            }
            Command::RemoveAll => {
                let count = self.store.write().await.remove_all();
                format!("Removed all {} listings", count)
            }
            Command::Countdown => match self.schedule.as_ref().map(ScheduleHandle::time_until_next) {
                Some(Some(remaining)) => {
                    let secs = remaining.as_secs();
                    format!(
                        "Time remaining until next scrape: {} hours, {} minutes, {} seconds",
                        secs / 3600,
                        (secs % 3600) / 60,
                        secs % 60
                    )
                }
                Some(None) => "A scrape is running right now.".to_string(),
                None => "The scheduler has not been started.".to_string(),
            },
            Command::Initialise {
                max_price_per_week,
                bedrooms,
                people,
            } => {
                let Some(search) = self.search.as_ref() else {
                    return "Search parameters cannot be changed while running this way.".to_string();
                };
                let params = SearchParams {
                    min_price_per_month: search.get().min_price_per_month,
                    ..SearchParams::budgeted(max_price_per_week, bedrooms, people)
                };
                let monthly = params.max_price_per_month;
                search.set(params);
                format!(
                    "Initialised with parameters: £{} per person per week, {} bedrooms, {} people, £{} per month.",
                    max_price_per_week, bedrooms, people, monthly
                )
            }
            Command::Help => [
                "!initialise <max £/week> <bedrooms> <people>  set the search budget",
                "!latest [1-20]  most recent listings",
                "!all            every known listing",
                "!remove <ID>    remove a listing and never show it again",
                "!removeall      clear every known listing",
                "!countdown      time until the next scrape",
            ]
            .join("\n"),
        }
    }
}
