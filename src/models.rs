use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RankingError;

/// Number of entries in every ranking.
pub const TOP_N: usize = 3;

/// School name carried by padding entries.
pub const PLACEHOLDER_SCHOOL: &str = "N/A";

/// A measure column value, before or after numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    /// Raw text that has not been coerced yet.
    Text(String),
    Missing,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Parses text into a number, degrading anything unparseable to `Missing`.
    pub fn coerce(&mut self) {
        if let Cell::Text(raw) = self {
            *self = match raw.trim().parse::<f64>() {
                Ok(value) if !value.is_nan() => Cell::Number(value),
                _ => Cell::Missing,
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub year: i32,
    pub school: Option<String>,
    pub position: Option<String>,
    pub salary: Cell,
    pub cav: Cell,
    pub pick: Cell,
}

impl Record {
    pub fn cell(&self, measure: Measure) -> &Cell {
        match measure {
            Measure::Salary => &self.salary,
            Measure::Cav => &self.cav,
            Measure::Pick => &self.pick,
        }
    }

    pub fn cell_mut(&mut self, measure: Measure) -> &mut Cell {
        match measure {
            Measure::Salary => &mut self.salary,
            Measure::Cav => &mut self.cav,
            Measure::Pick => &mut self.pick,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Salary,
    Cav,
    Pick,
}

impl Measure {
    pub const ALL: [Measure; 3] = [Measure::Salary, Measure::Cav, Measure::Pick];

    /// Header of the source column holding this measure.
    pub fn column(self) -> &'static str {
        match self {
            Measure::Salary => "Salary",
            Measure::Cav => "CAV",
            Measure::Pick => "Pick",
        }
    }
}

/// The ranking criterion picked by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Goal {
    #[serde(rename = "Max Salary")]
    MaxSalary,
    #[serde(rename = "Best CAV")]
    BestCav,
    #[serde(rename = "Most Picks")]
    MostPicks,
}

impl Goal {
    pub const ALL: [Goal; 3] = [Goal::MaxSalary, Goal::BestCav, Goal::MostPicks];

    pub fn label(self) -> &'static str {
        match self {
            Goal::MaxSalary => "Max Salary",
            Goal::BestCav => "Best CAV",
            Goal::MostPicks => "Most Picks",
        }
    }

    pub fn measure(self) -> Measure {
        match self {
            Goal::MaxSalary => Measure::Salary,
            Goal::BestCav => Measure::Cav,
            Goal::MostPicks => Measure::Pick,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Goal {
    type Err = RankingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Goal::ALL
            .into_iter()
            .find(|goal| goal.label() == value)
            .ok_or_else(|| RankingError::InvalidGoal(value.to_string()))
    }
}

/// Per-school aggregates. `None` means every value of that measure was missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedGroup {
    #[serde(rename = "School")]
    pub school: String,
    #[serde(rename = "Salary")]
    pub salary: Option<f64>,
    #[serde(rename = "CAV")]
    pub cav: Option<f64>,
    #[serde(rename = "Pick")]
    pub pick: f64,
    #[serde(skip)]
    pub placeholder: bool,
}

impl AggregatedGroup {
    pub fn placeholder() -> Self {
        Self {
            school: PLACEHOLDER_SCHOOL.to_string(),
            salary: Some(0.0),
            cav: Some(0.0),
            pick: 0.0,
            placeholder: true,
        }
    }

    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Salary => self.salary,
            Measure::Cav => self.cav,
            Measure::Pick => Some(self.pick),
        }
    }
}

/// Top schools for one request, always exactly [`TOP_N`] entries long.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedResult {
    entries: [AggregatedGroup; TOP_N],
}

impl RankedResult {
    pub fn new(entries: [AggregatedGroup; TOP_N]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AggregatedGroup; TOP_N] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregatedGroup> {
        self.entries.iter()
    }

    pub fn schools(&self) -> impl Iterator<Item = &AggregatedGroup> {
        self.entries.iter().filter(|entry| !entry.placeholder)
    }
}

/// A ranked result together with the request parameters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub year: i32,
    pub goal: Goal,
    pub position: Option<String>,
    pub rankings: RankedResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankRequest {
    pub year: i32,
    pub goal: String,
    pub position: Option<String>,
}

impl RankRequest {
    pub fn goal(&self) -> Result<Goal, RankingError> {
        self.goal.parse()
    }

    /// Position filter, treating an empty string as no filter.
    pub fn position(&self) -> Option<&str> {
        self.position.as_deref().filter(|position| !position.is_empty())
    }
}
