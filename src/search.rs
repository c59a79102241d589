//! Fuzzy filtering for pickers and the command palette.
//!
//! A query matches a candidate when its characters appear in the candidate in
//! order (case-insensitive). Each matched character scores:
//! - 3 if it is the candidate's first character,
//! - 2 if it follows a word boundary (space, `-`, `_`, `.`, `/`),
//! - 1 if it directly follows the previous matched character,
//! - 0 otherwise.
//!
//! Positions are character indices into the candidate, for highlighting.

use crate::keybindings::Dispatcher;

/// One candidate that matched a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// Position of the candidate in the input list
    pub index: usize,
    pub score: u32,
    /// Matched character positions, ascending
    pub positions: Vec<usize>,
}

fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '-' | '_' | '.' | '/')
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Score `candidate` against a non-empty `query`.
///
/// Returns `None` unless every query character is matched in order.
pub fn score(candidate: &str, query: &str) -> Option<(u32, Vec<usize>)> {
    let query: Vec<char> = query.chars().map(fold).collect();
    if query.is_empty() {
        return Some((0, Vec::new()));
    }

    let mut cursor = 0;
    let mut total = 0u32;
    let mut positions: Vec<usize> = Vec::with_capacity(query.len());
    let mut previous: Option<char> = None;

    for (i, c) in candidate.chars().enumerate() {
        if cursor < query.len() && fold(c) == query[cursor] {
            total += if i == 0 {
                3
            } else if previous.is_some_and(is_word_boundary) {
                2
            } else if positions.last() == Some(&(i - 1)) {
                1
            } else {
                0
            };
            positions.push(i);
            cursor += 1;
        }
        previous = Some(c);
    }

    (cursor == query.len()).then_some((total, positions))
}

/// Matching candidates, best score first.
///
/// The sort is stable, so equal scores keep their input order. An empty
/// query matches everything with score 0 and no positions.
pub fn filter<S: AsRef<str>>(candidates: &[S], query: &str) -> Vec<FuzzyMatch> {
    if query.is_empty() {
        return (0..candidates.len())
            .map(|index| FuzzyMatch {
                index,
                score: 0,
                positions: Vec::new(),
            })
            .collect();
    }

    let mut results: Vec<FuzzyMatch> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let (score, positions) = score(candidate.as_ref(), query)?;
            Some(FuzzyMatch {
                index,
                score,
                positions,
            })
        })
        .collect();
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

/// Which command field produced a palette match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedField {
    Title,
    Id,
}

/// A command palette row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub id: String,
    pub title: String,
    /// Display form of the bound hotkey
    pub hotkey: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub score: u32,
    pub matched_field: MatchedField,
    /// Highlight positions within the matched field
    pub positions: Vec<usize>,
}

/// Field weights; a title match outranks an equally good id match.
const TITLE_WEIGHT: u32 = 2;
const ID_WEIGHT: u32 = 1;

/// Search the visible commands available in the current mode.
///
/// Each command is scored on its title and its id; the better weighted
/// field wins. Results are ordered by score, then registration order.
pub fn search_commands(dispatcher: &mut Dispatcher, query: &str) -> Vec<PaletteEntry> {
    let mut entries: Vec<PaletteEntry> = dispatcher
        .available_commands()
        .into_iter()
        .filter(|entry| !entry.command.hidden)
        .filter_map(|entry| {
            let command = &entry.command;
            let title = score(&command.title, query)
                .map(|(s, p)| (s * TITLE_WEIGHT, MatchedField::Title, p));
            let id = score(&command.id, query).map(|(s, p)| (s * ID_WEIGHT, MatchedField::Id, p));

            let (score, matched_field, positions) = match (title, id) {
                (Some(t), Some(i)) if i.0 > t.0 => i,
                (Some(t), _) => t,
                (None, Some(i)) => i,
                (None, None) => return None,
            };

            Some(PaletteEntry {
                id: command.id.clone(),
                title: command.title.clone(),
                hotkey: entry.hotkey.as_ref().map(|h| h.to_string()),
                category: command.category.clone(),
                icon: command.icon.clone(),
                score,
                matched_field,
                positions,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}
