use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use serde::Deserialize;

use crate::transfer::TransferId;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Login,
    Logout,
    Suggest,
    Approve,
    Reject,
}

/// One recorded user action. `user` is the acting user: the sender for
/// `suggest`, the resolver for `approve`/`reject`.
#[derive(Debug, Deserialize)]
pub struct ActionRow {
    pub action: ActionKind,
    pub user: String,
    pub recipient: Option<String>,
    pub amount: Option<u64>,
    pub transfer: Option<TransferId>,
}

/// Parses an action list in CSV format
///
/// # Panics
///
/// If a row cannot be parsed
pub struct CsvActionParser<R> {
    iter: DeserializeRecordsIntoIter<R, ActionRow>,
}

impl<R> CsvActionParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvActionParser<R>
where
    R: Read,
{
    type Item = (u64, ActionRow);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row.unwrap()))
    }
}
