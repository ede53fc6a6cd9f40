//! This module could be a separate crate on its own, bootstrapping
//! [`token_ledger`](crate) within the binary, but it lives here so the
//! integration tests can drive the exact same wiring.

use std::io::{Read, Write};

use anyhow::Result;
use csv_parser::{ActionKind, ActionRow, CsvActionParser};
use csv_printer::{BalanceRow, print_balances};

use crate::{
    app::{AppError, TokenApp},
    command::{CommandError, SuggestCommand},
    storage::Storage,
};

pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w, S> {
    pub input: R,
    pub output: &'w mut W,
    pub storage: S,
    pub error_printer: Box<dyn FnMut(u64, AppError)>,
}

impl<'w, R, W, S> Service<'w, R, W, S>
where
    R: Read,
    W: Write + 'w,
    S: Storage,
{
    /// Replays every action against a freshly hydrated app, then prints the
    /// final balances in first-seen order.
    pub fn run(mut self) -> Result<()> {
        let parser = CsvActionParser::new(self.input);

        let mut app = TokenApp::open(self.storage)?;

        for (line, row) in parser {
            if let Err(err) = run_action(&mut app, row) {
                (self.error_printer)(line, err);
            }
        }

        print_balances(
            self.output,
            app.balances().records().iter().map(|user| BalanceRow {
                username: user.username.clone(),
                balance: user.token_balance,
            }),
        )
    }
}

fn run_action<S: Storage>(app: &mut TokenApp<S>, row: ActionRow) -> Result<(), AppError> {
    match row.action {
        ActionKind::Login => app.login(&row.user).map(|_| ()),
        ActionKind::Logout => app.logout(),
        ActionKind::Suggest => app
            .suggest(SuggestCommand {
                sender: row.user,
                recipient: row.recipient.unwrap_or_default(),
                amount: row.amount.unwrap_or_default(),
            })
            .map(|_| ()),
        ActionKind::Approve => {
            let id = row.transfer.ok_or(CommandError::MissingTransferId)?;
            app.approve(id, &row.user)
        }
        ActionKind::Reject => {
            let id = row.transfer.ok_or(CommandError::MissingTransferId)?;
            app.reject(id, &row.user)
        }
    }
}
