//! Interactive menu shell.
//!
//! Reads menu choices and field values line by line, turns them into
//! session requests and prints the responses. A failed request is reported
//! and the loop keeps going; only choosing exit (or end of input at the
//! main menu) ends the shell. A broken terminal also ends it, after the
//! session's final save.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::core::{Action, Request, Response, Session};

use super::output::{action_label, describe, describe_listing};

const RULE_WIDTH: usize = 40;

/// Menu loop over any line source and writer
pub struct Shell<R, W> {
    session: Session,
    input: R,
    output: W,
    closed: bool,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
            closed: false,
        }
    }

    /// Run until the user exits. Returns the session for inspection.
    ///
    /// If reading or writing the terminal fails, the session is still
    /// closed (final save included) before the error is returned.
    pub async fn run(mut self) -> Result<Session> {
        if let Err(e) = self.menu_loop().await {
            if !self.closed {
                self.closed = true;
                self.session.handle(Request::Exit).await?;
            }
            return Err(e);
        }

        Ok(self.session)
    }

    async fn menu_loop(&mut self) -> Result<()> {
        loop {
            self.show_menu()?;

            let Some(choice) = self.read_line("Enter your choice (1-6): ").await? else {
                writeln!(self.output)?;
                self.dispatch(Request::Exit).await?;
                break;
            };

            let request = match choice.as_str() {
                "" => continue,
                "1" => self.prompt_add().await?,
                "2" => self.prompt_key(Action::Issue).await?,
                "3" => self.prompt_key(Action::Return).await?,
                "4" => Some(Request::ListAll),
                "5" => self.prompt_search().await?,
                "6" => Some(Request::Exit),
                _ => {
                    let response = self
                        .session
                        .reject_input("Invalid choice. Please enter a number between 1 and 6.");
                    writeln!(self.output, "\n{}", describe(&response))?;
                    None
                }
            };

            let Some(request) = request else {
                continue;
            };

            let exiting = request == Request::Exit;
            self.dispatch(request).await?;
            if exiting {
                break;
            }
        }

        Ok(())
    }

    fn show_menu(&mut self) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.output, "\n{}", rule)?;
        writeln!(self.output, "Shelfmark Catalog")?;
        writeln!(self.output, "{}", rule)?;
        writeln!(self.output, "1. Add New Item")?;
        writeln!(self.output, "2. Issue Item")?;
        writeln!(self.output, "3. Return Item")?;
        writeln!(self.output, "4. View All Items")?;
        writeln!(self.output, "5. Search Items")?;
        writeln!(self.output, "6. Exit")?;
        writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Handle a request and print the outcome. Request errors are reported,
    /// not returned.
    async fn dispatch(&mut self, request: Request) -> Result<()> {
        let listing = request == Request::ListAll;
        if request == Request::Exit {
            self.closed = true;
        }

        match self.session.handle(request).await {
            Ok(Response::Items(items)) if listing => {
                writeln!(self.output, "\n--- Current Catalog ---")?;
                writeln!(self.output, "{}", describe_listing(&items))?;
            }
            Ok(response) => {
                writeln!(self.output, "\n{}", describe(&response))?;
            }
            Err(e) => {
                writeln!(self.output, "\nError: {}", e)?;
                writeln!(
                    self.output,
                    "The change is kept for this session but is NOT on disk."
                )?;
            }
        }

        Ok(())
    }

    async fn prompt_add(&mut self) -> Result<Option<Request>> {
        writeln!(self.output, "\n--- Add New Item ---")?;

        let Some(title) = self.prompt("Enter Title: ").await? else {
            return self.cancelled();
        };
        let Some(author) = self.prompt("Enter Author: ").await? else {
            return self.cancelled();
        };
        let Some(key) = self.prompt("Enter Key (unique identifier, e.g. ISBN): ").await? else {
            return self.cancelled();
        };

        Ok(Some(Request::AddItem { title, author, key }))
    }

    async fn prompt_key(&mut self, action: Action) -> Result<Option<Request>> {
        writeln!(self.output, "\n--- {} ---", action_label(action))?;

        let label = format!("Enter the key of the item to {}: ", action.as_str());
        let Some(key) = self.prompt(&label).await? else {
            return self.cancelled();
        };

        Ok(Some(match action {
            Action::Issue => Request::IssueItem { key },
            Action::Return => Request::ReturnItem { key },
        }))
    }

    async fn prompt_search(&mut self) -> Result<Option<Request>> {
        writeln!(self.output, "\n--- Search Items ---")?;
        writeln!(self.output, "1. Search by Title")?;
        writeln!(self.output, "2. Search by Key")?;

        let Some(choice) = self.prompt("Enter choice (1 or 2): ").await? else {
            return self.cancelled();
        };

        match choice.as_str() {
            "1" => {
                let Some(text) = self.prompt("Enter search term (part of title): ").await? else {
                    return self.cancelled();
                };
                Ok(Some(Request::SearchByTitle { text }))
            }
            "2" => {
                let Some(key) = self.prompt("Enter exact key: ").await? else {
                    return self.cancelled();
                };
                Ok(Some(Request::SearchByKey { key }))
            }
            _ => {
                let response = self.session.reject_input("Invalid search choice.");
                writeln!(self.output, "\n{}", describe(&response))?;
                Ok(None)
            }
        }
    }

    fn cancelled(&mut self) -> Result<Option<Request>> {
        writeln!(self.output, "\nOperation cancelled.")?;
        Ok(None)
    }

    /// Ask until a non-empty answer arrives. `None` on end of input.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        loop {
            match self.read_line(label).await? {
                None => return Ok(None),
                Some(answer) if answer.is_empty() => {
                    writeln!(self.output, "Input cannot be empty. Please try again.")?;
                }
                Some(answer) => return Ok(Some(answer)),
            }
        }
    }

    /// Print `label`, read one trimmed line. `None` on end of input.
    /// A line that is not valid UTF-8 is rejected and asked for again.
    async fn read_line(&mut self, label: &str) -> Result<Option<String>> {
        loop {
            write!(self.output, "{}", label)?;
            self.output.flush()?;

            let mut raw = Vec::new();
            if self.input.read_until(b'\n', &mut raw).await? == 0 {
                return Ok(None);
            }

            match String::from_utf8(raw) {
                Ok(line) => return Ok(Some(line.trim().to_string())),
                Err(_) => {
                    let response = self.session.reject_input("Input is not valid text");
                    writeln!(self.output, "{}. Please try again.", describe(&response))?;
                }
            }
        }
    }
}
