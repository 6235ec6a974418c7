//! Console command dispatch.
//!
//! # Responsibility
//! - Tokenize one input line and dispatch to the matching handler.
//! - Render results and error messages as the fixed text protocol.
//!
//! # Invariants
//! - Success tokens `CREATED`/`READ`/`UPDATED`/`DELETED` are part of the
//!   external contract and must not change.
//! - Malformed input (wrong token count, non-numeric id/age) is handled
//!   locally and never reaches the service layer.
//! - Unknown commands are ignored without output.

use log::{info, warn};
use userstore_core::{ServiceResult, UserRepository, UserService};

const HELP_TEXT: &str = "COMMANDS:\n\
    * create <name> <email> <age>\n\
    * read (or) read <id>\n\
    * update <id> <name> <email> <age>\n\
    * delete <id>\n\
    * help\n\
    * exit";

/// Result of handling one input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print this text followed by a newline, then keep looping.
    Reply(String),
    /// Unknown command; print nothing and keep looping.
    Silent,
    /// The `exit` command; terminate the loop.
    Exit,
}

/// Line-oriented front end over the user service.
pub struct Console<R: UserRepository> {
    service: UserService<R>,
}

impl<R: UserRepository> Console<R> {
    pub fn new(service: UserService<R>) -> Self {
        Self { service }
    }

    /// Returns the fixed usage listing printed at startup and by `help`.
    pub fn help_text() -> &'static str {
        HELP_TEXT
    }

    /// Tokenizes one line and dispatches it to the matching handler.
    ///
    /// Splits on single spaces, so consecutive spaces yield empty tokens;
    /// this matches the external line protocol exactly.
    pub fn handle_line(&self, line: &str) -> Outcome {
        let tokens: Vec<&str> = line.split(' ').collect();

        match tokens[0] {
            "exit" => Outcome::Exit,
            "create" => self.dispatch("create", &tokens, Self::create),
            "read" => self.dispatch("read", &tokens, Self::read),
            "update" => self.dispatch("update", &tokens, Self::update),
            "delete" => self.dispatch("delete", &tokens, Self::delete),
            "help" => self.dispatch("help", &tokens, |_, _| HELP_TEXT.to_string()),
            _ => Outcome::Silent,
        }
    }

    fn dispatch(
        &self,
        command: &str,
        tokens: &[&str],
        handler: impl Fn(&Self, &[&str]) -> String,
    ) -> Outcome {
        info!(
            "event=console_input module=cli status=dispatch command={command} tokens={}",
            tokens.len()
        );
        Outcome::Reply(handler(self, tokens))
    }

    fn create(&self, tokens: &[&str]) -> String {
        if tokens.len() < 4 {
            warn!("event=console_create module=cli status=rejected reason=token_count");
            return "Incorrect user input for creating a new user in the database".to_string();
        }

        let age = match tokens[3].parse::<i64>() {
            Ok(age) => age,
            Err(err) => {
                warn!("event=console_create module=cli status=rejected reason=number_format");
                return format!("Incorrect number format to create a new user: {err}");
            }
        };

        match self.service.create_user(tokens[1], tokens[2], age) {
            Ok(_) => "CREATED".to_string(),
            Err(err) => err.to_string(),
        }
    }

    fn read(&self, tokens: &[&str]) -> String {
        if tokens.len() > 1 {
            self.read_by_id(tokens)
        } else {
            self.read_all()
        }
    }

    fn read_all(&self) -> String {
        match self.service.find_all() {
            Ok(users) => {
                let mut out = String::from("READ\n");
                for user in &users {
                    out.push_str(&user.to_string());
                    out.push('\n');
                }
                out
            }
            Err(err) => err.to_string(),
        }
    }

    fn read_by_id(&self, tokens: &[&str]) -> String {
        let id = match tokens[1].parse::<i64>() {
            Ok(id) => id,
            Err(err) => {
                warn!("event=console_read module=cli status=rejected reason=number_format");
                return format!("Incorrect number format to read by ID: {err}");
            }
        };

        match self.service.find_by_id(id) {
            Ok(user) => format!("READ\n{user}"),
            Err(err) => err.to_string(),
        }
    }

    fn update(&self, tokens: &[&str]) -> String {
        if tokens.len() < 5 {
            warn!("event=console_update module=cli status=rejected reason=token_count");
            return "Incorrect user input for updating user information in the database"
                .to_string();
        }

        let parsed: ServiceResult<()> = match (tokens[1].parse::<i64>(), tokens[4].parse::<i64>()) {
            (Ok(id), Ok(age)) => self.service.update_user(id, tokens[2], tokens[3], age),
            (Err(err), _) | (_, Err(err)) => {
                warn!("event=console_update module=cli status=rejected reason=number_format");
                return format!("Incorrect number format to update user information: {err}");
            }
        };

        match parsed {
            Ok(()) => "UPDATED".to_string(),
            Err(err) => err.to_string(),
        }
    }

    fn delete(&self, tokens: &[&str]) -> String {
        if tokens.len() < 2 {
            warn!("event=console_delete module=cli status=rejected reason=token_count");
            return "Incorrect user input for deleting user information from the database"
                .to_string();
        }

        let id = match tokens[1].parse::<i64>() {
            Ok(id) => id,
            Err(err) => {
                warn!("event=console_delete module=cli status=rejected reason=number_format");
                return format!("Incorrect number format to delete user information: {err}");
            }
        };

        match self.service.delete_by_id(id) {
            Ok(true) => "DELETED".to_string(),
            Ok(false) => format!("No user with ID {id} in the database"),
            Err(err) => err.to_string(),
        }
    }
}
