//! Command handlers wiring the core services to CLI arguments.

use std::error::Error;
use std::fmt::{Display, Formatter};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use serde_json::{json, Value};
use todo_core::{
    parse_list_params, AppConfig, Argon2PasswordHasher, AuthGate, AuthService, AuthenticatedUser,
    ErrorBody, JwtTokenService, NewTodo, Patch, ServiceFailure, SqliteTodoRepository,
    SqliteUserRepository, Store, TodoId, TodoService, TodoUpdate, ValidationError,
};

/// A request refused by the core, rendered as a public error envelope.
#[derive(Debug)]
pub struct Rejected(ErrorBody);

impl Rejected {
    pub fn to_json(&self) -> Value {
        json!({ "error": self.0.error, "message": self.0.message })
    }
}

impl Display for Rejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl Error for Rejected {}

fn reject<E: ServiceFailure>(err: E) -> anyhow::Error {
    Rejected(err.to_body()).into()
}

#[derive(Subcommand, Debug)]
pub enum TodoCommands {
    /// List todos with optional filters
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one todo
    Show { id: TodoId },

    /// Create a todo
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date as YYYY-MM-DD or RFC 3339
        #[arg(long)]
        due: Option<String>,
    },

    /// Change selected fields of a todo
    Update(UpdateArgs),

    /// Delete a todo
    #[command(alias = "rm")]
    Delete { id: TodoId },

    /// Copy a todo under a suffixed title
    Duplicate { id: TodoId },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    limit: Option<String>,
    #[arg(long)]
    offset: Option<String>,
    /// Match title or description
    #[arg(short, long)]
    query: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Inclusive lower bound, YYYY-MM-DD
    #[arg(long)]
    due_from: Option<String>,
    /// Inclusive upper bound, YYYY-MM-DD
    #[arg(long)]
    due_to: Option<String>,
    /// true|false|1|0
    #[arg(long)]
    completed: Option<String>,
    /// title|created_at|updated_at|due_date
    #[arg(long)]
    sort: Option<String>,
    /// asc|desc
    #[arg(long)]
    order: Option<String>,
}

impl ListArgs {
    fn into_pairs(self) -> Vec<(&'static str, String)> {
        [
            ("limit", self.limit),
            ("offset", self.offset),
            ("q", self.query),
            ("title", self.title),
            ("description", self.description),
            ("due_from", self.due_from),
            ("due_to", self.due_to),
            ("completed", self.completed),
            ("sort", self.sort),
            ("order", self.order),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect()
    }
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    id: TodoId,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,
    #[arg(long)]
    clear_description: bool,
    /// Due date as YYYY-MM-DD or RFC 3339
    #[arg(long, conflicts_with = "clear_due")]
    due: Option<String>,
    #[arg(long)]
    clear_due: bool,
    #[arg(long)]
    completed: Option<bool>,
}

impl UpdateArgs {
    fn into_update(self) -> Result<(TodoId, TodoUpdate), ValidationError> {
        let description = match (self.description, self.clear_description) {
            (_, true) => Patch::Clear,
            (Some(value), false) => Patch::Set(value),
            (None, false) => Patch::Keep,
        };
        let due_date = match (self.due, self.clear_due) {
            (_, true) => Patch::Clear,
            (Some(value), false) => Patch::Set(parse_due(&value)?),
            (None, false) => Patch::Keep,
        };
        Ok((
            self.id,
            TodoUpdate {
                title: self.title,
                description,
                due_date,
                completed: self.completed,
            },
        ))
    }
}

/// Accepts an RFC 3339 instant or a bare date (start of that UTC day).
fn parse_due(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|moment| moment.and_utc())
        .ok_or_else(|| ValidationError::Malformed {
            field: "due_date",
            reason: format!("expected YYYY-MM-DD or RFC 3339, got `{value}`"),
        })
}

/// Services bound to one open store for the lifetime of a command.
pub struct Context<'a> {
    store: &'a Store,
    tokens: JwtTokenService,
    token: Option<&'a str>,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a Store, config: &AppConfig, token: Option<&'a str>) -> Self {
        Self {
            store,
            tokens: JwtTokenService::new(config.token_secret.as_bytes(), config.token_ttl),
            token,
        }
    }

    fn auth(
        &self,
    ) -> AuthService<SqliteUserRepository<'a>, Argon2PasswordHasher, &JwtTokenService> {
        AuthService::new(
            SqliteUserRepository::new(self.store),
            Argon2PasswordHasher::new(),
            &self.tokens,
        )
    }

    fn todos(&self) -> TodoService<SqliteTodoRepository<'a>> {
        TodoService::new(SqliteTodoRepository::new(self.store))
    }

    fn authenticate(&self) -> Result<AuthenticatedUser> {
        let header = self.token.map(|token| format!("Bearer {}", token.trim()));
        AuthGate::new(&self.tokens)
            .authenticate(header.as_deref())
            .map_err(reject)
    }

    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<Value> {
        let user = self.auth().register(username, email, password).map_err(reject)?;
        Ok(serde_json::to_value(user)?)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Value> {
        let issued = self.auth().login(email, password).map_err(reject)?;
        Ok(serde_json::to_value(issued)?)
    }

    pub fn whoami(&self) -> Result<Value> {
        let user = self.authenticate()?;
        let account = self.auth().current_user(&user).map_err(reject)?;
        Ok(serde_json::to_value(account)?)
    }

    pub fn todo(&self, command: TodoCommands) -> Result<Value> {
        let user = self.authenticate()?;
        let todos = self.todos();

        match command {
            TodoCommands::List(args) => {
                let filter = parse_list_params(args.into_pairs()).map_err(reject)?;
                let page = todos.list(&user, filter).map_err(reject)?;
                Ok(serde_json::to_value(page)?)
            }
            TodoCommands::Show { id } => {
                let todo = todos.detail(&user, id).map_err(reject)?;
                Ok(serde_json::to_value(todo)?)
            }
            TodoCommands::Add {
                title,
                description,
                due,
            } => {
                let due_date = due.as_deref().map(parse_due).transpose().map_err(reject)?;
                let input = NewTodo {
                    title,
                    description,
                    due_date,
                };
                let todo = todos.create(&user, input).map_err(reject)?;
                Ok(serde_json::to_value(todo)?)
            }
            TodoCommands::Update(args) => {
                let (id, update) = args.into_update().map_err(reject)?;
                let todo = todos.update(&user, id, update).map_err(reject)?;
                Ok(serde_json::to_value(todo)?)
            }
            TodoCommands::Delete { id } => {
                todos.delete(&user, id).map_err(reject)?;
                Ok(json!({ "deleted": id }))
            }
            TodoCommands::Duplicate { id } => {
                let todo = todos.duplicate(&user, id).map_err(reject)?;
                Ok(serde_json::to_value(todo)?)
            }
        }
    }
}
