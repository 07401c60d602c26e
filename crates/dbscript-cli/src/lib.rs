mod commands;
mod helper;

use commands::Command;
use helper::CliHelper;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use dbscript::{Config, ConsoleBuffer, RunStatus, ScriptEnv, ScriptRunner, Submission};
use dbscript_core::{Catalog, Table};
use dbscript_driver_sqlite::Sqlite;
use rustyline::{error::ReadlineError, history::DefaultHistory, Editor};
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

const HISTORY_FILE: &str = ".dbscript_history";

#[derive(Parser, Debug)]
#[command(name = "dbscript")]
#[command(about = "Interactive scripting console for relational databases")]
#[command(version)]
pub struct Args {
    /// Database to connect to, e.g. `sqlite:shop.db` or `sqlite::memory:`
    #[arg(long)]
    pub url: Option<String>,

    /// Evaluation steps between two checks for Ctrl-C
    #[arg(long, default_value_t = 1000)]
    pub check_interval: u32,

    /// Deepest allowed nesting of script function calls
    #[arg(long, default_value_t = 200)]
    pub max_depth: usize,

    /// Deepest allowed nesting of brackets and operators in a script
    #[arg(long, default_value_t = 128)]
    pub max_nesting: usize,

    /// Run this script and exit instead of starting the console
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Do not print the value of a script's last expression
    #[arg(long)]
    pub no_echo: bool,
}

impl Args {
    pub fn config(&self) -> Config {
        Config::new()
            .interrupt_check_interval(self.check_interval)
            .max_call_depth(self.max_depth)
            .max_nesting_depth(self.max_nesting)
            .echo_result(!self.no_echo)
    }
}

/// The console: one runner writing to stdout, plus the backslash commands.
pub struct DbscriptCli {
    runner: ScriptRunner,
    catalog: Option<Arc<Catalog>>,
}

impl DbscriptCli {
    pub fn new(env: ScriptEnv, config: Config) -> Self {
        let catalog = env.catalog().cloned();
        let console = ConsoleBuffer::with_echo(std::io::stdout());
        Self {
            runner: ScriptRunner::new(env, console, config),
            catalog,
        }
    }

    /// Connects to `args.url`, or starts without a database when none is given.
    pub fn connect(args: &Args) -> Result<Self> {
        let env = match &args.url {
            Some(url) => {
                let driver = Sqlite::new(url.as_str())?;
                let connection = driver
                    .connect()
                    .with_context(|| format!("failed to open {url}"))?;
                debug!(url = %driver.url(), "connected");
                ScriptEnv::connect(Arc::new(connection))
            }
            None => ScriptEnv::detached(),
        };
        Ok(Self::new(env, args.config()))
    }

    pub fn runner(&self) -> &ScriptRunner {
        &self.runner
    }

    /// Runs `source` to completion. Ctrl-C cancels it.
    pub async fn run_script(&self, source: &str) -> Option<RunStatus> {
        if self.runner.submit(source) == Submission::Rejected {
            eprintln!("a script is already running");
            return None;
        }

        let idle = self.runner.wait_idle();
        tokio::pin!(idle);
        loop {
            tokio::select! {
                _ = &mut idle => break,
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => self.runner.cancel(),
                    Err(err) => {
                        debug!(error = %err, "cannot listen for Ctrl-C");
                        (&mut idle).await;
                        break;
                    }
                },
            }
        }

        self.runner.last_status()
    }

    pub async fn run_file(&self, path: &PathBuf) -> Result<Option<RunStatus>> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(self.run_script(&source).await)
    }

    // Interactive loop reading scripts and commands
    pub async fn repl_loop(&self) -> Result<()> {
        let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(CliHelper {}));
        rl.load_history(HISTORY_FILE).ok();

        loop {
            match rl.readline("> ") {
                Ok(line) if line.trim_start().starts_with('\\') => {
                    rl.add_history_entry(line.trim_end())?;
                    let command = line.split_whitespace().collect::<Vec<_>>().join(" ");
                    match command[1..].parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(cmd) => {
                            if let Err(e) = self.handle_command(cmd).await {
                                eprintln!("{e:#}")
                            }
                        }
                        Err(()) => eprintln!("'{command}' is not a valid command, try \\?"),
                    }
                }
                Ok(line) if line.trim().is_empty() => {}
                Ok(line) => {
                    rl.add_history_entry(line.trim_end())?;
                    self.run_script(&line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("\\q");
                    break;
                }
                Err(err) => {
                    eprintln!("Error while reading input: {err:?}");
                    break;
                }
            }
        }

        rl.save_history(HISTORY_FILE)?;
        Ok(())
    }

    async fn handle_command(&self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Help => {
                for (usage, description) in Command::all() {
                    println!("  {:<12} {description}", style(usage).bold());
                }
                Ok(())
            }
            Command::ListTables => {
                for name in self.catalog()?.table_names()? {
                    println!("{name}");
                }
                Ok(())
            }
            Command::DescribeTable(name) => {
                let table = self.catalog()?.table(&name)?.table();
                print!("{}", describe(&table));
                Ok(())
            }
            Command::RunFile(path) => {
                self.run_file(&PathBuf::from(path)).await?;
                Ok(())
            }
            Command::Quit => {
                unreachable!("quit is handled in the repl loop")
            }
        }
    }

    fn catalog(&self) -> Result<&Arc<Catalog>> {
        self.catalog
            .as_ref()
            .context("not connected to a database; start with --url")
    }
}

/// Multi-line description of a table for `\d NAME`.
pub fn describe(table: &Table) -> String {
    let mut out = format!("{} {}\n", style(&table.kind).dim(), style(&table.qualified_name).bold());

    let pk = table
        .primary_key
        .as_ref()
        .map(|pk| pk.columns.as_slice())
        .unwrap_or_default();

    for column in &table.columns {
        let key = if pk.contains(&column.name) { "PK" } else { "" };
        let null = if column.nullable { "" } else { "NOT NULL" };
        let line = format!("  {:<2} {:<24} {:<16} {null}", key, column.name, column.db_type);
        out += line.trim_end();
        out.push('\n');
    }

    for (i, fk) in table.foreign_keys.iter().enumerate() {
        out += &format!("  fk{i}: {}\n", fk.display_name());
    }
    for (i, rk) in table.referencing_keys.iter().enumerate() {
        out += &format!("  rk{i}: {}\n", rk.display_name());
    }
    for index in &table.indexes {
        let unique = if index.unique { "unique " } else { "" };
        out += &format!("  {unique}index {} ({})\n", index.name, index.columns.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbscript_core::schema::{Column, ForeignKey, PrimaryKey};
    use pretty_assertions::assert_eq;

    #[test]
    fn args() {
        let args = Args::parse_from(["dbscript", "--url", "sqlite::memory:", "--check-interval", "0", "--no-echo"]);
        let config = args.config();
        assert_eq!(config.interrupt_check_interval, 1);
        assert_eq!(config.max_call_depth, 200);
        assert_eq!(config.max_nesting_depth, 128);
        assert!(!config.echo_result);
    }

    #[test]
    fn describe_lists_columns_and_keys() {
        console::set_colors_enabled(false);

        let table = Table::qualified(None, Some("main".into()), "ORDERS")
            .with_column(Column::new("ID", "INTEGER").not_null())
            .with_column(Column::new("CUSTOMER_ID", "INTEGER"))
            .with_primary_key(PrimaryKey::new(["ID"]))
            .with_foreign_key(ForeignKey::new("main.ORDERS", "main.CUSTOMERS").field("CUSTOMER_ID", "ID"));

        assert_eq!(
            describe(&table),
            "TABLE main.ORDERS\n\
             \x20 PK ID                       INTEGER          NOT NULL\n\
             \x20    CUSTOMER_ID              INTEGER\n\
             \x20 fk0: main.ORDERS(CUSTOMER_ID) -> main.CUSTOMERS(ID)\n"
        );
    }
}
