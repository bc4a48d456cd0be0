//! Bastion command-line front end.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, resolves the caller from `--token`, runs one operation and prints
//! its envelope as JSON on stdout. Logs go to stderr.
//!
//! ```sh
//! BASTION_TOKEN__SECRET=dev cargo run -p bastion-service -- \
//!   register alice pw1 --kind VISITOR
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use bastion_auth::{AnonymousIdentities, Credentials, IdentityResolver};
use bastion_core::{
  AccountKind, Envelope,
  task::{Difficulty, NewTask, Page, TaskRelations},
};
use bastion_service::{
  RequestContext, Service, ServiceConfig, tasks::TaskUpdate,
};
use bastion_store_sqlite::SqliteStore;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Bastion task and account service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  /// Bearer token identifying the caller. Without one the caller is
  /// anonymous.
  #[arg(short, long, global = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Args)]
struct Relations {
  /// Include the task's substance.
  #[arg(long)]
  with_substance: bool,
  /// Include the task's assignee.
  #[arg(long)]
  with_assignee:  bool,
}

impl From<Relations> for TaskRelations {
  fn from(r: Relations) -> Self {
    Self { substance: r.with_substance, assignee: r.with_assignee }
  }
}

#[derive(Subcommand)]
enum Command {
  /// List every account.
  Accounts,
  /// Log in and receive a token.
  Login {
    name:     String,
    password: String,
    #[arg(long, default_value = "VISITOR")]
    kind:     AccountKind,
  },
  /// Report whether a token is valid and when it expires.
  CheckToken {
    #[arg(value_name = "TOKEN")]
    candidate: String,
  },
  /// Register a new account.
  Register {
    name:     String,
    password: String,
    #[arg(long, default_value = "VISITOR")]
    kind:     AccountKind,
  },
  /// Change an account's password.
  ModifyPassword { name: String, new_password: String },
  /// Permanently delete an account.
  Destroy { name: String, password: String },
  /// Change an account's kind.
  SetKind { account_id: Uuid, kind: AccountKind },
  /// List tasks, one page at a time.
  Tasks {
    #[arg(long, default_value_t = 0)]
    cursor: usize,
    #[arg(long, default_value_t = 20)]
    limit:  usize,
    #[command(flatten)]
    relations: Relations,
  },
  /// Show one task.
  Task {
    task_id: Uuid,
    #[command(flatten)]
    relations: Relations,
  },
  /// List the tasks assigned to an executor.
  ExecutorTasks {
    uid: Uuid,
    #[command(flatten)]
    relations: Relations,
  },
  /// Create a task attached to a substance.
  CreateTask {
    title:        String,
    content:      String,
    substance_id: Uuid,
    #[arg(long, default_value_t = 0)]
    reward:       i64,
    #[arg(long, default_value_t = 1)]
    rate:         i64,
    #[arg(long)]
    level:        Option<Difficulty>,
  },
  /// Edit a task's title, content, reward or rate.
  UpdateTask {
    task_id: Uuid,
    #[arg(long)]
    title:   Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    reward:  Option<i64>,
    #[arg(long)]
    rate:    Option<i64>,
  },
  /// Flip a task's accomplished flag.
  Toggle { task_id: Uuid },
  /// Change a task's difficulty.
  SetLevel { task_id: Uuid, level: Difficulty },
  /// Assign a task to an executor.
  Assign { task_id: Uuid, uid: Uuid },
  /// Make a task permanently unavailable.
  Freeze { task_id: Uuid },
  /// Delete a task.
  DeleteTask { task_id: Uuid },
  /// Create a substance.
  CreateSubstance {
    name: String,
    #[arg(long)]
    description: Option<String>,
  },
  /// Create an executor.
  CreateExecutor {
    name: String,
    #[arg(long)]
    job:  Option<String>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServiceConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let tokens = Arc::new(
    cfg
      .token
      .token_service()
      .context("failed to initialise token service")?,
  );
  let partition = cfg
    .anonymous
    .partition()
    .context("invalid anonymous role partition")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let resolver = IdentityResolver::new(tokens.clone(), AnonymousIdentities::new(partition));
  let identity = resolver.resolve(cli.token.as_deref());
  tracing::debug!(subject = %identity.subject_id, role = %identity.role, "caller resolved");
  let ctx = RequestContext::new(identity);

  let service = Service::new(Arc::new(store), tokens, Credentials::default());

  match cli.command {
    Command::Accounts => emit(&service.query_all_accounts(&ctx).await),
    Command::Login { name, password, kind } => {
      emit(&service.account_login(&ctx, &name, &password, kind).await)
    }
    Command::CheckToken { candidate } => emit(&service.check_token(&ctx, &candidate).await),
    Command::Register { name, password, kind } => {
      emit(&service.account_registry(&ctx, &name, &password, kind).await)
    }
    Command::ModifyPassword { name, new_password } => {
      emit(&service.modify_password(&ctx, &name, &new_password).await)
    }
    Command::Destroy { name, password } => {
      emit(&service.account_destroy(&ctx, &name, &password).await)
    }
    Command::SetKind { account_id, kind } => {
      emit(&service.account_level_mutate(&ctx, account_id, kind).await)
    }
    Command::Tasks { cursor, limit, relations } => {
      let page = Page { cursor, limit };
      emit(&service.query_all_tasks(&ctx, Some(page), relations.into()).await)
    }
    Command::Task { task_id, relations } => {
      emit(&service.query_task_by_id(&ctx, task_id, relations.into()).await)
    }
    Command::ExecutorTasks { uid, relations } => {
      emit(&service.query_executor_tasks(&ctx, uid, relations.into()).await)
    }
    Command::CreateTask { title, content, substance_id, reward, rate, level } => {
      let input = NewTask { title, content, reward, rate, level, substance_id };
      emit(&service.create_task(&ctx, input).await)
    }
    Command::UpdateTask { task_id, title, content, reward, rate } => {
      let update = TaskUpdate { task_id, title, content, reward, rate };
      emit(&service.update_task_info(&ctx, update).await)
    }
    Command::Toggle { task_id } => emit(&service.toggle_task_status(&ctx, task_id).await),
    Command::SetLevel { task_id, level } => {
      emit(&service.mutate_task_level(&ctx, task_id, level).await)
    }
    Command::Assign { task_id, uid } => emit(&service.assign_task(&ctx, task_id, uid).await),
    Command::Freeze { task_id } => emit(&service.freeze_task(&ctx, task_id).await),
    Command::DeleteTask { task_id } => emit(&service.delete_task(&ctx, task_id).await),
    Command::CreateSubstance { name, description } => {
      emit(&service.create_substance(&ctx, &name, description.as_deref()).await)
    }
    Command::CreateExecutor { name, job } => {
      emit(&service.create_executor(&ctx, &name, job.as_deref()).await)
    }
  }
}

/// Print an envelope as pretty JSON on stdout.
fn emit<T: Serialize>(envelope: &Envelope<T>) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(envelope).context("failed to serialise envelope")?;
  println!("{json}");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
