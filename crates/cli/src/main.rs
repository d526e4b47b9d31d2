use clap::{Parser, Subcommand, ValueEnum};
use picshelf_core::config::{
    credential_backend_from_env_value, data_dir_from_env_value, delete_policy_from_env_value,
};
use picshelf_core::files::{
    AddOutcome, AlwaysOverwrite, DeletePolicy, FileName, InventoryService, NeverOverwrite,
};
use picshelf_core::password::{self, GateState, PasswordSetup, SetupStep};
use picshelf_core::{CoreConfig, CoreError, CoreResult, LibraryView, Preview, SortOrder};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "picshelf")]
#[command(about = "Password-protected local image library")]
struct Cli {
    /// Data directory holding library/ and state/
    #[arg(long, env = "PICSHELF_DATA_DIR")]
    data_dir: Option<String>,

    /// Library password
    #[arg(long, env = "PICSHELF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Library(LibraryCommand),
    /// Manage the library password
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },
    /// Show or change the sort order
    Sort {
        #[command(subcommand)]
        action: SortAction,
    },
}

/// Commands that need an unlocked library.
#[derive(Debug, Subcommand)]
enum LibraryCommand {
    /// List images in the library
    List {
        /// Override the stored sort order
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
    },
    /// Print the absolute path of an image
    Path {
        /// File name in the library
        name: String,
    },
    /// Copy an image into the library
    Add {
        /// File to import
        source: PathBuf,
        /// Name to store it under (defaults to the source file name)
        #[arg(long)]
        name: Option<String>,
        /// Replace an existing file with the same name
        #[arg(long)]
        overwrite: bool,
    },
    /// Delete an image
    Delete {
        /// File name in the library
        name: String,
        /// Fail if the file is missing or cannot be removed
        #[arg(long)]
        strict: bool,
    },
    /// Show details of an image
    Info {
        /// File name in the library
        name: String,
    },
}

#[derive(Subcommand)]
enum PasswordAction {
    /// Report whether a password has been set
    Status,
    /// Create the password, or change it (requires --password)
    Set {
        /// New password
        new_password: String,
        /// New password again
        confirm: String,
    },
    /// Check a password without opening the library
    Verify {
        /// Password to check
        candidate: String,
    },
}

#[derive(Subcommand)]
enum SortAction {
    /// Show the stored sort order
    Get,
    /// Store a sort order
    Set {
        #[arg(value_enum)]
        order: OrderArg,
    },
    /// Flip the stored sort order
    Toggle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => SortOrder::Ascending,
            OrderArg::Desc => SortOrder::Descending,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("picshelf=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'picshelf --help' for commands");
        return Ok(());
    };

    let delete_policy =
        delete_policy_from_env_value(std::env::var("PICSHELF_DELETE_POLICY").ok())?;
    let credential_backend =
        credential_backend_from_env_value(std::env::var("PICSHELF_CREDENTIAL_STORE").ok())?;
    let config = CoreConfig::new(data_dir_from_env_value(cli.data_dir), delete_policy)?
        .with_credential_backend(credential_backend);
    config.ensure_dirs()?;

    tracing::info!("++ Opening picshelf library in {}", config.data_dir().display());

    let mut out = io::stdout().lock();
    let result = run(&config, cli.password.as_deref(), command, &mut out);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(
    config: &CoreConfig,
    password: Option<&str>,
    command: Commands,
    out: &mut impl Write,
) -> CliResult<()> {
    match command {
        Commands::Library(command) => {
            tracing::debug!("unlocking library for {:?}", command);
            let inventory = unlock_library(config, password)?;
            run_library(config, inventory, command, out)
        }
        Commands::Password { action } => run_password(config, password, action, out),
        Commands::Sort { action } => run_sort(config, action, out),
    }
}

fn parse_name(raw: &str) -> CoreResult<FileName> {
    FileName::new(raw).map_err(|e| CoreError::Files(e.into()))
}

fn unlock_library(config: &CoreConfig, password: Option<&str>) -> CoreResult<InventoryService> {
    let gate = config.credential_gate();

    match password::gate_state(&gate)? {
        GateState::NeedsSetup => {
            return Err(CoreError::InvalidInput(
                "no password has been set; create one with 'picshelf password set'".into(),
            ));
        }
        GateState::Locked => {
            let candidate = password.ok_or_else(|| {
                CoreError::InvalidInput(
                    "password required: pass --password or set PICSHELF_PASSWORD".into(),
                )
            })?;
            password::unlock(&gate, candidate)?;
        }
    }

    config.inventory()
}

fn run_library(
    config: &CoreConfig,
    inventory: InventoryService,
    command: LibraryCommand,
    out: &mut impl Write,
) -> CliResult<()> {
    match command {
        LibraryCommand::List { order } => {
            let order = order
                .map(SortOrder::from)
                .unwrap_or_else(|| config.preferences().sort_order());
            let view = LibraryView::new(inventory, order);

            if view.is_empty() {
                writeln!(out, "{}", view.empty_message())?;
            }
            for row in view.rows() {
                let marker = match row.preview {
                    Preview::Available { .. } => '*',
                    Preview::Unavailable => ' ',
                };
                writeln!(out, "{} {}", marker, row.name)?;
            }
        }
        LibraryCommand::Path { name } => {
            let name = parse_name(&name)?;
            writeln!(out, "{}", inventory.resolve_path(&name).display())?;
        }
        LibraryCommand::Add {
            source,
            name,
            overwrite,
        } => {
            let name = match name {
                Some(name) => parse_name(&name)?,
                None => FileName::from_path(&source).map_err(|e| CoreError::Files(e.into()))?,
            };

            let outcome = if overwrite {
                inventory.import_from_path(&source, Some(name.clone()), &mut AlwaysOverwrite)?
            } else {
                inventory.import_from_path(&source, Some(name.clone()), &mut NeverOverwrite)?
            };

            match outcome {
                AddOutcome::Created => writeln!(out, "Added {}", name)?,
                AddOutcome::Overwritten => writeln!(out, "Replaced {}", name)?,
                AddOutcome::Declined => {
                    return Err(CoreError::InvalidInput(format!(
                        "{} already exists; pass --overwrite to replace it",
                        name
                    ))
                    .into());
                }
            }
        }
        LibraryCommand::Delete { name, strict } => {
            let name = parse_name(&name)?;
            let inventory = if strict {
                inventory.with_delete_policy(DeletePolicy::Propagate)
            } else {
                inventory
            };

            let existed = inventory.contains(&name);
            inventory.delete(&name)?;

            if inventory.contains(&name) {
                tracing::warn!("{} is still present after delete", name);
                writeln!(out, "{} could not be removed", name)?;
            } else if existed {
                writeln!(out, "Deleted {}", name)?;
            } else {
                writeln!(out, "{} is not in the library", name)?;
            }
        }
        LibraryCommand::Info { name } => {
            let name = parse_name(&name)?;
            let metadata = inventory.describe(&name)?;
            let yaml = serde_yaml::to_string(&metadata).map_err(CoreError::YamlSerialization)?;
            write!(out, "{}", yaml)?;
        }
    }

    Ok(())
}

fn run_password(
    config: &CoreConfig,
    current: Option<&str>,
    action: PasswordAction,
    out: &mut impl Write,
) -> CliResult<()> {
    let mut gate = config.credential_gate();

    match action {
        PasswordAction::Status => match password::gate_state(&gate)? {
            GateState::NeedsSetup => writeln!(out, "No password set")?,
            GateState::Locked => writeln!(out, "Password set")?,
        },
        PasswordAction::Set {
            new_password,
            confirm,
        } => match password::gate_state(&gate)? {
            GateState::NeedsSetup => {
                let mut setup = PasswordSetup::new();
                setup.submit(&mut gate, &new_password)?;
                match setup.submit(&mut gate, &confirm)? {
                    SetupStep::Created => writeln!(out, "Password created")?,
                    SetupStep::ConfirmationRequired => {
                        return Err(CoreError::PasswordMismatch.into());
                    }
                }
            }
            GateState::Locked => {
                let current = current.ok_or_else(|| {
                    CoreError::InvalidInput(
                        "changing the password requires the current one via --password".into(),
                    )
                })?;
                password::unlock(&gate, current)?;

                if new_password != confirm {
                    return Err(CoreError::PasswordMismatch.into());
                }
                password::change_password(&mut gate, &new_password)?;
                writeln!(out, "Password changed")?;
            }
        },
        PasswordAction::Verify { candidate } => {
            password::unlock(&gate, &candidate)?;
            writeln!(out, "Password accepted")?;
        }
    }

    Ok(())
}

fn run_sort(config: &CoreConfig, action: SortAction, out: &mut impl Write) -> CliResult<()> {
    let preferences = config.preferences();

    match action {
        SortAction::Get => writeln!(out, "{}", preferences.sort_order())?,
        SortAction::Set { order } => {
            let order = SortOrder::from(order);
            preferences.set_sort_order(order)?;
            writeln!(out, "{}", order)?;
        }
        SortAction::Toggle => {
            let ascending = preferences.toggle()?;
            writeln!(out, "{}", SortOrder::from_ascending(ascending))?;
        }
    }

    Ok(())
}
