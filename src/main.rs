use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use picshelf_core::config::{
    credential_backend_from_env_value, data_dir_from_env_value, delete_policy_from_env_value,
};
use picshelf_core::constants::MIN_PASSWORD_CHARS;
use picshelf_core::files::{AddOutcome, FileName, FilesError, OverwriteDecision};
use picshelf_core::password::{self, GateState, PasswordSetup, SetupStep};
use picshelf_core::{CoreConfig, CoreError, LibraryView, Preview, SortOrder};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  ls                  list the library
  add <path> [name]   copy an image into the library
  rm <row>            delete the image at a row
  info <row>          show details of the image at a row
  path <row>          print the full path of the image at a row
  sort                switch between A-Z and Z-A
  passwd              change the password
  help                show this message
  quit                leave
";

/// Main entry point for the interactive picshelf session
///
/// Asks for the password (or for a new one on first run), then reads commands from
/// stdin until `quit` or end of input. Logs go to stderr.
///
/// # Environment Variables
/// - `PICSHELF_DATA_DIR`: Directory holding the library and its state (default: "picshelf_data")
/// - `PICSHELF_DELETE_POLICY`: `swallow` (default) or `propagate`
/// - `PICSHELF_CREDENTIAL_STORE`: `auto` (default), `keyring` or `file`
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("picshelf=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let delete_policy =
        delete_policy_from_env_value(std::env::var("PICSHELF_DELETE_POLICY").ok())?;
    let data_dir = data_dir_from_env_value(std::env::var("PICSHELF_DATA_DIR").ok());
    let credential_backend =
        credential_backend_from_env_value(std::env::var("PICSHELF_CREDENTIAL_STORE").ok())?;
    let config = CoreConfig::new(data_dir, delete_policy)?.with_credential_backend(credential_backend);

    tracing::info!("++ Opening picshelf library in {}", config.data_dir().display());

    let stdin = io::stdin();
    let masked_entry = stdin.is_terminal();
    let mut session =
        Session::new(config, stdin.lock(), io::stdout()).with_masked_entry(masked_entry);
    session.run()
}

/// Writes `text` and reads one line; `None` at end of input.
fn prompt<I: BufRead, O: Write>(
    input: &mut I,
    output: &mut O,
    text: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", text)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}

/// Reads one line from the terminal without echoing it; `None` on Ctrl-C or Ctrl-D.
fn read_masked() -> io::Result<Option<String>> {
    enable_raw_mode()?;
    let res = read_masked_keys();
    disable_raw_mode()?;
    res
}

fn read_masked_keys() -> io::Result<Option<String>> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Enter => return Ok(Some(secret)),
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None);
            }
            KeyCode::Char(c) => secret.push(c),
            _ => {}
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Converts a 1-based row number typed by the user into a row index.
fn parse_row(arg: Option<&&str>) -> Result<usize, CoreError> {
    arg.and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|row| row.checked_sub(1))
        .ok_or_else(|| CoreError::InvalidInput("expected a row number from the list".into()))
}

struct Session<I, O> {
    config: CoreConfig,
    input: I,
    output: O,
    masked_entry: bool,
}

impl<I: BufRead, O: Write> Session<I, O> {
    fn new(config: CoreConfig, input: I, output: O) -> Self {
        Self {
            config,
            input,
            output,
            masked_entry: false,
        }
    }

    /// Reads passwords straight from the terminal with echo off instead of from `input`.
    fn with_masked_entry(mut self, masked_entry: bool) -> Self {
        self.masked_entry = masked_entry;
        self
    }

    fn read_secret(&mut self, text: &str) -> io::Result<Option<String>> {
        if !self.masked_entry {
            return prompt(&mut self.input, &mut self.output, text);
        }

        write!(self.output, "{}", text)?;
        self.output.flush()?;
        let secret = read_masked()?;
        writeln!(self.output)?;
        Ok(secret)
    }

    fn run(&mut self) -> anyhow::Result<()> {
        self.config.ensure_dirs()?;

        if !self.open_gate()? {
            return Ok(());
        }

        let mut view = LibraryView::new(
            self.config.inventory()?,
            self.config.preferences().sort_order(),
        );
        self.print_rows(&view)?;

        while let Some(line) = prompt(&mut self.input, &mut self.output, "picshelf> ")? {
            let mut parts = line.split_whitespace();
            let Some(command) = parts.next() else {
                continue;
            };
            let args: Vec<&str> = parts.collect();

            match self.dispatch(&mut view, command, &args) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => match e.downcast_ref::<CoreError>() {
                    Some(CoreError::Files(FilesError::StaleSnapshot { .. })) => {
                        writeln!(self.output, "The library changed on disk; here it is again.")?;
                        self.print_rows(&view)?;
                    }
                    Some(core_error) => writeln!(self.output, "Error: {}", core_error)?,
                    None => return Err(e),
                },
            }
        }

        tracing::info!("session closed");
        Ok(())
    }

    /// Runs one command; `Ok(false)` ends the session.
    fn dispatch(
        &mut self,
        view: &mut LibraryView,
        command: &str,
        args: &[&str],
    ) -> anyhow::Result<bool> {
        match command {
            "ls" => {
                view.refresh();
                self.print_rows(view)?;
            }
            "add" => {
                let Some(source) = args.first() else {
                    return Err(CoreError::InvalidInput("usage: add <path> [name]".into()).into());
                };
                let name = args
                    .get(1)
                    .map(|raw| FileName::new(*raw).map_err(FilesError::from))
                    .transpose()
                    .map_err(CoreError::from)?;

                let mut confirm = |existing: &FileName| {
                    let question = format!("{} already exists. Overwrite? [y/N] ", existing);
                    let confirmed = matches!(
                        prompt(&mut self.input, &mut self.output, &question),
                        Ok(Some(answer)) if is_yes(&answer)
                    );
                    OverwriteDecision::from_confirmed(confirmed)
                };
                let outcome = view.import(Path::new(source), name, &mut confirm)?;

                match outcome {
                    AddOutcome::Created => writeln!(self.output, "Added.")?,
                    AddOutcome::Overwritten => writeln!(self.output, "Replaced.")?,
                    AddOutcome::Declined => writeln!(self.output, "Kept the existing file.")?,
                }
                self.print_rows(view)?;
            }
            "rm" => {
                let row = parse_row(args.first())?;
                let name = view.name_at(row)?.clone();
                view.delete_row(row)?;

                if view.inventory().contains(&name) {
                    writeln!(self.output, "{} could not be removed.", name)?;
                } else {
                    writeln!(self.output, "Deleted {}.", name)?;
                }
                self.print_rows(view)?;
            }
            "info" => {
                let metadata = view.describe_row(parse_row(args.first())?)?;

                writeln!(self.output, "name:     {}", metadata.name)?;
                writeln!(self.output, "size:     {} bytes", metadata.size_bytes)?;
                writeln!(
                    self.output,
                    "type:     {}",
                    metadata.media_type.as_deref().unwrap_or("unknown")
                )?;
                writeln!(self.output, "sha256:   {}", metadata.sha256)?;
                match metadata.modified_at {
                    Some(modified) => writeln!(self.output, "modified: {}", modified)?,
                    None => writeln!(self.output, "modified: unknown")?,
                }
            }
            "path" => {
                let path = view.path_at(parse_row(args.first())?)?;
                writeln!(self.output, "{}", path.display())?;
            }
            "sort" => {
                let ascending = self.config.preferences().toggle()?;
                view.set_sort_order(SortOrder::from_ascending(ascending));
                self.print_rows(view)?;
            }
            "passwd" => self.change_password()?,
            "help" => write!(self.output, "{}", HELP)?,
            "quit" | "exit" => return Ok(false),
            other => writeln!(self.output, "Unknown command '{}'. Type 'help'.", other)?,
        }

        Ok(true)
    }

    /// Runs password creation or entry; `Ok(false)` if input ended first.
    fn open_gate(&mut self) -> anyhow::Result<bool> {
        let mut gate = self.config.credential_gate();

        match password::gate_state(&gate)? {
            GateState::NeedsSetup => {
                writeln!(
                    self.output,
                    "Choose a password of at least {} characters.",
                    MIN_PASSWORD_CHARS
                )?;
                let mut setup = PasswordSetup::new();

                loop {
                    let text = if setup.is_awaiting_confirmation() {
                        "Confirm password: "
                    } else {
                        "New password: "
                    };
                    let Some(entry) = self.read_secret(text)? else {
                        return Ok(false);
                    };

                    match setup.submit(&mut gate, &entry) {
                        Ok(SetupStep::ConfirmationRequired) => {}
                        Ok(SetupStep::Created) => {
                            writeln!(self.output, "Password created.")?;
                            return Ok(true);
                        }
                        Err(e @ (CoreError::PasswordTooShort { .. } | CoreError::PasswordMismatch)) => {
                            writeln!(self.output, "{}", e)?;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            GateState::Locked => loop {
                let Some(entry) = self.read_secret("Password: ")? else {
                    return Ok(false);
                };

                match password::unlock(&gate, &entry) {
                    Ok(()) => return Ok(true),
                    Err(e @ (CoreError::PasswordTooShort { .. } | CoreError::WrongPassword)) => {
                        writeln!(self.output, "{}", e)?;
                    }
                    Err(e) => return Err(e.into()),
                }
            },
        }
    }

    fn change_password(&mut self) -> anyhow::Result<()> {
        let Some(new_password) = self.read_secret("New password: ")? else {
            return Ok(());
        };
        let Some(confirm) = self.read_secret("Confirm password: ")? else {
            return Ok(());
        };

        if new_password != confirm {
            return Err(CoreError::PasswordMismatch.into());
        }

        let mut gate = self.config.credential_gate();
        password::change_password(&mut gate, &new_password)?;
        writeln!(self.output, "Password changed.")?;
        Ok(())
    }

    fn print_rows(&mut self, view: &LibraryView) -> io::Result<()> {
        if view.is_empty() {
            return writeln!(self.output, "{}", view.empty_message());
        }

        let noun = if view.len() == 1 { "image" } else { "images" };
        writeln!(self.output, "{} {}, {}", view.len(), noun, view.sort_order())?;
        for (i, row) in view.rows().iter().enumerate() {
            let marker = match row.preview {
                Preview::Available { .. } => ' ',
                Preview::Unavailable => '?',
            };
            writeln!(self.output, "{:>4} {} {}", i + 1, marker, row.display_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picshelf_core::files::DeletePolicy;
    use picshelf_core::CredentialBackend;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn config(temp: &TempDir) -> CoreConfig {
        CoreConfig::new(temp.path().join("data"), DeletePolicy::default())
            .unwrap()
            .with_credential_backend(CredentialBackend::File)
    }

    fn run_script(config: CoreConfig, script: &str) -> String {
        let mut session = Session::new(
            config,
            Cursor::new(script.as_bytes().to_vec()),
            Vec::new(),
        );
        session.run().unwrap();
        String::from_utf8(session.output).unwrap()
    }

    #[test]
    fn test_scripted_passwords_are_not_echoed() {
        let temp = TempDir::new().unwrap();
        let session = Session::new(config(&temp), Cursor::new(Vec::new()), Vec::new());
        assert!(!session.masked_entry);

        let output = run_script(config(&temp), "s3cret\ns3cret\nquit\n");

        assert!(output.contains("Password created."));
        assert!(!output.contains("s3cret"));
    }

    #[test]
    fn test_first_run_creates_password() {
        let temp = TempDir::new().unwrap();

        let output = run_script(config(&temp), "abcd\nabcd\nquit\n");

        assert!(output.contains("Password created."));
        assert!(output.contains("No files yet"));
        assert!(config(&temp).credential_gate().verify("abcd").unwrap());
    }

    #[test]
    fn test_setup_mismatch_starts_over() {
        let temp = TempDir::new().unwrap();

        let output = run_script(config(&temp), "abcd\nabce\nwxyz\nwxyz\nquit\n");

        assert!(output.contains("passwords do not match"));
        assert!(config(&temp).credential_gate().verify("wxyz").unwrap());
        assert!(!config(&temp).credential_gate().verify("abcd").unwrap());
    }

    #[test]
    fn test_wrong_password_is_retried() {
        let temp = TempDir::new().unwrap();
        config(&temp).ensure_dirs().unwrap();
        config(&temp)
            .credential_gate()
            .set_credential("right-pass")
            .unwrap();

        let output = run_script(config(&temp), "wrong-pass\nright-pass\nls\nquit\n");

        assert!(output.contains("incorrect password"));
        assert!(output.contains("No files yet"));
    }

    #[test]
    fn test_end_of_input_at_gate_exits_cleanly() {
        let temp = TempDir::new().unwrap();

        let output = run_script(config(&temp), "");

        assert!(output.contains("New password: "));
        assert!(!config(&temp).credential_gate().has_credential().unwrap());
    }

    #[test]
    fn test_add_then_delete() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("photo.png");
        fs::write(&source, PNG_HEADER).unwrap();

        let script = format!("abcd\nabcd\nadd {}\nrm 1\nquit\n", source.display());
        let output = run_script(config(&temp), &script);

        assert!(output.contains("Added."));
        assert!(output.contains("1 image, A-Z"));
        assert!(output.contains("Deleted photo.png."));
        assert!(!config(&temp).library_dir().join("photo.png").exists());
    }

    #[test]
    fn test_add_conflict_declined_keeps_file() {
        let temp = TempDir::new().unwrap();
        let cfg = config(&temp);
        cfg.ensure_dirs().unwrap();
        fs::write(cfg.library_dir().join("photo.png"), b"original").unwrap();
        let source = temp.path().join("photo.png");
        fs::write(&source, PNG_HEADER).unwrap();

        let script = format!("abcd\nabcd\nadd {}\nn\nquit\n", source.display());
        let output = run_script(config(&temp), &script);

        assert!(output.contains("photo.png already exists. Overwrite? [y/N] "));
        assert!(output.contains("Kept the existing file."));
        assert_eq!(
            fs::read(cfg.library_dir().join("photo.png")).unwrap(),
            b"original"
        );
    }

    #[test]
    fn test_sort_toggles_preference() {
        let temp = TempDir::new().unwrap();

        run_script(config(&temp), "abcd\nabcd\nsort\nquit\n");

        assert_eq!(
            config(&temp).preferences().sort_order(),
            SortOrder::Descending
        );
    }

    #[test]
    fn test_bad_row_reports_error_and_continues() {
        let temp = TempDir::new().unwrap();

        let output = run_script(config(&temp), "abcd\nabcd\nrm 9\nrm x\nhelp\nquit\n");

        assert_eq!(output.matches("Error:").count(), 2);
        assert!(output.contains("Commands:"));
    }

    #[test]
    fn test_passwd_changes_password() {
        let temp = TempDir::new().unwrap();

        let output = run_script(
            config(&temp),
            "abcd\nabcd\npasswd\nabcd\nabcd\npasswd\nefgh\nefgh\nquit\n",
        );

        assert!(output.contains("new password must differ"));
        assert!(output.contains("Password changed."));
        assert!(config(&temp).credential_gate().verify("efgh").unwrap());
    }

    #[test]
    fn test_parse_row_is_one_based() {
        assert_eq!(parse_row(Some(&"1")).unwrap(), 0);
        assert!(parse_row(Some(&"0")).is_err());
        assert!(parse_row(None).is_err());
    }
}
