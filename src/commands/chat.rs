//! Interactive chat command
//!
//! Runs the rustyline read loop: plain lines go to the provider as
//! prompts, lines starting with `/` are handled locally as slash
//! commands. Responses render incrementally as fragments arrive.

use crate::auth::prompt_login;
use crate::commands::sessions::open_store;
use crate::config::Config;
use crate::controller::ChatController;
use crate::error::Result;
use crate::providers::create_provider;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::Path;

/// Slash commands accepted inside the chat loop
#[derive(Debug, PartialEq)]
enum SlashCommand {
    New,
    Sessions,
    Switch(String),
    Delete,
    Private,
    Attach(String),
    Models,
    Help,
    Quit,
    Unknown(String),
}

/// Parse a line beginning with `/` into a slash command
fn parse_command(line: &str) -> SlashCommand {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).unwrap_or("");

    match command {
        "/new" => SlashCommand::New,
        "/sessions" => SlashCommand::Sessions,
        "/switch" => SlashCommand::Switch(arg.to_string()),
        "/delete" => SlashCommand::Delete,
        "/private" => SlashCommand::Private,
        "/attach" => SlashCommand::Attach(arg.to_string()),
        "/models" => SlashCommand::Models,
        "/help" => SlashCommand::Help,
        "/quit" | "/exit" => SlashCommand::Quit,
        other => SlashCommand::Unknown(other.to_string()),
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /new             Start a new session");
    println!("  /sessions        List saved sessions");
    println!("  /switch <name>   Switch to a saved session");
    println!("  /delete          Delete the current session");
    println!("  /private         Toggle private mode (nothing written to disk)");
    println!("  /attach <path>   Attach an image to the conversation");
    println!("  /models          List available models");
    println!("  /help            Show this help");
    println!("  /quit            Exit");
}

/// Run the interactive chat loop
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `private` - Start in private mode
///
/// # Errors
///
/// Returns error if login fails, the provider cannot be created, or the
/// terminal cannot be read
pub async fn run_chat(config: &Config, private: bool) -> Result<()> {
    prompt_login(config)?;

    let store = open_store(config)?;
    let mut controller = ChatController::new(store, private);
    let provider = create_provider(&config.provider)?;

    let session = controller.create_session()?;
    println!(
        "{} model={} session={}{}",
        "polychat".bold().cyan(),
        provider.current_model(),
        session,
        if controller.is_private() {
            " (private)".yellow().to_string()
        } else {
            String::new()
        }
    );
    println!("Type a message, or /help for commands.\n");

    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        if line.starts_with('/') {
            match parse_command(line) {
                SlashCommand::New => {
                    let name = controller.create_session()?;
                    println!("{} {}", "Started session:".green(), name);
                }
                SlashCommand::Sessions => {
                    let names = open_store(config)?.list()?;
                    if names.is_empty() {
                        println!("No saved sessions.");
                    } else {
                        for name in names {
                            if controller.current_session() == Some(name.as_str()) {
                                println!("  {} {}", name.green(), "(current)".dimmed());
                            } else {
                                println!("  {}", name);
                            }
                        }
                    }
                }
                SlashCommand::Switch(name) => {
                    if name.is_empty() {
                        println!("{}", "Usage: /switch <name>".yellow());
                    } else {
                        match controller.switch_session(&name) {
                            Ok(()) => println!("{} {}", "Switched to:".green(), name),
                            Err(e) => println!("{} {}", "Could not switch:".red(), e),
                        }
                    }
                }
                SlashCommand::Delete => match controller.delete_session() {
                    Ok(name) => println!("{} {}", "Deleted session:".green(), name),
                    Err(e) => println!("{} {}", "Could not delete:".red(), e),
                },
                SlashCommand::Private => {
                    let name = controller.toggle_private_mode()?;
                    if controller.is_private() {
                        println!(
                            "{} new session {} will not be saved",
                            "Private mode on:".yellow(),
                            name
                        );
                    } else {
                        println!("{} new session {}", "Private mode off:".green(), name);
                    }
                }
                SlashCommand::Attach(path) => {
                    if path.is_empty() {
                        println!("{}", "Usage: /attach <path>".yellow());
                    } else {
                        attach_file(&mut controller, &path);
                    }
                }
                SlashCommand::Models => {
                    crate::commands::models::run_models(config, None).await?;
                }
                SlashCommand::Help => print_help(),
                SlashCommand::Quit => break,
                SlashCommand::Unknown(cmd) => {
                    println!("{} {} (try /help)", "Unknown command:".yellow(), cmd);
                }
            }
            continue;
        }

        print!("{} ", "assistant:".bold().blue());
        let result = controller
            .send_prompt(provider.as_ref(), line, |delta| {
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            })
            .await;
        println!();

        if let Err(e) = result {
            println!("{} {}", "Error:".red(), e);
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Read a file from disk and attach it to the conversation
fn attach_file(controller: &mut ChatController, path: &str) {
    let filename = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string();

    match std::fs::read(path) {
        Ok(bytes) => match controller.attach_image(&filename, bytes) {
            Ok(()) => println!("{} {}", "Attached:".green(), filename),
            Err(e) => println!("{} {}", "Could not attach:".red(), e),
        },
        Err(e) => println!("{} {}: {}", "Could not read".red(), path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("/new"), SlashCommand::New);
        assert_eq!(parse_command("/sessions"), SlashCommand::Sessions);
        assert_eq!(parse_command("/delete"), SlashCommand::Delete);
        assert_eq!(parse_command("/private"), SlashCommand::Private);
        assert_eq!(parse_command("/models"), SlashCommand::Models);
        assert_eq!(parse_command("/help"), SlashCommand::Help);
        assert_eq!(parse_command("/quit"), SlashCommand::Quit);
        assert_eq!(parse_command("/exit"), SlashCommand::Quit);
    }

    #[test]
    fn test_parse_commands_with_arguments() {
        assert_eq!(
            parse_command("/switch session_20240101_120000"),
            SlashCommand::Switch("session_20240101_120000".to_string())
        );
        assert_eq!(
            parse_command("/attach /tmp/cat.png"),
            SlashCommand::Attach("/tmp/cat.png".to_string())
        );
    }

    #[test]
    fn test_parse_missing_argument_is_empty() {
        assert_eq!(parse_command("/switch"), SlashCommand::Switch(String::new()));
        assert_eq!(parse_command("/attach  "), SlashCommand::Attach(String::new()));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse_command("/frobnicate"),
            SlashCommand::Unknown("/frobnicate".to_string())
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(parse_command("  /new  "), SlashCommand::New);
        assert_eq!(
            parse_command("/switch   padded  "),
            SlashCommand::Switch("padded".to_string())
        );
    }
}
