use anyhow::{anyhow, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use retro_messenger::emoticons::{self, render_plain};
use retro_messenger::models::ContactStatus;
use retro_messenger::utils::{parse_level, setup_logging};
use retro_messenger::{Config, FileStore, Messenger, MessengerEvent};

/// Command line arguments for the messenger simulator
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A mid-2000s instant messenger, simulated in the terminal.",
    long_about = "Drives one simulated messenger session: a mock roster whose presence drifts on its own, \
    chat windows, emoticons and contacts that type back.\n\n\
    Demo account: usuario@hotmail.com / 123456"
)]
struct Args {
    /// Config file (JSON). Defaults to the user config directory.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for stored session state
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "warn")]
    log_level: String,
}

const HELP: &str = "\
Commands:
  login <email> <password>     sign in (demo: usuario@hotmail.com 123456)
  logout                       sign out and forget the session
  contacts                     list contacts by presence
  open <contact>               open a chat window
  close|min|restore <contact>  manage a contact's window
  say <contact> <text>         send a message
  nudge <contact>              send a nudge
  status <status>              set your own status
  emoticons                    list emoticon shortcuts
  quit                         exit, keeping the session for next time";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = parse_level(&args.log_level).ok_or_else(|| anyhow!("Unknown log level {}", args.log_level))?;
    let log_file = args.log_file.as_ref().and_then(|p| p.to_str());
    setup_logging(log_file, level)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    let store = FileStore::new(config.storage_dir()?)?;
    info!("Session store at {}", store.dir().display());

    let (mut messenger, mut events) = Messenger::with_defaults(config, Arc::new(store));

    if let Some(user) = messenger.resume() {
        println!("Sesión restaurada: {} <{}>", user.display_name, user.email);
    } else {
        println!("Inicia sesión con: login usuario@hotmail.com 123456");
    }
    println!("Escribe 'help' para ver los comandos.");
    print_events(&messenger, &mut events);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Some(line?),
            _ = messenger.step() => None,
        };

        let line = match input {
            Some(Some(line)) => line,
            Some(None) => break,
            None => {
                print_events(&messenger, &mut events);
                continue;
            }
        };
        match run_command(&mut messenger, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!("{}", e);
                println!("Error: {}", e);
            }
        }
        print_events(&messenger, &mut events);
    }

    messenger.shutdown();
    Ok(())
}

/// Runs one command line. Returns false on quit.
async fn run_command(messenger: &mut Messenger, line: &str) -> Result<bool> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(false),
        "login" => {
            let (email, password) = rest.split_once(' ').unwrap_or((rest, ""));
            match messenger.login(email.trim(), password.trim()).await {
                Ok(user) => println!("Conectado como {} ({})", user.display_name, user.status.label()),
                Err(e) => println!("{}", e),
            }
        }
        "logout" => {
            if messenger.logout() {
                println!("Sesión cerrada");
            }
        }
        "contacts" => print_contacts(messenger),
        "emoticons" => {
            for e in emoticons::catalog::all() {
                println!("  {:<8} {} {}", e.shortcut, e.glyph, e.description);
            }
        }
        "status" => {
            let status = ContactStatus::parse(rest).ok_or_else(|| anyhow!("Estado desconocido: {}", rest))?;
            if messenger.set_user_status(status) {
                println!("Tu estado: {}", status.label());
            }
        }
        "open" => {
            require_session(messenger)?;
            messenger
                .open_chat_window(rest)
                .ok_or_else(|| anyhow!("Contacto desconocido: {}", rest))?;
        }
        "close" | "min" | "restore" => {
            let window_id = messenger
                .window_for_contact(rest)
                .map(|w| w.id.clone())
                .ok_or_else(|| anyhow!("No hay ventana abierta con {}", rest))?;
            match command {
                "close" => messenger.close_chat_window(&window_id),
                "min" => messenger.minimize_window(&window_id),
                _ => messenger.restore_window(&window_id),
            };
        }
        "say" => {
            let (contact, text) = rest.split_once(' ').unwrap_or((rest, ""));
            let window_id = window_of(messenger, contact)?;
            if messenger.send_message(&window_id, text).is_none() {
                println!("No se pudo enviar el mensaje");
            }
        }
        "nudge" => {
            let window_id = window_of(messenger, rest)?;
            messenger.send_nudge(&window_id);
        }
        other => println!("Comando desconocido: {} (escribe 'help')", other),
    }
    Ok(true)
}

fn require_session(messenger: &Messenger) -> Result<()> {
    if messenger.is_active() {
        Ok(())
    } else {
        Err(anyhow!("Primero inicia sesión"))
    }
}

/// Window for a contact, opening one if needed.
fn window_of(messenger: &mut Messenger, contact_id: &str) -> Result<String> {
    require_session(messenger)?;
    if let Some(window) = messenger.window_for_contact(contact_id) {
        return Ok(window.id.clone());
    }
    messenger
        .open_chat_window(contact_id)
        .ok_or_else(|| anyhow!("Contacto desconocido: {}", contact_id))
}

fn print_contacts(messenger: &Messenger) {
    let roster = messenger.roster();
    println!("Contactos ({}/{} conectados)", roster.online_count(), roster.len());
    for contact in roster.sorted_contacts() {
        let typing = if messenger.is_typing(&contact.id) { " (escribiendo...)" } else { "" };
        println!(
            "  {} {:<12} {:<24} {}{}",
            contact.status.icon(),
            contact.id,
            contact.shown_name(),
            contact.personal_message,
            typing
        );
    }
}

fn print_events(messenger: &Messenger, events: &mut UnboundedReceiver<MessengerEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            MessengerEvent::MessageAppended { message, .. } | MessengerEvent::MessageReceived { message, .. } => {
                let sender = if message.sender_id == retro_messenger::CURRENT_USER_ID {
                    "Tú".to_string()
                } else {
                    name_of(messenger, &message.sender_id)
                };
                println!(
                    "[{}] {}: {}",
                    message.timestamp.with_timezone(&chrono::Local).format("%H:%M"),
                    sender,
                    render_plain(&message.content)
                );
            }
            MessengerEvent::TypingChanged { contact_id, typing: true } => {
                println!("{} está escribiendo...", name_of(messenger, &contact_id));
            }
            MessengerEvent::PresenceChanged { contact_id, to, .. } => {
                println!("{} ahora está {}", name_of(messenger, &contact_id), to.label());
            }
            MessengerEvent::SessionStarted => {
                println!("{} contactos en tu lista", messenger.roster().len());
            }
            MessengerEvent::TypingChanged { .. }
            | MessengerEvent::SessionEnded
            | MessengerEvent::WindowsChanged => {}
        }
    }
}

fn name_of(messenger: &Messenger, contact_id: &str) -> String {
    messenger
        .contact(contact_id)
        .map(|c| c.shown_name().to_string())
        .unwrap_or_else(|| contact_id.to_string())
}
