
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use umlboard::clipboard::{ClipboardEvent, TEXT_PLAIN};
use umlboard::codec::{self, CodecError};
use umlboard::config::{ConfigError, EditorConfig};
use umlboard::doc::{CellId, CellKind, Document, Point};
use umlboard::graph::CellPatch;
use umlboard::notify::LogNotifier;
use umlboard::panel::{CellView, PanelBinding, PanelDescriptor, PanelHost, ViewCapability};
use umlboard::{Editor, EditorError, LoadOptions, Toolbox, logging};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "umlboard", about = "Encode, decode, and edit UML diagrams headlessly")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a JSON document (file or stdin) into a transport string.
    Encode {
        /// JSON file; reads stdin when omitted or `-`.
        path: Option<PathBuf>,
    },
    /// Decode a transport string (argument or stdin) into JSON.
    Decode {
        /// Encoded diagram; reads stdin when omitted or `-`.
        input: Option<String>,
        /// Print one line per cell instead of JSON.
        #[arg(long)]
        summary: bool,
    },
    /// List the toolbox element types.
    Palette,
    /// Create a document holding one new element per type and print it encoded.
    New {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Drive an editor session from stdin commands, printing change events as JSON lines.
    Session,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    logging::init("info");

    let cli = Cli::parse();
    match cli.command {
        Command::Encode { path } => run_encode(path),
        Command::Decode { input, summary } => run_decode(input, summary),
        Command::Palette => {
            for cell_type in Toolbox::uml().types() {
                println!("{cell_type}");
            }
            Ok(())
        }
        Command::New { types } => run_new(&types),
        Command::Session => run_session().await,
    }
}

fn read_input(arg: Option<&str>) -> Result<String, CliError> {
    match arg {
        Some(path) if path != "-" => {
            fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| CliError::Read { path: "<stdin>".to_owned(), source })?;
            Ok(buf)
        }
    }
}

fn run_encode(path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.map(|p| p.to_string_lossy().into_owned());
    let json = read_input(path.as_deref())?;
    let doc = codec::parse_json(&json)?;
    println!("{}", codec::encode(&doc));
    Ok(())
}

fn run_decode(input: Option<String>, summary: bool) -> Result<(), CliError> {
    let encoded = match input {
        Some(value) if value != "-" => value,
        _ => read_input(None)?,
    };
    let doc = codec::decode(&encoded)?;
    if summary {
        print_summary(&doc);
    } else {
        println!("{}", codec::to_json_pretty(&doc)?);
    }
    Ok(())
}

fn print_summary(doc: &Document) {
    for cell in &doc.cells {
        match cell.kind() {
            CellKind::Element => {
                let p = cell.position.unwrap_or_default();
                println!("{}  {}  {:?}  at ({}, {})", cell.id, cell.cell_type, cell.name(), p.x, p.y);
            }
            CellKind::Link => {
                let ends: Vec<String> = cell.attached_ids().map(|id| id.to_string()).collect();
                println!("{}  {}  {}", cell.id, cell.cell_type, ends.join(" -> "));
            }
        }
    }
}

fn run_new(types: &[String]) -> Result<(), CliError> {
    let config = EditorConfig::from_env()?;
    let toolbox = Toolbox::uml();
    let mut rng = rand::rng();
    let cells = types
        .iter()
        .map(|t| toolbox.instantiate(t, config.position_bounds, &mut rng))
        .collect::<Result<Vec<_>, _>>()
        .map_err(EditorError::from)?;
    println!("{}", codec::encode(&Document::new(cells)));
    Ok(())
}

/// Panel host that only logs; the session has no UI.
struct LogPanels;

impl PanelHost for LogPanels {
    fn show(&mut self, container: &str, descriptor: &PanelDescriptor, binding: PanelBinding) {
        let cell = match &binding {
            PanelBinding::Link { model } | PanelBinding::Node { model, .. } => model.id,
        };
        info!(container, panel = descriptor.name(), %cell, "panel shown");
    }

    fn hide(&mut self) {
        info!("panel hidden");
    }
}

async fn run_session() -> Result<(), CliError> {
    let config = EditorConfig::from_env()?;
    let debounce = config.debounce;
    let mut editor = Editor::new(config, Toolbox::uml(), Box::new(LogPanels), Box::new(LogNotifier));

    let (tx, mut rx) = mpsc::channel(16);
    editor.init(tx);
    editor.attach_surface();

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "failed to serialize change event"),
            }
        }
    });

    drive_session(&mut editor, BufReader::new(tokio::io::stdin())).await;

    // Let the last edit burst settle before tearing down.
    tokio::time::sleep(debounce + Duration::from_millis(50)).await;
    editor.destroy();
    if let Err(e) = printer.await {
        warn!(error = %e, "event printer task failed");
    }
    Ok(())
}

/// How a session's input ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Eof,
    ReadError,
}

/// Run line commands from `input` until it ends or fails to read.
async fn drive_session<R: AsyncBufRead + Unpin>(editor: &mut Editor, input: R) -> SessionEnd {
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return SessionEnd::Eof,
            Err(e) => {
                warn!(error = %e, "failed to read session input; ending session");
                return SessionEnd::ReadError;
            }
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if let Err(e) = run_session_command(editor, &words) {
            warn!(error = %e, command = line.trim(), "command failed");
        }
    }
}

fn run_session_command(editor: &mut Editor, words: &[&str]) -> Result<(), CliError> {
    match words {
        [] => {}
        ["add", cell_type] => {
            let id = editor.add_from_toolbox(cell_type)?;
            println!("{id}");
        }
        ["move", id, x, y] => {
            let (Some(id), Ok(x), Ok(y)) = (parse_id(id), x.parse::<f64>(), y.parse::<f64>()) else {
                warn!("usage: move <cell-id> <x> <y>");
                return Ok(());
            };
            if let Some(graph) = editor.graph_mut() {
                graph
                    .change_cell(id, &CellPatch::moved_to(Point::new(x, y)))
                    .map_err(EditorError::from)?;
            }
        }
        ["remove", id] => {
            if let (Some(id), Some(graph)) = (parse_id(id), editor.graph_mut()) {
                graph.remove_cell(id);
            }
        }
        ["dblclick", id] => {
            if let Some(view) = parse_id(id).and_then(|id| view_for(editor, id)) {
                editor.on_cell_double_click(&view);
            }
        }
        ["load", encoded] => {
            editor.load(Some(*encoded), LoadOptions::default());
        }
        ["paste", encoded] => {
            editor.paste_from_clipboard(&mut ClipboardEvent::with_text(*encoded));
        }
        ["copy"] => {
            let mut event = ClipboardEvent::new();
            editor.copy_to_clipboard(&mut event);
            println!("{}", event.get_data(TEXT_PLAIN).unwrap_or_default());
        }
        ["reset"] => {
            editor.reset();
        }
        ["show"] => print_summary(&editor.value()),
        _ => warn!(command = %words.join(" "), "unknown command"),
    }
    Ok(())
}

fn parse_id(raw: &str) -> Option<CellId> {
    match raw.parse::<uuid::Uuid>() {
        Ok(uuid) => Some(CellId::from(uuid)),
        Err(e) => {
            warn!(id = raw, error = %e, "not a cell id");
            None
        }
    }
}

fn view_for(editor: &Editor, id: CellId) -> Option<CellView> {
    let cell = editor.graph()?.cell(id)?;
    let capability = match (cell.kind(), cell.cell_type.as_str()) {
        (CellKind::Link, _) => ViewCapability::Connector,
        (CellKind::Element, "uml.Class" | "uml.Abstract" | "uml.Interface") => {
            ViewCapability::NodeWithPanel(PanelDescriptor::new("class-properties"))
        }
        (CellKind::Element, "uml.State") => ViewCapability::NodeWithPanel(PanelDescriptor::new("state-properties")),
        (CellKind::Element, _) => ViewCapability::PlainNode,
    };
    Some(CellView::new(id, capability))
}
