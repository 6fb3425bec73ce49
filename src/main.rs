//! overlaygen CLI
//!
//! Entry point for the `overlaygen` command-line tool: a presentation layer
//! over the core's read-only queries plus the edit store. No merge, coercion
//! or rendering logic lives here.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use overlaygen::edit::LedField;
use overlaygen::{address, view, Catalogue, EditState, FileLoader, LoaderConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "overlaygen")]
#[command(about = "Device tree overlay composer", version)]
struct Cli {
    /// Directory holding devices.json, boards.json and bindings.json
    #[arg(long, short = 'd', default_value = "data", global = true)]
    data: PathBuf,

    /// TOML config naming the three source documents (overrides --data)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List board identifiers
    Boards {
        /// Only boards whose id starts with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show a board's model, base device and preselected interfaces
    BoardInfo {
        /// Board identifier
        board: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List peripheral instances of the merged view for a board
    Peripherals {
        /// Board identifier
        #[arg(long, short = 'b')]
        board: String,

        /// Device identifier (default: the board's base device)
        #[arg(long)]
        device: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the LED table of a board
    Leds {
        /// Board identifier
        #[arg(long, short = 'b')]
        board: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the editable properties of one peripheral instance
    Props {
        /// Board identifier
        #[arg(long, short = 'b')]
        board: String,

        /// Device identifier (default: the board's base device)
        #[arg(long)]
        device: Option<String>,

        /// Peripheral instance reference, e.g. uart:0
        #[arg(long, short = 'p')]
        peripheral: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Apply edits and print the generated overlay
    Render {
        /// Board identifier
        #[arg(long, short = 'b')]
        board: String,

        /// Device identifier (default: the board's base device)
        #[arg(long)]
        device: Option<String>,

        /// Property edit as <peripheral>.<property>=<value>, e.g. uart0.current-speed=9600
        #[arg(long, short = 's', value_name = "EDIT")]
        set: Vec<String>,

        /// LED edit as <led>.<port|pin>=<value>, e.g. led0.pin=13
        #[arg(long, short = 'l', value_name = "EDIT")]
        led: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match LoaderConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => fail(&e.to_string()),
        },
        None => LoaderConfig::from_dir(&cli.data),
    };

    let report = FileLoader::new(config).load_all();
    for failure in &report.failures {
        eprintln!("error: {failure}");
    }
    if !report.catalogue.is_ready() {
        process::exit(1);
    }
    let catalogue = report.catalogue;

    match cli.command {
        Commands::Boards { prefix, json } => run_boards(&catalogue, prefix.as_deref(), json),
        Commands::BoardInfo { board, json } => run_board_info(&catalogue, &board, json),
        Commands::Peripherals {
            board,
            device,
            json,
        } => run_peripherals(&catalogue, &board, device.as_deref(), json),
        Commands::Leds { board, json } => run_leds(&catalogue, &board, json),
        Commands::Props {
            board,
            device,
            peripheral,
            json,
        } => run_props(&catalogue, &board, device.as_deref(), &peripheral, json),
        Commands::Render {
            board,
            device,
            set,
            led,
        } => run_render(&catalogue, &board, device.as_deref(), &set, &led),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    process::exit(1)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(&e.to_string()),
    }
}

/// Resolve the device a command works against: an explicit `--device` wins,
/// else the board's base device.
fn resolve_device(catalogue: &Catalogue, board_id: &str, device: Option<&str>) -> String {
    match device {
        Some(id) => id.to_string(),
        None => match catalogue.board_device_of(board_id) {
            Ok(id) => id.to_string(),
            Err(e) => fail(&e.to_string()),
        },
    }
}

fn run_boards(catalogue: &Catalogue, prefix: Option<&str>, json: bool) {
    let boards = view::board_list(catalogue, prefix);
    if json {
        print_json(&boards);
    } else {
        for board in boards {
            println!("{board}");
        }
    }
}

fn run_board_info(catalogue: &Catalogue, board_id: &str, json: bool) {
    let summary = match view::board_summary(catalogue, board_id) {
        Ok(summary) => summary,
        Err(e) => fail(&e.to_string()),
    };
    let preselected = match view::board_preselected(catalogue, &summary.device, board_id) {
        Ok(list) => list,
        Err(e) => fail(&e.to_string()),
    };

    if json {
        print_json(&serde_json::json!({
            "board": summary,
            "interfaces": preselected,
        }));
    } else {
        println!("board:      {}", summary.id);
        println!("model:      {}", summary.model);
        println!("device:     {}", summary.device);
        println!("interfaces: {}", preselected.join(" "));
    }
}

fn run_peripherals(catalogue: &Catalogue, board_id: &str, device: Option<&str>, json: bool) {
    let device_id = resolve_device(catalogue, board_id, device);
    match view::peripheral_instances(catalogue, &device_id, Some(board_id)) {
        Ok(instances) if json => print_json(&instances),
        Ok(instances) => {
            for instance in instances {
                println!("{instance}");
            }
        }
        Err(e) => fail(&e.to_string()),
    }
}

fn run_leds(catalogue: &Catalogue, board_id: &str, json: bool) {
    match view::led_table(catalogue, board_id) {
        Ok(rows) if json => print_json(&rows),
        Ok(rows) => {
            for row in rows {
                println!("{}\t{}\t{}", row.id, row.port, row.pin);
            }
        }
        Err(e) => fail(&e.to_string()),
    }
}

fn run_props(
    catalogue: &Catalogue,
    board_id: &str,
    device: Option<&str>,
    peripheral: &str,
    json: bool,
) {
    let device_id = resolve_device(catalogue, board_id, device);
    let address = address::parse(peripheral);
    let edits = EditState::new();
    match view::property_rows(catalogue, &edits, &device_id, Some(board_id), &address) {
        Ok(rows) if json => print_json(&rows),
        Ok(rows) => {
            for row in rows {
                let ty = row
                    .ty
                    .map(|t| format!("{t:?}").to_lowercase())
                    .unwrap_or_else(|| "untyped".to_string());
                println!("{}\t{}\t{}", row.name, ty, row.current);
            }
        }
        Err(e) => fail(&e.to_string()),
    }
}

fn run_render(
    catalogue: &Catalogue,
    board_id: &str,
    device: Option<&str>,
    set: &[String],
    led: &[String],
) {
    let device_id = resolve_device(catalogue, board_id, device);
    let mut edits = EditState::new();

    for edit in set {
        let (target, value) = split_edit(edit);
        let (peripheral, property) = split_target(edit, target);
        let address = address::parse(peripheral);
        if let Err(e) = edits.store(catalogue, &device_id, &address, property, value) {
            fail(&e.to_string());
        }
    }

    for edit in led {
        let (target, value) = split_edit(edit);
        let (led_id, field) = split_target(edit, target);
        let field = match field {
            "port" => LedField::Port,
            "pin" => LedField::Pin,
            other => fail(&format!(
                "unknown LED field {other:?} in {edit:?} (use port or pin)"
            )),
        };
        if let Err(e) = edits.store_led(catalogue, board_id, led_id, field, value) {
            fail(&e.to_string());
        }
    }

    print!("{}", overlaygen::render(&edits));
}

/// Split `<target>=<value>`.
fn split_edit(edit: &str) -> (&str, &str) {
    match edit.split_once('=') {
        Some(pair) => pair,
        None => fail(&format!(
            "malformed edit {edit:?} (expected <target>=<value>)"
        )),
    }
}

/// Split `<name>.<field>` off an edit target.
fn split_target<'a>(edit: &str, target: &'a str) -> (&'a str, &'a str) {
    match target.rsplit_once('.') {
        Some(pair) => pair,
        None => fail(&format!(
            "malformed edit {edit:?} (expected <name>.<field>=<value>)"
        )),
    }
}
