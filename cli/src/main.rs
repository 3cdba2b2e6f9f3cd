// cellgraph-cli/src/main.rs
// Interactive shell for the cellgraph spreadsheet engine.

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use cellgraph_core::{new_sheet, Position, Sheet};

#[derive(Parser)]
#[command(name = "cellgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run a single command and exit instead of starting the shell
    #[arg(short, long)]
    command: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut sheet = new_sheet();

    if let Some(line) = cli.command {
        run_line(&mut sheet, &line);
        return;
    }

    println!("cellgraph shell. Type 'help' for commands, 'quit' to exit.");
    let mut rl = DefaultEditor::new().expect("failed to initialize line editor");
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                if line.trim() == "quit" || line.trim() == "exit" {
                    break;
                }
                run_line(&mut sheet, &line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("readline error: {err}");
                break;
            }
        }
    }
}

fn run_line(sheet: &mut Sheet, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let mut parts = line.splitn(3, ' ');
    let verb = parts.next().unwrap_or_default();

    match verb {
        "help" => print_help(),
        "set" => {
            let (Some(addr), Some(text)) = (parts.next(), parts.next()) else {
                eprintln!("usage: set <position> <text>");
                return;
            };
            match parse_position(addr) {
                Some(pos) => match sheet.set_cell(pos, text) {
                    Ok(()) => {}
                    Err(e) => eprintln!("error: {e}"),
                },
                None => eprintln!("error: invalid position {addr:?}"),
            }
        }
        "get" => {
            let Some(addr) = parts.next() else {
                eprintln!("usage: get <position>");
                return;
            };
            match parse_position(addr) {
                Some(pos) => match sheet.get_value(pos) {
                    Ok(v) => println!("{v}"),
                    Err(e) => eprintln!("error: {e}"),
                },
                None => eprintln!("error: invalid position {addr:?}"),
            }
        }
        "clear" => {
            let Some(addr) = parts.next() else {
                eprintln!("usage: clear <position>");
                return;
            };
            match parse_position(addr) {
                Some(pos) => {
                    if let Err(e) = sheet.clear_cell(pos) {
                        eprintln!("error: {e}");
                    }
                }
                None => eprintln!("error: invalid position {addr:?}"),
            }
        }
        "print" => print!("{}", sheet.print_values()),
        "text" => print!("{}", sheet.print_texts()),
        other => eprintln!("unknown command: {other:?} (try 'help')"),
    }
}

fn parse_position(addr: &str) -> Option<Position> {
    Position::from_a1(addr)
}

fn print_help() {
    println!("commands:");
    println!("  set <pos> <text>   set a cell's content, e.g. set A1 =B1+1");
    println!("  get <pos>          print a cell's evaluated value");
    println!("  clear <pos>        clear a cell");
    println!("  print              print the whole sheet's values");
    println!("  text               print the whole sheet's raw text");
    println!("  quit               exit the shell");
}
