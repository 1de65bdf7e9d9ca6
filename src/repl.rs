//! The interactive shell: one command per line against a single sheet.

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use tabula_core::{CellRef, ExportFormat, ExportOptions, ImportOptions, Sheet};

const HELP: &str = "\
Commands:
  set <CELL> <value>         Write a value or =formula into a cell
  get <CELL>                 Print a cell's display value
  del <CELL>                 Clear a cell
  show                       Render the populated grid
  undo / redo                Step through edit history
  import <FILE>              Load a CSV file into the sheet
  export csv|json [formulas] [FILE]
                             Export (to stdout without FILE)
  help                       This text
  quit                       Exit";

/// What a command produced: text to print, nothing, or a quit request.
pub enum Reply {
    Text(String),
    Empty,
    Quit,
}

pub fn run(sheet: &mut Sheet) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match execute(sheet, &line) {
            Ok(Reply::Quit) => break,
            Ok(Reply::Text(text)) => writeln!(stdout, "{}", text)?,
            Ok(Reply::Empty) => {}
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}

pub fn execute(sheet: &mut Sheet, line: &str) -> Result<Reply> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Reply::Empty);
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "q" | "quit" | "exit" => Ok(Reply::Quit),
        "help" => Ok(Reply::Text(HELP.to_string())),
        "set" => {
            let (id, value) = rest
                .split_once(char::is_whitespace)
                .context("usage: set <CELL> <value>")?;
            let value = value.trim();
            sheet.set_cell(id, value)?;
            Ok(Reply::Text(format!("{} = {}", id, sheet.get_display_value(id))))
        }
        "get" => {
            if rest.is_empty() {
                bail!("usage: get <CELL>");
            }
            Ok(Reply::Text(sheet.get_display_value(rest)))
        }
        "del" => {
            if rest.is_empty() {
                bail!("usage: del <CELL>");
            }
            sheet.delete_cell(rest)?;
            Ok(Reply::Empty)
        }
        "show" => Ok(Reply::Text(render_grid(sheet))),
        "undo" => {
            sheet.undo()?;
            Ok(Reply::Text("undone".to_string()))
        }
        "redo" => {
            sheet.redo()?;
            Ok(Reply::Text("redone".to_string()))
        }
        "import" => {
            if rest.is_empty() {
                bail!("usage: import <FILE>");
            }
            let text =
                fs::read_to_string(rest).with_context(|| format!("cannot read {}", rest))?;
            sheet.import_plain_text(&text, &ImportOptions::default())?;
            Ok(Reply::Text(format!("imported {}", rest)))
        }
        "export" => export_command(sheet, rest),
        _ => bail!("unknown command: {} (try 'help')", command),
    }
}

fn export_command(sheet: &mut Sheet, rest: &str) -> Result<Reply> {
    let mut words = rest.split_whitespace();
    let format = match words.next() {
        Some("csv") => ExportFormat::Csv,
        Some("json") => ExportFormat::Json,
        _ => bail!("usage: export csv|json [formulas] [FILE]"),
    };

    let mut include_formulas = false;
    let mut file: Option<&str> = None;
    for word in words {
        if word == "formulas" {
            include_formulas = true;
        } else if file.is_none() {
            file = Some(word);
        } else {
            bail!("usage: export csv|json [formulas] [FILE]");
        }
    }

    let text = sheet.export_plain_text(&ExportOptions {
        format,
        include_formulas,
        only_selection: false,
    })?;
    match file {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("cannot write {}", path))?;
            Ok(Reply::Text(format!("exported to {}", path)))
        }
        None => Ok(Reply::Text(text)),
    }
}

/// Fixed-width rendering of the populated bounding rectangle, with column
/// letters across the top and row numbers down the side.
fn render_grid(sheet: &Sheet) -> String {
    const WIDTH: usize = 10;

    let mut max_row = 0usize;
    let mut max_col = 0usize;
    let mut any = false;
    for (cell_ref, _) in sheet.cells().iter() {
        max_row = max_row.max(cell_ref.row);
        max_col = max_col.max(cell_ref.col);
        any = true;
    }
    if !any {
        return "(empty sheet)".to_string();
    }

    let mut out = String::new();
    out.push_str(&" ".repeat(5));
    for col in 0..=max_col {
        out.push_str(&format!("{:>width$}", CellRef::col_to_letters(col), width = WIDTH));
    }
    for row in 0..=max_row {
        out.push('\n');
        out.push_str(&format!("{:>4} ", row + 1));
        for col in 0..=max_col {
            let mut value = sheet.get_display_value(&CellRef::new(col, row).to_string());
            if value.chars().count() > WIDTH - 1 {
                value = value.chars().take(WIDTH - 2).collect::<String>() + "…";
            }
            out.push_str(&format!("{:>width$}", value, width = WIDTH));
        }
    }
    out
}
