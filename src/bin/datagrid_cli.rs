//! CLI tool for datagrid - simulates a grid headlessly and prints a snapshot
//!
//! Usage:
//!   datagrid_cli <grid.json>                       # Render at 800x600
//!   datagrid_cli <grid.json> --width 1024 --height 400 --scroll 2400
//!   datagrid_cli <grid.json> --sort name:desc --filter city=par
//!
//! The input file holds grid options (columns, rows, flags). The snapshot
//! lists allocated column widths, the rendered row band, content height and
//! the sort stack.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use datagrid::filter::ColumnFilter;
use datagrid::layout::RowRange;
use datagrid::{Grid, GridError, GridOptions, HeadlessPresenter, SortExport};
use serde::Serialize;

const USAGE: &str = "Usage: datagrid_cli <grid.json> [--width W] [--height H] [--scroll Y] \
                     [--sort COL[:desc]] [--filter COL=KEYWORD]";

#[derive(Debug, Default)]
struct Args {
    input: String,
    width: Option<f64>,
    height: Option<f64>,
    scroll: Option<f64>,
    sort: Option<(String, bool)>,
    filter: Option<(String, String)>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnSnapshot {
    name: String,
    width: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    columns: Vec<ColumnSnapshot>,
    rendered: Option<RowRange>,
    row_count: usize,
    filtered_row_count: usize,
    content_height: f64,
    scroll_y: f64,
    sort: Vec<SortExport>,
}

fn parse_number(flag: &str, value: Option<&String>) -> Result<f64, String> {
    value
        .ok_or_else(|| format!("{flag} needs a value"))?
        .parse::<f64>()
        .map_err(|e| format!("{flag}: {e}"))
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--width" => parsed.width = Some(parse_number(arg, iter.next())?),
            "--height" => parsed.height = Some(parse_number(arg, iter.next())?),
            "--scroll" => parsed.scroll = Some(parse_number(arg, iter.next())?),
            "--sort" => {
                let spec = iter.next().ok_or("--sort needs a column")?;
                parsed.sort = Some(match spec.split_once(':') {
                    Some((column, dir)) => (column.to_string(), dir.eq_ignore_ascii_case("desc")),
                    None => (spec.clone(), false),
                });
            }
            "--filter" => {
                let spec = iter.next().ok_or("--filter needs COL=KEYWORD")?;
                let (column, keyword) = spec
                    .split_once('=')
                    .ok_or_else(|| format!("--filter: expected COL=KEYWORD, got '{spec}'"))?;
                parsed.filter = Some((column.to_string(), keyword.to_string()));
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {other}")),
            other if parsed.input.is_empty() => parsed.input = other.to_string(),
            other => return Err(format!("unexpected argument {other}")),
        }
    }
    if parsed.input.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(parsed)
}

fn run(args: &Args) -> Result<Snapshot, GridError> {
    let json = fs::read_to_string(&args.input)?;
    let options = GridOptions::from_json(&json)?;

    let width = args.width.unwrap_or(800.0);
    let height = args.height.or(options.height).unwrap_or(600.0);
    let mut grid = Grid::new(options, HeadlessPresenter::new(width));
    grid.resize(width, height);

    if let Some((column, descending)) = &args.sort {
        grid.sort(Some(column.as_str()), Some(*descending), false);
    }
    if let Some((column, keyword)) = &args.filter {
        grid.filter(Some(ColumnFilter::new(column.as_str(), keyword.as_str()).to_args()));
    }
    grid.render();
    if let Some(y) = args.scroll {
        grid.scroll_to(y);
    }

    Ok(Snapshot {
        columns: grid
            .columns()
            .visible()
            .map(|c| ColumnSnapshot {
                name: c.name.clone(),
                width: c.on_screen_width(),
            })
            .collect(),
        rendered: grid.rendered_range(),
        row_count: grid.row_count(),
        filtered_row_count: grid.filtered_row_count(),
        content_height: grid.content_height(),
        scroll_y: grid.viewport().scroll_y,
        sort: grid.get_sorted_columns(),
    })
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let snapshot = match run(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let json = match serde_json::to_string_pretty(&snapshot) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {e}");
            std::process::exit(1);
        }
    };
    io::stdout().write_all(json.as_bytes()).unwrap();
    println!();
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("datagrid_cli")
            .chain(items.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&argv(&[
            "grid.json", "--width", "1024", "--sort", "name:desc", "--filter", "city=par",
        ]))
        .unwrap();
        assert_eq!(args.input, "grid.json");
        assert_eq!(args.width, Some(1024.0));
        assert_eq!(args.sort, Some(("name".to_string(), true)));
        assert_eq!(args.filter, Some(("city".to_string(), "par".to_string())));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&argv(&[])).is_err());
        assert!(parse_args(&argv(&["grid.json", "--width"])).is_err());
        assert!(parse_args(&argv(&["grid.json", "--filter", "nokeyword"])).is_err());
        assert!(parse_args(&argv(&["a.json", "b.json"])).is_err());
    }
}
