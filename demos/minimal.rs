//! demos/minimal.rs
//! A minimal example exercising the cellgraph engine directly.

use cellgraph_core::{new_sheet, Position};

fn main() {
    println!("Creating a minimal sheet...");

    let mut sheet = new_sheet();

    sheet.set_cell(Position::new(0, 0), "Hello").unwrap();
    sheet.set_cell(Position::new(0, 1), "World").unwrap();
    sheet.set_cell(Position::new(1, 0), "42").unwrap();
    sheet.set_cell(Position::new(2, 0), "=A2+10").unwrap();

    print!("{}", sheet.print_values());
}
