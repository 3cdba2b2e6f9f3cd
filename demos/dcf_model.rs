//! demos/dcf_model.rs
//! A single-sheet discounted cash flow model: illustrative free cash
//! flows discounted back at a fixed WACC, plus a Gordon-growth terminal
//! value, summed into an enterprise value.

use cellgraph_core::{new_sheet, Position, Sheet};

fn set(sheet: &mut Sheet, row: u32, col: u32, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    sheet.set_cell(Position::new(row, col), text)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Creating a DCF model sheet...");
    let mut sheet = new_sheet();

    set(&mut sheet, 0, 0, "Discounted Cash Flow Model")?;

    // Assumptions
    set(&mut sheet, 2, 0, "Discount Rate (WACC)")?;
    set(&mut sheet, 2, 1, "0.1")?; // B3
    set(&mut sheet, 3, 0, "Perpetual Growth Rate")?;
    set(&mut sheet, 3, 1, "0.02")?; // B4

    // Year headers and illustrative free cash flows
    set(&mut sheet, 5, 0, "Year")?;
    for col in 1..=5u32 {
        set(&mut sheet, 5, col, &col.to_string())?;
    }
    set(&mut sheet, 6, 0, "Free Cash Flow")?;
    for (col, fcf) in (1..=5u32).zip(["120000", "138000", "150000", "158000", "162000"]) {
        set(&mut sheet, 6, col, fcf)?;
    }

    // Discount factor and discounted FCF, year by year (row 8/9, 1-indexed: B8..F8, B9..F9)
    set(&mut sheet, 7, 0, "Discount Factor")?;
    set(&mut sheet, 8, 0, "Discounted FCF")?;
    for (col, column_letter) in (1..=5u32).zip(["B", "C", "D", "E", "F"]) {
        set(&mut sheet, 7, col, &format!("=1/POWER(1+B3,{})", col))?;
        set(&mut sheet, 8, col, &format!("={column_letter}7*{column_letter}8"))?;
    }

    // Sum of the five discounted cash flows.
    set(&mut sheet, 10, 0, "5-Year NPV of FCF")?;
    set(&mut sheet, 10, 1, "=SUM(B9,C9,D9,E9,F9)")?;

    // Gordon-growth terminal value, discounted back five years.
    set(&mut sheet, 12, 0, "Terminal Value")?;
    set(&mut sheet, 12, 1, "=F7*(1+B4)/(B3-B4)")?;
    set(&mut sheet, 13, 0, "Discounted Terminal Value")?;
    set(&mut sheet, 13, 1, "=B13/POWER(1+B3,5)")?;

    // Enterprise value: NPV of explicit-period FCF plus discounted terminal value.
    set(&mut sheet, 15, 0, "Enterprise Value")?;
    set(&mut sheet, 15, 1, "=B11+B14")?;

    print!("{}", sheet.print_values());
    Ok(())
}
