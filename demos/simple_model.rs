//! demos/simple_model.rs
//! Builds a simple income statement and prints its evaluated values.

use cellgraph_core::{new_sheet, Position};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut sheet = new_sheet();
    let set = |sheet: &mut cellgraph_core::Sheet, row: u32, col: u32, text: &str| {
        sheet.set_cell(Position::new(row, col), text)
    };

    // Header
    set(&mut sheet, 0, 0, "Item")?;
    set(&mut sheet, 0, 1, "2025")?;
    set(&mut sheet, 0, 2, "2026")?;

    // Revenue
    set(&mut sheet, 1, 0, "Revenue")?;
    set(&mut sheet, 1, 1, "1000")?;
    set(&mut sheet, 1, 2, "1150")?; // 15% growth

    // Cost of goods sold (60% of revenue)
    set(&mut sheet, 2, 0, "Cost of Goods Sold")?;
    set(&mut sheet, 2, 1, "=B2*0.6")?;
    set(&mut sheet, 2, 2, "=C2*0.6")?;

    // Gross profit
    set(&mut sheet, 3, 0, "Gross Profit")?;
    set(&mut sheet, 3, 1, "=B2-B3")?;
    set(&mut sheet, 3, 2, "=C2-C3")?;

    // Operating expenses
    set(&mut sheet, 4, 0, "Operating Expenses")?;
    set(&mut sheet, 4, 1, "250")?;
    set(&mut sheet, 4, 2, "275")?;

    // Operating income
    set(&mut sheet, 5, 0, "Operating Income")?;
    set(&mut sheet, 5, 1, "=B4-B5")?;
    set(&mut sheet, 5, 2, "=C4-C5")?;

    // Taxes (25%)
    set(&mut sheet, 6, 0, "Taxes (25%)")?;
    set(&mut sheet, 6, 1, "=B6*0.25")?;
    set(&mut sheet, 6, 2, "=C6*0.25")?;

    // Net income
    set(&mut sheet, 7, 0, "Net Income")?;
    set(&mut sheet, 7, 1, "=B6-B7")?;
    set(&mut sheet, 7, 2, "=C6-C7")?;

    print!("{}", sheet.print_values());
    Ok(())
}
