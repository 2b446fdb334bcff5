use docsheet_core::error::DocsheetError;
use docsheet_core::model::ExtractionResult;

pub fn print(result: &ExtractionResult) -> Result<(), DocsheetError> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}
