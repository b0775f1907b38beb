// Build a pass manager from a comma-separated pipeline string.

use crate::hello::HelloWorld;
use crate::mul_shift::{MultiplicationShifts, MultiplicationShiftsPrinter};
use crate::pass::FunctionPassManager;

/// Parse a pipeline such as `"multiplication-shifts,hello-world"`.
///
/// `multiplication-shifts` registers the transform and its reporter as a
/// unit, so every run is narrated. Empty entries are skipped; an unknown
/// name is an error.
pub fn parse_pipeline(text: &str) -> Result<FunctionPassManager, String> {
    let mut manager = FunctionPassManager::new();
    for entry in text.split(',') {
        let entry = entry.trim();
        match entry {
            "" => {}
            "multiplication-shifts" => {
                manager.add_pass(MultiplicationShifts);
                manager.add_pass(MultiplicationShiftsPrinter);
            }
            "hello-world" => manager.add_pass(HelloWorld),
            other => return Err(format!("unknown pass name '{other}'")),
        }
    }
    Ok(manager)
}
