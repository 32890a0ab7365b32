use anyhow::{Context as AnyhowContext, Result};
use diacare_engine::{ClinicalField, RawClinicalInput};
use dialoguer::Input;
use std::io::IsTerminal;

pub(crate) fn stdin_is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Asks for every field `raw` does not carry yet, re-prompting until the answer is numeric.
pub(crate) fn fill_missing(raw: &mut RawClinicalInput) -> Result<()> {
    let missing: Vec<ClinicalField> = ClinicalField::ALL
        .into_iter()
        .filter(|field| raw.get(*field).is_none())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    eprintln!("Please enter the following information:");
    for field in missing {
        let answer: String = Input::new()
            .with_prompt(format!("Enter {field}"))
            .validate_with(|text: &String| validate_number(text))
            .interact_text()
            .with_context(|| format!("Failed to read {field}"))?;
        let value = parse_number(&answer)
            .with_context(|| format!("{field} is not a number"))?;
        raw.set(field, value);
    }
    Ok(())
}

fn validate_number(text: &str) -> std::result::Result<(), String> {
    match parse_number(text) {
        Some(_) => Ok(()),
        None => Err("Invalid input. Please enter a number.".to_string()),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
