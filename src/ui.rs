//! Local menu.
//! Terminal counterpart of the extension bridge: calibrate, click a column,
//! save or load the calibration. Uses `dialoguer` for the prompts.
//! Errors are printed and the menu continues; only Quit (or a broken
//! terminal) ends it.

use crate::calibrate::Phase;
use crate::config::COLUMN_COUNT;
use crate::controller::Clicker;
use anyhow::{Context, Result};
use dialoguer::{Select, theme::ColorfulTheme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuAction {
    Calibrate,
    Cancel,
    Click,
    Save,
    Load,
    Refresh,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 7] = [
        MenuAction::Calibrate,
        MenuAction::Cancel,
        MenuAction::Click,
        MenuAction::Save,
        MenuAction::Load,
        MenuAction::Refresh,
        MenuAction::Quit,
    ];
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MenuAction::Calibrate => "Calibrate board",
            MenuAction::Cancel => "Cancel calibration",
            MenuAction::Click => "Click column",
            MenuAction::Save => "Save calibration",
            MenuAction::Load => "Load calibration",
            MenuAction::Refresh => "Refresh status",
            MenuAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

fn print_instructions() {
    println!("1. Choose 'Calibrate board'");
    println!("2. Click on the bottom cell of each column (left to right)");
    println!("3. After calibration, use 'Click column' or the browser extension");
    println!();
}

/// Runs one menu action and returns the line to show the user.
/// `column` is only used by `MenuAction::Click`.
fn perform(clicker: &Clicker, action: MenuAction, column: Option<usize>) -> String {
    match action {
        MenuAction::Calibrate => match clicker.start_calibration() {
            Ok(_) => format!("{}", Phase::Collecting(0)),
            Err(e) => format!("Error: {e}"),
        },
        MenuAction::Cancel => {
            if clicker.cancel_calibration() {
                "Calibration cancelled".to_string()
            } else {
                "No calibration in progress".to_string()
            }
        }
        MenuAction::Click => {
            let Some(column) = column else {
                return "No column selected".to_string();
            };
            match clicker.click_column(column as i64) {
                Ok(_) => format!("Clicked column {}", column + 1),
                Err(e) => format!("Error: {e}"),
            }
        }
        MenuAction::Save => match clicker.save() {
            Ok(path) => format!("Calibration saved to {}", path.display()),
            Err(e) => format!("Error: {e}"),
        },
        MenuAction::Load => match clicker.load() {
            Ok(_) => "Calibration loaded successfully".to_string(),
            Err(e) => format!("Error: {e}"),
        },
        MenuAction::Refresh | MenuAction::Quit => clicker.phase().to_string(),
    }
}

fn pick_column(theme: &ColorfulTheme) -> Result<Option<usize>> {
    let labels: Vec<String> = (1..=COLUMN_COUNT).map(|c| format!("Column {c}")).collect();
    Select::with_theme(theme)
        .with_prompt("Column to click")
        .items(&labels)
        .default(0)
        .interact_opt()
        .context("Failed to read column choice")
}

/// Blocking menu loop. Returns when the user quits.
pub fn run_menu(clicker: &Clicker) -> Result<()> {
    let theme = ColorfulTheme::default();
    print_instructions();

    loop {
        println!("Status: {}", clicker.phase());
        if let Some(set) = clicker.coordinates() {
            println!(
                "Columns: {:?}  board top: {}  bottom: {}",
                set.columns(),
                set.board_top(),
                set.board_bottom()
            );
        }
        let choice = Select::with_theme(&theme)
            .with_prompt("Action")
            .items(&MenuAction::ALL)
            .default(0)
            .interact_opt()
            .context("Failed to read menu choice")?;

        let action = match choice {
            Some(i) => MenuAction::ALL[i],
            None => MenuAction::Quit,
        };
        if action == MenuAction::Quit {
            return Ok(());
        }

        let column = if action == MenuAction::Click {
            match pick_column(&theme)? {
                Some(c) => Some(c),
                None => continue,
            }
        } else {
            None
        };

        println!("{}", perform(clicker, action, column));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::{calibrate, harness};

    #[test]
    fn test_click_before_calibration_reports_error() {
        let h = harness();
        let message = perform(&h.clicker, MenuAction::Click, Some(0));
        assert!(message.starts_with("Error:"));
        assert!(h.injector.clicks.lock().is_empty());
    }

    #[test]
    fn test_menu_flow() {
        let h = harness();
        let message = perform(&h.clicker, MenuAction::Calibrate, None);
        assert!(message.contains("column 1"));

        for i in 1..=7 {
            h.source.press(i * 100, 500);
        }
        assert_eq!(perform(&h.clicker, MenuAction::Refresh, None), "Calibrated");
        assert_eq!(perform(&h.clicker, MenuAction::Click, Some(6)), "Clicked column 7");
        assert!(perform(&h.clicker, MenuAction::Save, None).starts_with("Calibration saved to"));
        assert_eq!(
            perform(&h.clicker, MenuAction::Load, None),
            "Calibration loaded successfully"
        );
    }

    #[test]
    fn test_cancel_messages() {
        let h = harness();
        assert_eq!(perform(&h.clicker, MenuAction::Cancel, None), "No calibration in progress");
        calibrate(&h);
        perform(&h.clicker, MenuAction::Calibrate, None);
        assert_eq!(perform(&h.clicker, MenuAction::Cancel, None), "Calibration cancelled");
    }

    #[test]
    fn test_labels() {
        let labels: Vec<String> = MenuAction::ALL.iter().map(|a| a.to_string()).collect();
        assert_eq!(labels.first().map(String::as_str), Some("Calibrate board"));
        assert_eq!(labels.last().map(String::as_str), Some("Quit"));
    }
}
