use colored::{Color, Colorize, control::ShouldColorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use lagerfield::migration::{MigrationReport, TargetReport};

use crate::theme::{ICONS, THEME};

/// Console rendering for the migration run.
pub struct OutputManager {
    no_color: bool,
}

impl OutputManager {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }

    /// Honors `NO_COLOR`/`CLICOLOR` and whether stdout is a terminal.
    pub fn detect() -> Self {
        Self::new(!ShouldColorize::from_env().should_colorize())
    }

    fn line(&self, icon: &str, message: &str, color: Color) -> String {
        if self.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.line(ICONS.success, message, THEME.success));
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line(ICONS.error, message, THEME.error));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.line(ICONS.warning, message, THEME.warning));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.line(ICONS.info, message, THEME.info));
    }

    pub fn heading(&self, text: &str) {
        if self.no_color {
            println!("\n{text}\n{}", "=".repeat(text.len()));
        } else {
            println!("\n{}", text.color(THEME.primary).bold());
        }
    }

    pub fn bullet(&self, text: &str) {
        if self.no_color {
            println!("  {} {text}", ICONS.bullet);
        } else {
            println!("  {} {text}", ICONS.bullet.color(THEME.muted));
        }
    }

    fn create_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        if self.no_color {
            table.load_preset(comfy_table::presets::ASCII_FULL);
        } else {
            table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        }
        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|header| {
                let cell = Cell::new(header).add_attribute(Attribute::Bold);
                if self.no_color { cell } else { cell.fg(TableColor::Cyan) }
            })
            .collect();
        table.set_header(header_cells);
        table
    }

    pub fn report(&self, report: &MigrationReport) {
        self.heading("Image migration");
        println!("{}", self.report_table(report));

        for target in report.targets.iter().filter(|target| !target.failures.is_empty()) {
            self.warning(&format!("{}.{} failures:", target.collection, target.field));
            for failure in &target.failures {
                self.bullet(&format!("{}: {}", failure.id, failure.error));
            }
        }

        let summary = format!(
            "{} migrated, {} skipped (file missing), {} failed of {} matched",
            report.total_migrated(),
            report.total_skipped(),
            report.total_failed(),
            report.total_matched()
        );
        if report.has_failures() {
            self.warning(&summary);
        } else if report.total_matched() == 0 {
            self.info("No local image references left to migrate");
        } else {
            self.success(&summary);
        }
    }

    pub fn report_table(&self, report: &MigrationReport) -> Table {
        let mut table = self.create_table(&["Collection", "Field", "Folder", "Matched", "Migrated", "Missing", "Failed"]);
        for target in &report.targets {
            table.add_row(self.target_row(target));
        }
        table
    }

    fn target_row(&self, target: &TargetReport) -> Vec<Cell> {
        let failed = Cell::new(target.failures.len());
        let failed = if target.failures.is_empty() || self.no_color {
            failed
        } else {
            failed.fg(TableColor::Red)
        };
        vec![
            Cell::new(&target.collection),
            Cell::new(&target.field),
            Cell::new(&target.folder),
            Cell::new(target.matched),
            Cell::new(target.migrated),
            Cell::new(target.skipped_missing),
            failed,
        ]
    }
}
