use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static PEN: Emoji<'_, '_> = Emoji("📝 ", "");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏰ ", "");
pub static KEY: Emoji<'_, '_> = Emoji("🔑 ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_banner() {
    println!();
    println!(
        "{}{}",
        PEN,
        style("autoblog").bold().magenta()
    );
    println!(
        "{}\n",
        style("One fresh article a day, written while you sleep.").dim()
    );
}

pub fn print_goodbye() {
    println!(
        "\n{}{}",
        CLOCK,
        style("Scheduler stopped. Goodbye!").bold().cyan()
    );
}

enum GuideLine {
    Command(String, String),
    Status(String, String),
    Text(String),
    Hint(String, String),
    Blank,
}

/// A titled block of help output, built row by row and printed in one go.
pub struct GuideSection {
    title: String,
    lines: Vec<GuideLine>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, usage: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Command(usage.to_string(), description.to_string()));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(GuideLine::Status(label.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.lines.push(GuideLine::Text(text.to_string()));
        self
    }

    pub fn hint(mut self, example: &str, comment: &str) -> Self {
        self.lines
            .push(GuideLine::Hint(example.to_string(), comment.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(GuideLine::Blank);
        self
    }

    fn render(&self) -> String {
        let width = self
            .lines
            .iter()
            .filter_map(|l| match l {
                GuideLine::Command(usage, _) => Some(usage.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        let mut out = format!("{}\n", style(&self.title).bold().underlined());
        for line in &self.lines {
            match line {
                GuideLine::Command(usage, description) => out.push_str(&format!(
                    "  {}  {}\n",
                    style(format!("{:<width$}", usage, width = width)).cyan(),
                    description
                )),
                GuideLine::Status(label, value) => {
                    out.push_str(&format!("  {}: {}\n", style(label).bold(), value))
                }
                GuideLine::Text(text) => out.push_str(&format!("  {}\n", text)),
                GuideLine::Hint(example, comment) if comment.is_empty() => {
                    out.push_str(&format!("  $ {}\n", style(example).green()))
                }
                GuideLine::Hint(example, comment) => out.push_str(&format!(
                    "  $ {}  {}\n",
                    style(example).green(),
                    style(format!("# {}", comment)).dim()
                )),
                GuideLine::Blank => out.push('\n'),
            }
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}
