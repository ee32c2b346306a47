mod generate;
mod runtime;
mod serve;
mod status;
mod vault;

use anyhow::Result;
use console::style;

use crate::core::config::{API_KEY_ENV, DATA_DIR_ENV};
use crate::core::terminal::{self, GuideSection, print_error};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Service")
        .command("serve", "Backfill, then generate one article per day until Ctrl+C")
        .print();
    println!();

    GuideSection::new("One-off")
        .command("generate", "Generate and save a single article now")
        .command("generate --offline", "Save a placeholder article without calling the model")
        .command("backfill [--min N]", "Top the corpus up to N articles")
        .command("status", "Show configuration and corpus size")
        .print();
    println!();

    GuideSection::new("Credentials")
        .command("vault set <key> <value>", "Store an encrypted value")
        .command("vault get|remove <key>", "Read or delete a value")
        .command("vault list", "List stored keys")
        .blank()
        .text(&format!(
            "The model token comes from {} or the vault key huggingface_api_key.",
            API_KEY_ENV
        ))
        .text(&format!("Set {} to relocate the data directory.", DATA_DIR_ENV))
        .print();

    println!(
        "\n {} {} <command> [options]\n",
        style("Usage:").bold(),
        style("autoblog").green()
    );
}

pub(crate) fn parse_backfill_flags(args: &[String], start: usize) -> Option<u32> {
    let mut minimum = None;
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--min" | "-n" => {
                if i + 1 < args.len() {
                    minimum = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    minimum
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(cmd) = args.get(1).map(String::as_str) else {
        print_help();
        return Ok(());
    };

    match cmd {
        "serve" => serve::run_serve().await,
        "generate" => generate::run_generate(args.iter().skip(2).any(|a| a == "--offline")).await,
        "backfill" => generate::run_backfill(parse_backfill_flags(&args, 2)).await,
        "status" => status::run_status().await,
        "vault" => vault::run_vault_command(&args).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
            Ok(())
        }
    }
}
