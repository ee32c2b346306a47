use anyhow::Result;

use super::runtime::Runtime;
use crate::core::terminal::{GuideSection, KEY, print_error, print_success, print_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VaultCommand {
    Set { key: String, value: String },
    Get { key: String },
    Remove { key: String },
    List,
    Usage,
}

pub(crate) fn parse_vault_args(args: &[String], start: usize) -> VaultCommand {
    let arg = |i: usize| args.get(start + i).cloned();
    match args.get(start).map(String::as_str) {
        Some("set") => match (arg(1), arg(2)) {
            (Some(key), Some(value)) => VaultCommand::Set { key, value },
            _ => VaultCommand::Usage,
        },
        Some("get") => arg(1).map_or(VaultCommand::Usage, |key| VaultCommand::Get { key }),
        Some("remove" | "rm") => {
            arg(1).map_or(VaultCommand::Usage, |key| VaultCommand::Remove { key })
        }
        Some("list" | "ls") => VaultCommand::List,
        _ => VaultCommand::Usage,
    }
}

fn print_vault_help() {
    GuideSection::new("autoblog vault")
        .command("set <key> <value>", "Store an encrypted value")
        .command("get <key>", "Print a stored value")
        .command("remove <key>", "Delete a stored value")
        .command("list", "List stored keys")
        .blank()
        .hint("autoblog vault set huggingface_api_key hf_xxx", "model credential")
        .print();
}

pub async fn run_vault_command(args: &[String]) -> Result<()> {
    let command = parse_vault_args(args, 2);
    if command == VaultCommand::Usage {
        print_vault_help();
        return Ok(());
    }

    let rt = Runtime::open(true).await?;
    match command {
        VaultCommand::Set { key, value } => {
            rt.vault.set(&key, &value).await?;
            print_success(&format!("Stored '{}' in the vault.", key));
        }
        VaultCommand::Get { key } => match rt.vault.get(&key).await? {
            Some(value) => println!("{}", value),
            None => print_error(&format!("No vault entry named '{}'.", key)),
        },
        VaultCommand::Remove { key } => {
            if rt.vault.remove(&key).await? {
                print_success(&format!("Removed '{}' from the vault.", key));
            } else {
                print_warn(&format!("No vault entry named '{}'.", key));
            }
        }
        VaultCommand::List => {
            let keys = rt.vault.list_keys().await?;
            if keys.is_empty() {
                print_warn("The vault is empty.");
            }
            for key in keys {
                println!("{}{}", KEY, key);
            }
        }
        VaultCommand::Usage => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn set_requires_key_and_value() {
        assert_eq!(
            parse_vault_args(&argv(&["autoblog", "vault", "set", "k", "v"]), 2),
            VaultCommand::Set {
                key: "k".to_string(),
                value: "v".to_string()
            }
        );
        assert_eq!(
            parse_vault_args(&argv(&["autoblog", "vault", "set", "k"]), 2),
            VaultCommand::Usage
        );
    }

    #[test]
    fn aliases_and_unknown_subcommands() {
        assert_eq!(
            parse_vault_args(&argv(&["autoblog", "vault", "rm", "k"]), 2),
            VaultCommand::Remove {
                key: "k".to_string()
            }
        );
        assert_eq!(
            parse_vault_args(&argv(&["autoblog", "vault", "ls"]), 2),
            VaultCommand::List
        );
        assert_eq!(
            parse_vault_args(&argv(&["autoblog", "vault", "dump"]), 2),
            VaultCommand::Usage
        );
        assert_eq!(
            parse_vault_args(&argv(&["autoblog", "vault"]), 2),
            VaultCommand::Usage
        );
    }
}
