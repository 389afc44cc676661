use anyhow::Result;
use colored::Colorize;
use ehrlite_cli::TokenStore;
use ehrlite_cli::auth::FileTokenStore;

use crate::output::{print_error, print_success};

pub fn login(store: &FileTokenStore, server: &str, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("--token must not be empty");
    }
    store.save(token)?;
    print_success(&format!("Saved bearer token for {}", server.cyan()));
    Ok(())
}

pub fn logout(store: &FileTokenStore, profile: &str) -> Result<()> {
    if store.clear()? {
        print_success("Logged out (token removed)");
    } else {
        println!("No token found for profile \"{profile}\"");
    }
    Ok(())
}

pub fn whoami(store: &FileTokenStore, server: &str, profile: &str) -> Result<()> {
    match store.load()? {
        Some(token) => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!("{}: {}", "Server".cyan(), server.cyan());
            println!("{}: Bearer (token: {})", "Auth".cyan(), preview(&token));
        }
        None => {
            print_error(&format!("Not logged in (profile: \"{profile}\")"));
        }
    }
    Ok(())
}

fn preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{head}...{tail}")
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn long_tokens_are_shortened() {
        assert_eq!(preview("short"), "short");
        assert_eq!(
            preview("abcdefgh0123456789ABCDEFGH"),
            "abcdefgh...ABCDEFGH"
        );
    }
}
