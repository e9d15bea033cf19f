use anyhow::{bail, Context, Result};
use std::io::{self, BufRead};

/// Prints the argon2 PHC hash for an accounts file. The password is read
/// from stdin when not given as an argument.
pub fn hash(password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let hash = user::password::hash_password(&password)?;
    println!("{}", hash);
    Ok(())
}
