use anyhow::Result;
use clap::Subcommand;

use crate::tools::password::{
    entropy_bits, estimate_entropy, generate, passphrase, passphrase_entropy, PasswordOptions,
    Strength,
};

#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    #[command(about = "Generate random passwords", visible_alias = "gen")]
    Generate {
        #[arg(long, short, default_value_t = 16)]
        length: usize,
        #[arg(long, help = "Leave out uppercase letters")]
        no_upper: bool,
        #[arg(long, help = "Leave out digits")]
        no_digits: bool,
        #[arg(long, help = "Leave out symbols")]
        no_symbols: bool,
        #[arg(long, help = "Leave out characters like l, 1, O and 0")]
        no_ambiguous: bool,
        #[arg(long, short, default_value_t = 1, help = "Number of passwords")]
        count: usize,
    },
    #[command(about = "Generate a passphrase of random words")]
    Passphrase {
        #[arg(long, short, default_value_t = 5)]
        words: usize,
        #[arg(long, short, default_value = "-")]
        separator: String,
    },
    #[command(about = "Estimate the entropy of a password")]
    Entropy { password: String },
}

fn describe(bits: f64) -> String {
    format!("{bits:.1} bits\t{}", Strength::from_bits(bits))
}

/// Command to process `password` commands.
pub fn process_password_command(command: PasswordCommand) -> Result<()> {
    let mut rng = rand::thread_rng();
    match command {
        PasswordCommand::Generate {
            length,
            no_upper,
            no_digits,
            no_symbols,
            no_ambiguous,
            count,
        } => {
            let options = PasswordOptions {
                length,
                upper: !no_upper,
                digits: !no_digits,
                symbols: !no_symbols,
                exclude_ambiguous: no_ambiguous,
            };
            let bits = entropy_bits(length, options.pool_size());
            for _ in 0..count.max(1) {
                println!("{}\t{}", generate(&options, &mut rng)?, describe(bits));
            }
        }
        PasswordCommand::Passphrase { words, separator } => {
            let phrase = passphrase(words, &separator, &mut rng)?;
            println!("{phrase}\t{}", describe(passphrase_entropy(words)));
        }
        PasswordCommand::Entropy { password } => {
            println!("{}", describe(estimate_entropy(&password)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::cli::testing::{context_at, noon, run};

    use super::describe;

    #[test]
    fn test_describe() {
        assert_eq!(describe(52.44), "52.4 bits\tfair");
    }

    #[tokio::test]
    async fn test_commands() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["password", "generate", "-l", "24", "--no-symbols", "-c", "3"]).await?;
        run(&context, &["pw", "passphrase", "--words", "4", "-s", "."]).await?;
        run(&context, &["pw", "entropy", "hunter2"]).await?;
        assert!(run(&context, &["pw", "generate", "--length", "2"]).await.is_err());
        Ok(())
    }
}
