use clap::{CommandFactory, ValueEnum};
use clap_complete::{Shell, generate};

use super::CliArgs;

#[derive(clap::Parser, Debug)]
pub struct Completions {
    #[arg(value_enum)]
    shell: Option<Shell>,
}

impl Completions {
    pub fn print(&self) {
        let mut cmd = CliArgs::command();
        let bin_name = cmd.get_name().to_string();
        match self.shell {
            Some(shell) => generate(shell, &mut cmd, bin_name, &mut std::io::stdout()),
            None => {
                for shell in Shell::value_variants() {
                    println!("{shell}");
                }
            }
        }
    }
}
