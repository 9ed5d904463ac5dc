use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Token lifecycle service")]
pub struct Cli {
    /// Settings file, without or with the `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
