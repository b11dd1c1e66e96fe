use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "smoke_api")]
#[command(about = "Smoke-test a configured backend through the user adapter")]
pub struct CliOptions {
    #[arg(long, default_value = "adapter.toml")]
    pub config: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
